//! Leave type catalogue (admin).

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::Result;
use crate::query::segment;
use crate::transport::Transport;

const LEAVE_TYPES: &str = "/api/leave-types";

pub struct LeaveTypeService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> LeaveTypeService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Result<Value> {
        self.client.get(LEAVE_TYPES)
    }

    pub fn create<B: Serialize + ?Sized>(&self, leave_type: &B) -> Result<Value> {
        self.client.post(LEAVE_TYPES, leave_type)
    }

    pub fn update<B: Serialize + ?Sized>(&self, id: impl Display, leave_type: &B) -> Result<Value> {
        self.client.put(format!("{LEAVE_TYPES}/{}", segment(id)), leave_type)
    }

    pub fn delete(&self, id: impl Display) -> Result<Value> {
        self.client.delete(format!("{LEAVE_TYPES}/{}", segment(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{client, StubTransport};
    use serde_json::json;

    #[test]
    fn crud_paths_and_methods() {
        let stub = StubTransport::new();
        let api = client(&stub);

        api.leave_types().list().unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Get, LEAVE_TYPES.to_string()));

        api.leave_types().create(&json!({"name": "Annual", "days": 10})).unwrap();
        assert_eq!(stub.last().method, HttpMethod::Post);
        assert_eq!(stub.last_json()["name"], "Annual");

        api.leave_types().update(2, &json!({"days": 12})).unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Put, "/api/leave-types/2".to_string()));

        api.leave_types().delete(2).unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Delete, "/api/leave-types/2".to_string()));
    }
}
