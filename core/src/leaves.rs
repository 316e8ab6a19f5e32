//! Leave requests: applying, reviewing and auditing.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::Result;
use crate::query::segment;
use crate::transport::Transport;
use crate::types::RejectLeave;

const LEAVES: &str = "/api/leaves";

pub struct LeaveService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> LeaveService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn apply<B: Serialize + ?Sized>(&self, leave: &B) -> Result<Value> {
        self.client.post(LEAVES, leave)
    }

    /// The signed-in user's own leave history.
    pub fn mine(&self) -> Result<Value> {
        self.client.get(LEAVES)
    }

    pub fn balance(&self) -> Result<Value> {
        self.client.get(format!("{LEAVES}/balance"))
    }

    /// Requests awaiting a decision (managers and admins).
    pub fn pending(&self) -> Result<Value> {
        self.client.get(format!("{LEAVES}/pending"))
    }

    pub fn approve(&self, id: impl Display) -> Result<Value> {
        self.client.put_empty(format!("{LEAVES}/{}/approve", segment(id)))
    }

    pub fn reject(&self, id: impl Display, reason: &str) -> Result<Value> {
        self.client
            .put(format!("{LEAVES}/{}/reject", segment(id)), &RejectLeave { reason })
    }

    /// Withdraw one of the user's own requests.
    pub fn cancel(&self, id: impl Display) -> Result<Value> {
        self.client.put_empty(format!("{LEAVES}/{}/cancel", segment(id)))
    }

    pub fn audit(&self, id: impl Display) -> Result<Value> {
        self.client.get(format!("{LEAVES}/{}/audit", segment(id)))
    }
}
