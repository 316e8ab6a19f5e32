//! Employee records (admin), including CSV template and bulk import.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::download::Download;
use crate::error::Result;
use crate::http::HttpRequest;
use crate::query::segment;
use crate::transport::Transport;

const EMPLOYEES: &str = "/api/employees";
pub const TEMPLATE_FILE_NAME: &str = "employee_template.csv";

pub struct EmployeeService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> EmployeeService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Result<Value> {
        self.client.get(EMPLOYEES)
    }

    pub fn get(&self, id: impl Display) -> Result<Value> {
        self.client.get(format!("{EMPLOYEES}/{}", segment(id)))
    }

    pub fn create<B: Serialize + ?Sized>(&self, employee: &B) -> Result<Value> {
        self.client.post(EMPLOYEES, employee)
    }

    pub fn create_admin<B: Serialize + ?Sized>(&self, admin: &B) -> Result<Value> {
        self.client.post("/api/admins", admin)
    }

    pub fn update<B: Serialize + ?Sized>(&self, id: impl Display, employee: &B) -> Result<Value> {
        self.client.put(format!("{EMPLOYEES}/{}", segment(id)), employee)
    }

    pub fn delete(&self, id: impl Display) -> Result<Value> {
        self.client.delete(format!("{EMPLOYEES}/{}", segment(id)))
    }

    /// Fetch the bulk-import CSV template and save it as
    /// `employee_template.csv` in the download directory.
    pub fn download_template(&self) -> Result<Download> {
        let response = self.client.get_bytes(format!("{EMPLOYEES}/template"))?;
        self.client.downloads().save(TEMPLATE_FILE_NAME, response.body)
    }

    /// Import employees from a filled-in CSV template.
    pub fn bulk_upload(&self, file_name: &str, contents: &[u8]) -> Result<Value> {
        let request = HttpRequest::multipart(format!("{EMPLOYEES}/bulk"), "file", file_name, contents);
        self.client.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{client, StubTransport};
    use serde_json::json;

    #[test]
    fn record_paths() {
        let stub = StubTransport::new();
        let api = client(&stub);

        api.employees().list().unwrap();
        assert_eq!(stub.last_path(), "/api/employees");

        api.employees().get(7).unwrap();
        assert_eq!(stub.last_path(), "/api/employees/7");

        api.employees().create(&json!({"name": "Mya"})).unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Post, "/api/employees".to_string()));

        api.employees().create_admin(&json!({"username": "ops"})).unwrap();
        assert_eq!(stub.last_path(), "/api/admins");

        api.employees().update(7, &json!({"name": "Mya Mya"})).unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Put, "/api/employees/7".to_string()));

        api.employees().delete(7).unwrap();
        assert_eq!(stub.last().method, HttpMethod::Delete);
    }

    #[test]
    fn template_is_saved_to_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubTransport::new();
        stub.reply_bytes("text/csv", &[], b"nrc,name,email\n");
        let api = client(&stub).with_download_dir(dir.path());

        let saved = api.employees().download_template().unwrap();
        assert_eq!(stub.last_path(), "/api/employees/template");
        assert_eq!(saved.path, dir.path().join(TEMPLATE_FILE_NAME));
        assert_eq!(std::fs::read_to_string(&saved.path).unwrap(), "nrc,name,email\n");
    }

    #[test]
    fn failed_template_download_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubTransport::new();
        stub.reply_json(403, json!({"message": "Admins only"}));
        let api = client(&stub).with_download_dir(dir.path());

        let err = api.employees().download_template().unwrap_err();
        assert_eq!(err.to_string(), "Admins only");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn bulk_upload_sends_multipart_file() {
        let stub = StubTransport::new();
        client(&stub).employees().bulk_upload("staff.csv", b"nrc,name\n1,A\n").unwrap();
        let sent = stub.last();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(stub.last_path(), "/api/employees/bulk");
        assert!(sent.header("content-type").unwrap().starts_with("multipart/form-data"));
        let body = String::from_utf8(sent.body.unwrap()).unwrap();
        assert!(body.contains("filename=\"staff.csv\""));
        assert!(body.contains("1,A"));
    }
}
