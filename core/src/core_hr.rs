//! Core HR records attached to an employee: identity, employment,
//! positions, documents, lifecycle, on/offboarding, compliance and audit.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::download::{content_disposition_filename, Download};
use crate::error::Result;
use crate::http::HttpRequest;
use crate::query::{segment, Query};
use crate::transport::Transport;
use crate::types::AuditLogFilter;

const POSITIONS: &str = "/api/positions";
const COMPLIANCE_REQUIREMENTS: &str = "/api/compliance/requirements";

fn employee_path(employee_id: impl Display, section: &str) -> String {
    format!("/api/employees/{}/{section}", segment(employee_id))
}

pub struct CoreHrService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> CoreHrService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn identity(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "identity"))
    }

    pub fn update_identity<B: Serialize + ?Sized>(&self, employee_id: impl Display, identity: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "identity"), identity)
    }

    pub fn employment(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "employment"))
    }

    pub fn update_employment<B: Serialize + ?Sized>(&self, employee_id: impl Display, employment: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "employment"), employment)
    }

    pub fn employment_history(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "employment/history"))
    }

    pub fn positions(&self) -> Result<Value> {
        self.client.get(POSITIONS)
    }

    pub fn position(&self, id: impl Display) -> Result<Value> {
        self.client.get(format!("{POSITIONS}/{}", segment(id)))
    }

    pub fn create_position<B: Serialize + ?Sized>(&self, position: &B) -> Result<Value> {
        self.client.post(POSITIONS, position)
    }

    pub fn update_position<B: Serialize + ?Sized>(&self, id: impl Display, position: &B) -> Result<Value> {
        self.client.put(format!("{POSITIONS}/{}", segment(id)), position)
    }

    pub fn assign_position<B: Serialize + ?Sized>(&self, employee_id: impl Display, assignment: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "positions"), assignment)
    }

    pub fn documents(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "documents"))
    }

    pub fn upload_document(&self, employee_id: impl Display, file_name: &str, contents: &[u8]) -> Result<Value> {
        let request = HttpRequest::multipart(employee_path(employee_id, "documents"), "file", file_name, contents);
        self.client.call(request)
    }

    /// Fetch a stored document and save it under the name the backend
    /// advertises, or `document_<id>` when it gives none.
    pub fn download_document(&self, employee_id: impl Display, document_id: impl Display) -> Result<Download> {
        let document_id = document_id.to_string();
        let path = employee_path(employee_id, &format!("documents/{}/download", segment(&document_id)));
        let response = self.client.get_bytes(path)?;
        let file_name = response
            .header("content-disposition")
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| format!("document_{document_id}"));
        self.client.downloads().save(&file_name, response.body)
    }

    pub fn delete_document(&self, employee_id: impl Display, document_id: impl Display) -> Result<Value> {
        self.client
            .delete(employee_path(employee_id, &format!("documents/{}", segment(document_id))))
    }

    pub fn lifecycle_events(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "lifecycle"))
    }

    pub fn create_lifecycle_event<B: Serialize + ?Sized>(&self, employee_id: impl Display, event: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "lifecycle"), event)
    }

    pub fn onboarding(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "onboarding"))
    }

    pub fn create_onboarding<B: Serialize + ?Sized>(&self, employee_id: impl Display, process: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "onboarding"), process)
    }

    pub fn offboarding(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "offboarding"))
    }

    pub fn create_offboarding<B: Serialize + ?Sized>(&self, employee_id: impl Display, process: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "offboarding"), process)
    }

    pub fn compliance_requirements(&self) -> Result<Value> {
        self.client.get(COMPLIANCE_REQUIREMENTS)
    }

    pub fn create_compliance_requirement<B: Serialize + ?Sized>(&self, requirement: &B) -> Result<Value> {
        self.client.post(COMPLIANCE_REQUIREMENTS, requirement)
    }

    pub fn compliance_records(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "compliance"))
    }

    pub fn create_compliance_record<B: Serialize + ?Sized>(&self, employee_id: impl Display, record: &B) -> Result<Value> {
        self.client.post(employee_path(employee_id, "compliance"), record)
    }

    pub fn audit_logs(&self, filter: &AuditLogFilter) -> Result<Value> {
        let path = Query::new()
            .push_opt("entity_type", filter.entity_type.as_deref())
            .push_opt("entity_id", filter.entity_id.as_deref())
            .push_opt("performed_by", filter.performed_by.as_deref())
            .to_path("/api/audit-logs");
        self.client.get(path)
    }

    pub fn employee_audit_logs(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(employee_path(employee_id, "audit-logs"))
    }
}
