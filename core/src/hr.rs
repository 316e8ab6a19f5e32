//! HR leave administration: balances, accruals, calendar and reports.
//! Managers and admins only; the backend enforces it.

use std::fmt::Display;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::download::Download;
use crate::error::Result;
use crate::query::{segment, Query};
use crate::transport::Transport;
use crate::types::{BalanceFilter, CalendarFilter, ExportFormat};

const BALANCES: &str = "/api/hr/employees/annual-leave-balances";
const HR_LEAVES: &str = "/api/hr/leaves";

/// Look-ahead window for `upcoming` when the caller has no preference.
pub const DEFAULT_UPCOMING_DAYS: u32 = 30;

pub struct HrLeaveService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> HrLeaveService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Annual-leave balances of every employee matching `filter`.
    pub fn balances(&self, filter: &BalanceFilter) -> Result<Value> {
        self.client.get(balance_query(Query::new(), filter).to_path(BALANCES))
    }

    pub fn employee_balance(&self, employee_id: impl Display) -> Result<Value> {
        self.client.get(balance_path(employee_id, ""))
    }

    pub fn adjust_balance<B: Serialize + ?Sized>(&self, employee_id: impl Display, adjustment: &B) -> Result<Value> {
        self.client.post(balance_path(employee_id, "/adjust"), adjustment)
    }

    pub fn add_manual_accrual<B: Serialize + ?Sized>(&self, employee_id: impl Display, accrual: &B) -> Result<Value> {
        self.client.post(balance_path(employee_id, "/accrual"), accrual)
    }

    pub fn calendar(&self, filter: &CalendarFilter) -> Result<Value> {
        let path = Query::new()
            .push_opt("start_date", filter.start_date.as_deref())
            .push_opt("end_date", filter.end_date.as_deref())
            .push_opt("department", filter.department.as_deref())
            .to_path(&format!("{HR_LEAVES}/calendar"));
        self.client.get(path)
    }

    pub fn department_report(&self) -> Result<Value> {
        self.client.get(format!("{HR_LEAVES}/department-report"))
    }

    /// Approved leave starting within the next `days` days.
    pub fn upcoming(&self, days: u32) -> Result<Value> {
        self.client
            .get(Query::new().push("days", days).to_path(&format!("{HR_LEAVES}/upcoming")))
    }

    /// Run the monthly accrual job, for `month` (`YYYY-MM`) or the current
    /// month when `None`.
    pub fn process_accruals(&self, month: Option<&str>) -> Result<Value> {
        let path = Query::new()
            .push_opt("month", month)
            .to_path(&format!("{HR_LEAVES}/process-accruals"));
        self.client.post_empty(path)
    }

    /// Export balances and save them as
    /// `annual_leave_balances_<YYYYMMDD>.<xlsx|pdf>`.
    pub fn export_balances(&self, format: ExportFormat, filter: &BalanceFilter) -> Result<Download> {
        let query = balance_query(Query::new().push("format", format.as_str()), filter);
        let response = self.client.get_bytes(query.to_path(&format!("{BALANCES}/export")))?;
        self.client.downloads().save(&export_file_name(format), response.body)
    }
}

fn balance_query(query: Query, filter: &BalanceFilter) -> Query {
    query
        .push_opt("department", filter.department.as_deref())
        .push_opt("status", filter.status.as_deref())
}

fn balance_path(employee_id: impl Display, suffix: &str) -> String {
    format!("/api/hr/employees/{}/annual-leave-balance{suffix}", segment(employee_id))
}

fn export_file_name(format: ExportFormat) -> String {
    format!(
        "annual_leave_balances_{}.{}",
        Utc::now().format("%Y%m%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::http::HttpMethod;
    use crate::testing::{client, StubTransport};
    use serde_json::json;

    #[test]
    fn department_filter_only() {
        let stub = StubTransport::new();
        let filter = BalanceFilter {
            department: Some("X".to_string()),
            status: None,
        };
        client(&stub).hr().balances(&filter).unwrap();
        assert_eq!(stub.last_path(), "/api/hr/employees/annual-leave-balances?department=X");
    }

    #[test]
    fn no_filters_no_query() {
        let stub = StubTransport::new();
        client(&stub).hr().balances(&BalanceFilter::default()).unwrap();
        assert_eq!(stub.last_path(), BALANCES);
    }

    #[test]
    fn employee_balance_paths() {
        let stub = StubTransport::new();
        let api = client(&stub);

        api.hr().employee_balance(5).unwrap();
        assert_eq!(stub.last_path(), "/api/hr/employees/5/annual-leave-balance");

        api.hr().adjust_balance(5, &json!({"days": -1, "reason": "correction"})).unwrap();
        assert_eq!(stub.last().method, HttpMethod::Post);
        assert_eq!(stub.last_path(), "/api/hr/employees/5/annual-leave-balance/adjust");

        api.hr().add_manual_accrual(5, &json!({"days": 1.5})).unwrap();
        assert_eq!(stub.last_path(), "/api/hr/employees/5/annual-leave-balance/accrual");
        assert_eq!(stub.last_json()["days"], 1.5);
    }

    #[test]
    fn calendar_keeps_parameter_order() {
        let stub = StubTransport::new();
        let filter = CalendarFilter {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            department: Some("Finance".to_string()),
        };
        client(&stub).hr().calendar(&filter).unwrap();
        assert_eq!(
            stub.last_path(),
            "/api/hr/leaves/calendar?start_date=2024-01-01&end_date=2024-01-31&department=Finance"
        );
    }

    #[test]
    fn reports_and_jobs() {
        let stub = StubTransport::new();
        let api = client(&stub);

        api.hr().department_report().unwrap();
        assert_eq!(stub.last_path(), "/api/hr/leaves/department-report");

        api.hr().upcoming(DEFAULT_UPCOMING_DAYS).unwrap();
        assert_eq!(stub.last_path(), "/api/hr/leaves/upcoming?days=30");

        api.hr().process_accruals(None).unwrap();
        assert_eq!((stub.last().method, stub.last_path()), (HttpMethod::Post, "/api/hr/leaves/process-accruals".to_string()));

        api.hr().process_accruals(Some("2024-05")).unwrap();
        assert_eq!(stub.last_path(), "/api/hr/leaves/process-accruals?month=2024-05");
    }

    #[test]
    fn export_saves_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubTransport::new();
        stub.reply_bytes("application/pdf", &[], b"%PDF-1.7");
        let api = client(&stub).with_download_dir(dir.path());
        let filter = BalanceFilter {
            department: None,
            status: Some("active".to_string()),
        };

        let saved = api.hr().export_balances(ExportFormat::Pdf, &filter).unwrap();
        assert_eq!(
            stub.last_path(),
            "/api/hr/employees/annual-leave-balances/export?format=pdf&status=active"
        );
        let name = saved.path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("annual_leave_balances_"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), "annual_leave_balances_YYYYMMDD.pdf".len());
        assert_eq!(saved.bytes, b"%PDF-1.7");
    }

    #[test]
    fn server_failure_message_is_templated() {
        let stub = StubTransport::new();
        stub.reply_json(500, json!({"title": "Internal Server Error"}));
        let err = client(&stub).hr().process_accruals(Some("bad")).unwrap_err();
        assert!(matches!(err, ApiError::ServerError { status: 500, .. }));
        assert_eq!(err.to_string(), "Server error (500).");
    }

    #[test]
    fn export_file_names_follow_format() {
        assert!(export_file_name(ExportFormat::Excel).ends_with(".xlsx"));
        assert!(export_file_name(ExportFormat::Pdf).ends_with(".pdf"));
    }
}
