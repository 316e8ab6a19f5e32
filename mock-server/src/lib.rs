//! In-memory stand-in for the leave management backend.
//!
//! Implements the subset of the REST API the client's integration tests
//! drive: sign-in, leave requests, leave types, employee records with CSV
//! import, HR balances and exports, and employee documents. Bearer tokens
//! are checked on every `/api` route (401) and role gates answer 403.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

mod store;

pub use store::{
    BalanceRow, Document, Employee, Leave, LeaveType, NewEmployee, Store, ADMIN_PASSWORD, ADMIN_USERNAME,
    EMPLOYEE_NRC, MANAGER_NRC, STAFF_PASSWORD, UNASSIGNED_NRC,
};

pub type Db = Arc<RwLock<Store>>;

const ANYONE: &[&str] = &[];
const STAFF: &[&str] = &["admin", "manager"];
const ADMIN: &[&str] = &["admin"];

pub const TEMPLATE_CSV: &str = "nrc,name,department,role\n";

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/register", post(register))
        .route("/api/leaves", get(my_leaves).post(apply_leave))
        .route("/api/leaves/balance", get(my_balance))
        .route("/api/leaves/pending", get(pending_leaves))
        .route("/api/leaves/{id}/approve", put(approve_leave))
        .route("/api/leaves/{id}/reject", put(reject_leave))
        .route("/api/leaves/{id}/cancel", put(cancel_leave))
        .route("/api/leaves/{id}/audit", get(leave_audit))
        .route("/api/leave-types", get(list_leave_types).post(create_leave_type))
        .route("/api/leave-types/{id}", put(update_leave_type).delete(delete_leave_type))
        .route("/api/employees", get(list_employees).post(create_employee))
        .route("/api/employees/template", get(employee_template))
        .route("/api/employees/bulk", post(bulk_upload))
        .route(
            "/api/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/api/employees/{id}/documents", get(list_documents).post(upload_document))
        .route("/api/employees/{id}/documents/{doc_id}", axum::routing::delete(delete_document))
        .route("/api/employees/{id}/documents/{doc_id}/download", get(download_document))
        .route("/api/admins", post(create_admin))
        .route("/api/hr/employees/annual-leave-balances", get(balances))
        .route("/api/hr/employees/annual-leave-balances/export", get(export_balances))
        .route("/api/hr/employees/{id}/annual-leave-balance", get(employee_balance))
        .route("/api/hr/employees/{id}/annual-leave-balance/adjust", post(adjust_balance))
        .route("/api/hr/employees/{id}/annual-leave-balance/accrual", post(add_accrual))
        .route("/api/hr/leaves/calendar", get(calendar))
        .route("/api/hr/leaves/department-report", get(department_report))
        .route("/api/hr/leaves/upcoming", get(upcoming))
        .route("/api/hr/leaves/process-accruals", post(process_accruals))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock backend serving");
    axum::serve(listener, app()).await
}

/// An error response with a JSON body.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    body: Value,
}

impl Failure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Insufficient permissions")
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Resolve the bearer token to its employee and check `roles` (empty means
/// any signed-in user).
async fn authorize(db: &Db, headers: &HeaderMap, roles: &[&str]) -> Result<Employee, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let store = db.read().await;
    let user = token
        .and_then(|t| store.sessions.get(t))
        .and_then(|id| store.employee(*id))
        .cloned()
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Unauthorized"))?;
    if !roles.is_empty() && !roles.iter().any(|r| user.has_role(r)) {
        debug!(user = user.id, ?roles, "role check failed");
        return Err(Failure::forbidden());
    }
    Ok(user)
}

fn start_session(store: &mut Store, employee: &Employee) -> Value {
    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), employee.id);
    debug!(employee_id = employee.id, "session started");
    json!({ "token": token, "employee": employee })
}

// --- auth ---

#[derive(Deserialize)]
pub struct EmployeeLogin {
    pub nrc: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    pub nrc: String,
    pub name: String,
    pub password: String,
    pub department: Option<String>,
}

async fn login(State(db): State<Db>, Json(input): Json<EmployeeLogin>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let employee = store
        .employees
        .iter()
        .find(|e| e.nrc.as_deref() == Some(input.nrc.as_str()) && e.password == input.password)
        .cloned()
        .ok_or_else(|| {
            warn!(nrc = %input.nrc, "employee login rejected");
            Failure::new(StatusCode::UNAUTHORIZED, "Invalid NRC or password")
        })?;
    Ok(Json(start_session(&mut store, &employee)))
}

async fn admin_login(State(db): State<Db>, Json(input): Json<AdminLogin>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let admin = store
        .employees
        .iter()
        .find(|e| e.username.as_deref() == Some(input.username.as_str()) && e.password == input.password)
        .cloned()
        .ok_or_else(|| {
            warn!(username = %input.username, "admin login rejected");
            Failure::new(StatusCode::UNAUTHORIZED, "Invalid username or password")
        })?;
    Ok(Json(start_session(&mut store, &admin)))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<Employee>), Failure> {
    let mut store = db.write().await;
    if store.nrc_taken(&input.nrc) {
        return Err(Failure::bad_request("NRC already registered"));
    }
    let id = store.insert_employee(NewEmployee {
        nrc: Some(input.nrc),
        name: input.name,
        department: input.department.unwrap_or_default(),
        role: Some("employee".to_string()),
        password: input.password,
        ..NewEmployee::default()
    });
    let employee = store.employee(id).cloned().ok_or_else(|| Failure::not_found("Employee not found"))?;
    Ok((StatusCode::CREATED, Json(employee)))
}

// --- leaves ---

#[derive(Deserialize)]
pub struct ApplyLeave {
    pub leave_type_id: u64,
    pub start_date: String,
    pub end_date: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectLeave {
    pub reason: String,
}

async fn my_leaves(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Leave>>, Failure> {
    let user = authorize(&db, &headers, ANYONE).await?;
    let store = db.read().await;
    Ok(Json(store.leaves.iter().filter(|l| l.employee_id == user.id).cloned().collect()))
}

async fn apply_leave(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ApplyLeave>,
) -> Result<(StatusCode, Json<Leave>), Failure> {
    let user = authorize(&db, &headers, ANYONE).await?;
    if input.end_date < input.start_date {
        return Err(Failure::bad_request("End date must not be before start date"));
    }
    let mut store = db.write().await;
    if !store.leave_types.iter().any(|t| t.id == input.leave_type_id) {
        return Err(Failure::bad_request("Unknown leave type"));
    }
    let leave = Leave {
        id: store.next_id(),
        employee_id: user.id,
        leave_type_id: input.leave_type_id,
        start_date: input.start_date,
        end_date: input.end_date,
        reason: input.reason,
        status: "pending".to_string(),
        rejection_reason: None,
    };
    store.leaves.push(leave.clone());
    store.record(leave.id, "applied", user.id);
    Ok((StatusCode::CREATED, Json(leave)))
}

async fn my_balance(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let user = authorize(&db, &headers, ANYONE).await?;
    Ok(Json(json!({
        "employee_id": user.id,
        "annual_leave_balance": user.annual_leave_balance,
    })))
}

async fn pending_leaves(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Leave>>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    Ok(Json(store.leaves.iter().filter(|l| l.status == "pending").cloned().collect()))
}

/// Move a pending leave to `status`, recording the action.
async fn decide(db: &Db, id: u64, actor: &Employee, status: &str, reason: Option<String>) -> Result<Json<Leave>, Failure> {
    let mut store = db.write().await;
    let leave = store.leave_mut(id).ok_or_else(|| Failure::not_found("Leave not found"))?;
    if leave.status != "pending" {
        return Err(Failure::bad_request("Leave is not pending"));
    }
    leave.status = status.to_string();
    leave.rejection_reason = reason;
    let leave = leave.clone();
    store.record(id, status, actor.id);
    debug!(leave = id, status, by = actor.id, "leave decided");
    Ok(Json(leave))
}

async fn approve_leave(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Leave>, Failure> {
    let user = authorize(&db, &headers, STAFF).await?;
    decide(&db, id, &user, "approved", None).await
}

async fn reject_leave(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<RejectLeave>,
) -> Result<Json<Leave>, Failure> {
    let user = authorize(&db, &headers, STAFF).await?;
    decide(&db, id, &user, "rejected", Some(input.reason)).await
}

async fn cancel_leave(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Leave>, Failure> {
    let user = authorize(&db, &headers, ANYONE).await?;
    let owner = {
        let store = db.read().await;
        store.leaves.iter().find(|l| l.id == id).map(|l| l.employee_id)
    };
    match owner {
        None => Err(Failure::not_found("Leave not found")),
        Some(owner) if owner != user.id => Err(Failure::new(StatusCode::FORBIDDEN, "You can only cancel your own leave")),
        Some(_) => decide(&db, id, &user, "cancelled", None).await,
    }
}

async fn leave_audit(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers, ANYONE).await?;
    let store = db.read().await;
    let entries: Vec<_> = store.audit.iter().filter(|a| a.leave_id == id).collect();
    Ok(Json(json!(entries)))
}

// --- leave types ---

#[derive(Deserialize)]
pub struct LeaveTypeInput {
    pub name: Option<String>,
    pub days_per_year: Option<f64>,
}

async fn list_leave_types(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<LeaveType>>, Failure> {
    authorize(&db, &headers, ANYONE).await?;
    Ok(Json(db.read().await.leave_types.clone()))
}

async fn create_leave_type(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<LeaveTypeInput>,
) -> Result<(StatusCode, Json<LeaveType>), Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Failure::bad_request("Name is required"))?;
    let mut store = db.write().await;
    let leave_type = LeaveType {
        id: store.next_id(),
        name,
        days_per_year: input.days_per_year.unwrap_or_default(),
    };
    store.leave_types.push(leave_type.clone());
    Ok((StatusCode::CREATED, Json(leave_type)))
}

async fn update_leave_type(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<LeaveTypeInput>,
) -> Result<Json<LeaveType>, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let mut store = db.write().await;
    let leave_type = store
        .leave_types
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| Failure::not_found("Leave type not found"))?;
    if let Some(name) = input.name {
        leave_type.name = name;
    }
    if let Some(days) = input.days_per_year {
        leave_type.days_per_year = days;
    }
    Ok(Json(leave_type.clone()))
}

async fn delete_leave_type(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let mut store = db.write().await;
    let before = store.leave_types.len();
    store.leave_types.retain(|t| t.id != id);
    if store.leave_types.len() == before {
        return Err(Failure::not_found("Leave type not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- employees ---

#[derive(Deserialize)]
pub struct EmployeeInput {
    pub nrc: String,
    pub name: String,
    pub department: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AdminInput {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

async fn list_employees(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Employee>>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    Ok(Json(db.read().await.employees.clone()))
}

fn insert_staff(store: &mut Store, input: EmployeeInput) -> Result<Employee, Failure> {
    if store.nrc_taken(&input.nrc) {
        return Err(Failure::bad_request("NRC already registered"));
    }
    let id = store.insert_employee(NewEmployee {
        nrc: Some(input.nrc),
        name: input.name,
        department: input.department.unwrap_or_default(),
        role: Some(input.role.unwrap_or_else(|| "employee".to_string())),
        password: input.password.unwrap_or_else(|| STAFF_PASSWORD.to_string()),
        ..NewEmployee::default()
    });
    store.employee(id).cloned().ok_or_else(|| Failure::not_found("Employee not found"))
}

async fn create_employee(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<EmployeeInput>,
) -> Result<(StatusCode, Json<Employee>), Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let employee = insert_staff(&mut *db.write().await, input)?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn get_employee(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Employee>, Failure> {
    let user = authorize(&db, &headers, ANYONE).await?;
    if user.id != id && !user.is_staff() {
        return Err(Failure::forbidden());
    }
    let store = db.read().await;
    store.employee(id).cloned().map(Json).ok_or_else(|| Failure::not_found("Employee not found"))
}

async fn update_employee(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<EmployeeUpdate>,
) -> Result<Json<Employee>, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let mut store = db.write().await;
    let employee = store.employee_mut(id).ok_or_else(|| Failure::not_found("Employee not found"))?;
    if let Some(name) = input.name {
        employee.name = name;
    }
    if let Some(department) = input.department {
        employee.department = department;
    }
    if let Some(role) = input.role {
        employee.role = Some(role);
    }
    if let Some(status) = input.status {
        employee.status = status;
    }
    Ok(Json(employee.clone()))
}

async fn delete_employee(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let mut store = db.write().await;
    let before = store.employees.len();
    store.employees.retain(|e| e.id != id);
    if store.employees.len() == before {
        return Err(Failure::not_found("Employee not found"));
    }
    store.sessions.retain(|_, owner| *owner != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn create_admin(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AdminInput>,
) -> Result<(StatusCode, Json<Employee>), Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let mut store = db.write().await;
    if store.username_taken(&input.username) {
        return Err(Failure::bad_request("Username already taken"));
    }
    let id = store.insert_employee(NewEmployee {
        name: input.name.unwrap_or_else(|| input.username.clone()),
        username: Some(input.username),
        department: "HR".to_string(),
        role: Some("admin".to_string()),
        password: input.password,
        ..NewEmployee::default()
    });
    let admin = store.employee(id).cloned().ok_or_else(|| Failure::not_found("Employee not found"))?;
    Ok((StatusCode::CREATED, Json(admin)))
}

async fn employee_template(State(db): State<Db>, headers: HeaderMap) -> Result<Response, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    Ok(attachment("text/csv", "employee_template.csv", TEMPLATE_CSV.as_bytes().to_vec()))
}

/// Import `nrc,name,department[,role]` rows. The header line is skipped and
/// rows that fail are reported without stopping the import.
async fn bulk_upload(State(db): State<Db>, headers: HeaderMap, multipart: Multipart) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers, ADMIN).await?;
    let upload = read_file(multipart).await?;
    let text = String::from_utf8(upload.contents).map_err(|_| Failure::bad_request("File must be UTF-8 CSV"))?;

    let mut store = db.write().await;
    let mut created = 0;
    let mut errors = Vec::new();
    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [nrc, name, department, rest @ ..] = fields.as_slice() else {
            errors.push(format!("line {}: expected nrc,name,department", index + 1));
            continue;
        };
        let input = EmployeeInput {
            nrc: nrc.to_string(),
            name: name.to_string(),
            department: Some(department.to_string()),
            role: rest.first().filter(|r| !r.is_empty()).map(|r| r.to_string()),
            password: None,
        };
        match insert_staff(&mut store, input) {
            Ok(_) => created += 1,
            Err(failure) => errors.push(format!("line {}: {}", index + 1, failure.body["message"].as_str().unwrap_or(""))),
        }
    }
    info!(file = %upload.file_name, created, failed = errors.len(), "bulk import");
    Ok(Json(json!({ "created": created, "errors": errors })))
}

// --- documents ---

struct Upload {
    file_name: String,
    content_type: String,
    contents: Vec<u8>,
}

/// First part named `file`.
async fn read_file(mut multipart: Multipart) -> Result<Upload, Failure> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Failure::bad_request(&e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let contents = field.bytes().await.map_err(|e| Failure::bad_request(&e.to_string()))?;
        return Ok(Upload {
            file_name,
            content_type,
            contents: contents.to_vec(),
        });
    }
    Err(Failure::bad_request("No file uploaded"))
}

fn attachment(content_type: &str, file_name: &str, contents: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        contents,
    )
        .into_response()
}

async fn own_or_staff(db: &Db, headers: &HeaderMap, employee_id: u64) -> Result<Employee, Failure> {
    let user = authorize(db, headers, ANYONE).await?;
    if user.id != employee_id && !user.is_staff() {
        return Err(Failure::forbidden());
    }
    Ok(user)
}

async fn list_documents(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Vec<Document>>, Failure> {
    own_or_staff(&db, &headers, id).await?;
    let store = db.read().await;
    Ok(Json(store.documents.iter().filter(|d| d.employee_id == id).cloned().collect()))
}

async fn upload_document(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), Failure> {
    own_or_staff(&db, &headers, id).await?;
    let upload = read_file(multipart).await?;
    let mut store = db.write().await;
    if store.employee(id).is_none() {
        return Err(Failure::not_found("Employee not found"));
    }
    let document = Document {
        id: store.next_id(),
        employee_id: id,
        file_name: upload.file_name,
        content_type: upload.content_type,
        size: upload.contents.len(),
        contents: upload.contents,
    };
    store.documents.push(document.clone());
    Ok((StatusCode::CREATED, Json(document)))
}

async fn download_document(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, doc_id)): Path<(u64, u64)>,
) -> Result<Response, Failure> {
    own_or_staff(&db, &headers, id).await?;
    let store = db.read().await;
    let document = store
        .documents
        .iter()
        .find(|d| d.id == doc_id && d.employee_id == id)
        .ok_or_else(|| Failure::not_found("Document not found"))?;
    Ok(attachment(&document.content_type, &document.file_name, document.contents.clone()))
}

async fn delete_document(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, doc_id)): Path<(u64, u64)>,
) -> Result<StatusCode, Failure> {
    own_or_staff(&db, &headers, id).await?;
    let mut store = db.write().await;
    let before = store.documents.len();
    store.documents.retain(|d| !(d.id == doc_id && d.employee_id == id));
    if store.documents.len() == before {
        return Err(Failure::not_found("Document not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- hr ---

#[derive(Deserialize)]
pub struct BalanceQuery {
    pub department: Option<String>,
    pub status: Option<String>,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct Adjustment {
    pub days: f64,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
}

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<u32>,
}

#[derive(Deserialize)]
pub struct AccrualQuery {
    pub month: Option<String>,
}

async fn balances(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Vec<BalanceRow>>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    Ok(Json(store.balance_rows(query.department.as_deref(), query.status.as_deref())))
}

async fn export_balances(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<BalanceQuery>,
) -> Result<Response, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    let mut report = String::from("employee_id,name,department,status,annual_leave_balance\n");
    for row in store.balance_rows(query.department.as_deref(), query.status.as_deref()) {
        report.push_str(&format!(
            "{},{},{},{},{}\n",
            row.employee_id, row.name, row.department, row.status, row.annual_leave_balance
        ));
    }
    let response = match query.format.as_deref().unwrap_or("excel") {
        "pdf" => attachment("application/pdf", "annual_leave_balances.pdf", format!("%PDF-1.4\n{report}").into_bytes()),
        "excel" => attachment(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "annual_leave_balances.xlsx",
            report.into_bytes(),
        ),
        other => return Err(Failure::bad_request(&format!("Unsupported format: {other}"))),
    };
    Ok(response)
}

async fn employee_balance(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<BalanceRow>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    store
        .employee(id)
        .map(|e| Json(e.balance_row()))
        .ok_or_else(|| Failure::not_found("Employee not found"))
}

async fn credit(db: &Db, id: u64, days: f64) -> Result<Json<BalanceRow>, Failure> {
    let mut store = db.write().await;
    let employee = store.employee_mut(id).ok_or_else(|| Failure::not_found("Employee not found"))?;
    employee.annual_leave_balance += days;
    Ok(Json(employee.balance_row()))
}

async fn adjust_balance(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<Adjustment>,
) -> Result<Json<BalanceRow>, Failure> {
    let user = authorize(&db, &headers, STAFF).await?;
    if input.reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
        return Err(Failure::bad_request("A reason is required for adjustments"));
    }
    debug!(employee = id, days = input.days, by = user.id, "balance adjusted");
    credit(&db, id, input.days).await
}

async fn add_accrual(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<Adjustment>,
) -> Result<Json<BalanceRow>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    if input.days <= 0.0 {
        return Err(Failure::bad_request("Accrual must be positive"));
    }
    credit(&db, id, input.days).await
}

/// Approved leave overlapping the requested window.
async fn calendar(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<Leave>>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    let leaves = store
        .leaves
        .iter()
        .filter(|l| l.status == "approved")
        .filter(|l| query.start_date.as_ref().map_or(true, |start| &l.end_date >= start))
        .filter(|l| query.end_date.as_ref().map_or(true, |end| &l.start_date <= end))
        .filter(|l| {
            query
                .department
                .as_ref()
                .map_or(true, |d| store.employee(l.employee_id).is_some_and(|e| &e.department == d))
        })
        .cloned()
        .collect();
    Ok(Json(leaves))
}

async fn department_report(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    let mut report: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for employee in store.employees.iter().filter(|e| e.username.is_none()) {
        report.entry(employee.department.as_str()).or_default().0 += 1;
    }
    for leave in store.leaves.iter().filter(|l| l.status == "approved") {
        if let Some(employee) = store.employee(leave.employee_id) {
            report.entry(employee.department.as_str()).or_default().1 += 1;
        }
    }
    let rows: Vec<Value> = report
        .into_iter()
        .map(|(department, (employees, approved))| {
            json!({ "department": department, "employees": employees, "approved_leaves": approved })
        })
        .collect();
    Ok(Json(json!(rows)))
}

/// Every approved leave; the mock does not filter by date.
async fn upcoming(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    let store = db.read().await;
    let leaves: Vec<&Leave> = store.leaves.iter().filter(|l| l.status == "approved").collect();
    Ok(Json(json!({ "days": query.days.unwrap_or(30), "leaves": leaves })))
}

/// Credit the monthly accrual to every active employee. A malformed month
/// fails the way the real backend does: a 500 with a problem-details body.
async fn process_accruals(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<AccrualQuery>,
) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers, STAFF).await?;
    if let Some(month) = query.month.as_deref().filter(|m| !is_month(m)) {
        warn!(month, "accrual run with malformed month");
        return Err(Failure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "title": "Internal Server Error", "status": 500 }),
        });
    }
    let mut store = db.write().await;
    let mut processed = 0;
    for employee in store
        .employees
        .iter_mut()
        .filter(|e| e.username.is_none() && e.status == "active")
    {
        employee.annual_leave_balance += 1.25;
        processed += 1;
    }
    info!(processed, month = ?query.month, "accruals processed");
    Ok(Json(json!({ "month": query.month, "processed": processed })))
}

fn is_month(value: &str) -> bool {
    match value.split_once('-') {
        Some((year, month)) => {
            year.len() == 4
                && year.bytes().all(|b| b.is_ascii_digit())
                && month.len() == 2
                && matches!(month.parse::<u8>(), Ok(1..=12))
        }
        None => false,
    }
}
