//! In-memory records behind the mock API, seeded with one account per role.

use std::collections::HashMap;

use serde::Serialize;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const MANAGER_NRC: &str = "12/MGR(N)000001";
pub const EMPLOYEE_NRC: &str = "12/EMP(N)000002";
/// An employee whose record carries no role at all.
pub const UNASSIGNED_NRC: &str = "12/EMP(N)000003";
pub const STAFF_PASSWORD: &str = "secret123";

#[derive(Clone, Debug, Serialize)]
pub struct Employee {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrc: Option<String>,
    pub name: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    pub status: String,
    pub annual_leave_balance: f64,
    #[serde(skip)]
    pub password: String,
}

impl Employee {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role) || self.roles.iter().any(|r| r == role)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role("admin") || self.has_role("manager")
    }

    pub fn balance_row(&self) -> BalanceRow {
        BalanceRow {
            employee_id: self.id,
            name: self.name.clone(),
            department: self.department.clone(),
            status: self.status.clone(),
            annual_leave_balance: self.annual_leave_balance,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BalanceRow {
    pub employee_id: u64,
    pub name: String,
    pub department: String,
    pub status: String,
    pub annual_leave_balance: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    pub days_per_year: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Leave {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    pub leave_id: u64,
    pub action: String,
    pub performed_by: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Document {
    pub id: u64,
    pub employee_id: u64,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip)]
    pub contents: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub employees: Vec<Employee>,
    pub leave_types: Vec<LeaveType>,
    pub leaves: Vec<Leave>,
    pub audit: Vec<AuditEntry>,
    pub documents: Vec<Document>,
    /// Bearer token to employee id.
    pub sessions: HashMap<String, u64>,
    next_id: u64,
}

impl Store {
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for (name, days_per_year) in [("Annual", 10.0), ("Sick", 30.0)] {
            let id = store.next_id();
            store.leave_types.push(LeaveType {
                id,
                name: name.to_string(),
                days_per_year,
            });
        }
        let admin = store.insert_employee(NewEmployee {
            username: Some(ADMIN_USERNAME.to_string()),
            name: "System Administrator".to_string(),
            department: "HR".to_string(),
            role: Some("admin".to_string()),
            password: ADMIN_PASSWORD.to_string(),
            ..NewEmployee::default()
        });
        if let Some(admin) = store.employee_mut(admin) {
            admin.roles = vec!["admin".to_string()];
        }

        for (nrc, name, department, role, balance) in [
            (MANAGER_NRC, "Aung Aung", "Finance", Some("manager"), 12.0),
            (EMPLOYEE_NRC, "Hla Hla", "Finance", Some("employee"), 8.0),
            (UNASSIGNED_NRC, "Mya Mya", "Operations", None, 5.0),
        ] {
            let id = store.insert_employee(NewEmployee {
                nrc: Some(nrc.to_string()),
                name: name.to_string(),
                department: department.to_string(),
                role: role.map(str::to_string),
                password: STAFF_PASSWORD.to_string(),
                ..NewEmployee::default()
            });
            if let Some(employee) = store.employee_mut(id) {
                employee.annual_leave_balance = balance;
            }
        }

        store
    }

    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn insert_employee(&mut self, new: NewEmployee) -> u64 {
        let id = self.next_id();
        self.employees.push(Employee {
            id,
            username: new.username,
            nrc: new.nrc,
            name: new.name,
            department: new.department,
            role: new.role,
            roles: Vec::new(),
            status: "active".to_string(),
            annual_leave_balance: 0.0,
            password: new.password,
        });
        id
    }

    pub fn employee(&self, id: u64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn employee_mut(&mut self, id: u64) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.id == id)
    }

    pub fn nrc_taken(&self, nrc: &str) -> bool {
        self.employees.iter().any(|e| e.nrc.as_deref() == Some(nrc))
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.employees.iter().any(|e| e.username.as_deref() == Some(username))
    }

    pub fn leave_mut(&mut self, id: u64) -> Option<&mut Leave> {
        self.leaves.iter_mut().find(|l| l.id == id)
    }

    pub fn record(&mut self, leave_id: u64, action: &str, performed_by: u64) {
        self.audit.push(AuditEntry {
            leave_id,
            action: action.to_string(),
            performed_by,
        });
    }

    /// Balance rows of non-admin staff, filtered by department and status.
    pub fn balance_rows(&self, department: Option<&str>, status: Option<&str>) -> Vec<BalanceRow> {
        self.employees
            .iter()
            .filter(|e| e.username.is_none())
            .filter(|e| department.map_or(true, |d| e.department == d))
            .filter(|e| status.map_or(true, |s| e.status == s))
            .map(Employee::balance_row)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct NewEmployee {
    pub username: Option<String>,
    pub nrc: Option<String>,
    pub name: String,
    pub department: String,
    pub role: Option<String>,
    pub password: String,
}
