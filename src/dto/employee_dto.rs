use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::employee::{EmployeeDraft, EmployeeStatus};
use crate::utils::validation::{clean_text, validate_email, validate_not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 80), custom = "validate_not_blank")]
    pub position: String,
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Por defecto la fecha de hoy
    pub hire_date: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
}

impl From<CreateEmployeeRequest> for EmployeeDraft {
    fn from(request: CreateEmployeeRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            position: request.position.trim().to_string(),
            email: clean_text(request.email),
            phone: clean_text(request.phone),
            hire_date: request
                .hire_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            status: request.status.unwrap_or(EmployeeStatus::Active),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 80), custom = "validate_not_blank")]
    pub position: Option<String>,
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
}

impl UpdateEmployeeRequest {
    pub fn apply(self, mut draft: EmployeeDraft) -> EmployeeDraft {
        if let Some(name) = self.name {
            draft.name = name.trim().to_string();
        }
        if let Some(position) = self.position {
            draft.position = position.trim().to_string();
        }
        if self.email.is_some() {
            draft.email = clean_text(self.email);
        }
        if self.phone.is_some() {
            draft.phone = clean_text(self.phone);
        }
        if let Some(hire_date) = self.hire_date {
            draft.hire_date = hire_date;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        draft
    }
}

#[derive(Debug, Deserialize)]
pub struct EmployeeStatusRequest {
    pub status: EmployeeStatus,
}
