use serde::Deserialize;
use validator::Validate;

use crate::models::customer::CustomerDraft;
use crate::utils::validation::{clean_text, validate_email, validate_not_blank};

// Request para crear un cliente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    #[validate(length(max = 30), custom = "validate_not_blank")]
    pub phone: String,
    pub address: Option<String>,
}

impl From<CreateCustomerRequest> for CustomerDraft {
    fn from(request: CreateCustomerRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            email: clean_text(request.email),
            phone: request.phone.trim().to_string(),
            address: clean_text(request.address),
        }
    }
}

// Request para actualizar un cliente; los campos ausentes se conservan
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    #[validate(length(max = 30), custom = "validate_not_blank")]
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn apply(self, mut draft: CustomerDraft) -> CustomerDraft {
        if let Some(name) = self.name {
            draft.name = name.trim().to_string();
        }
        if let Some(phone) = self.phone {
            draft.phone = phone.trim().to_string();
        }
        if self.email.is_some() {
            draft.email = clean_text(self.email);
        }
        if self.address.is_some() {
            draft.address = clean_text(self.address);
        }
        draft
    }
}
