use serde::Deserialize;
use validator::Validate;

use crate::models::vehicle::VehicleDraft;
use crate::utils::validation::{clean_text, normalize_plate, validate_license_plate, validate_not_blank};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    pub customer_id: i64,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub make: String,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,
    #[validate(length(max = 17))]
    pub vin: Option<String>,
    pub color: Option<String>,
}

impl From<CreateVehicleRequest> for VehicleDraft {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            customer_id: request.customer_id,
            make: request.make.trim().to_string(),
            model: request.model.trim().to_string(),
            year: request.year,
            license_plate: normalize_plate(&request.license_plate),
            vin: clean_text(request.vin),
            color: clean_text(request.color),
            last_service_date: None,
        }
    }
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    pub customer_id: Option<i64>,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub make: Option<String>,
    #[validate(length(max = 60), custom = "validate_not_blank")]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(length(max = 17))]
    pub vin: Option<String>,
    pub color: Option<String>,
}

impl UpdateVehicleRequest {
    pub fn apply(self, mut draft: VehicleDraft) -> VehicleDraft {
        if let Some(customer_id) = self.customer_id {
            draft.customer_id = customer_id;
        }
        if let Some(make) = self.make {
            draft.make = make.trim().to_string();
        }
        if let Some(model) = self.model {
            draft.model = model.trim().to_string();
        }
        if let Some(year) = self.year {
            draft.year = year;
        }
        if let Some(plate) = self.license_plate {
            draft.license_plate = normalize_plate(&plate);
        }
        if self.vin.is_some() {
            draft.vin = clean_text(self.vin);
        }
        if self.color.is_some() {
            draft.color = clean_text(self.color);
        }
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(plate: &str) -> CreateVehicleRequest {
        CreateVehicleRequest {
            customer_id: 1,
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2020,
            license_plate: plate.into(),
            vin: None,
            color: Some(" ".into()),
        }
    }

    #[test]
    fn test_plate_is_normalized() {
        let draft = VehicleDraft::from(request(" abc123 "));
        assert_eq!(draft.license_plate, "ABC123");
        assert_eq!(draft.color, None);
    }

    #[test]
    fn test_invalid_plate_and_year_fail_validation() {
        assert!(request("ABC123").validate().is_ok());
        assert!(request("A#1").validate().is_err());
        let mut old = request("ABC123");
        old.year = 1800;
        assert!(old.validate().is_err());
    }
}
