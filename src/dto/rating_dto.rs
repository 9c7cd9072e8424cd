use serde::Deserialize;
use validator::Validate;

use crate::models::rating::RatingDraft;
use crate::utils::validation::clean_text;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingRequest {
    #[validate(range(min = 1, max = 5))]
    pub wait_time_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub staff_friendliness_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub service_quality_rating: i32,
    #[validate(length(max = 2000))]
    pub customer_comment: Option<String>,
    /// Token del enlace; si viene se consume junto con la calificación
    pub token: Option<String>,
}

impl SubmitRatingRequest {
    pub fn into_draft(self, service_id: i64) -> (RatingDraft, Option<String>) {
        let draft = RatingDraft {
            service_id,
            wait_time_rating: self.wait_time_rating,
            staff_friendliness_rating: self.staff_friendliness_rating,
            service_quality_rating: self.service_quality_rating,
            customer_comment: clean_text(self.customer_comment),
        };
        (draft, clean_text(self.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratings_must_be_between_one_and_five() {
        let valid: SubmitRatingRequest = serde_json::from_str(
            r#"{"wait_time_rating":4,"staff_friendliness_rating":5,"service_quality_rating":4,"customer_comment":"Great service"}"#,
        )
        .unwrap();
        assert!(valid.validate().is_ok());

        let invalid: SubmitRatingRequest = serde_json::from_str(
            r#"{"wait_time_rating":0,"staff_friendliness_rating":6,"service_quality_rating":3}"#,
        )
        .unwrap();
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("wait_time_rating"));
        assert!(fields.contains_key("staff_friendliness_rating"));
        assert!(!fields.contains_key("service_quality_rating"));
    }
}
