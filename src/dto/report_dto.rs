use serde::Deserialize;
use validator::Validate;

use crate::models::report::ReportRange;
use crate::utils::validation::validate_date;

fn validate_date_param(value: &str) -> Result<(), validator::ValidationError> {
    validate_date(value).map(|_| ())
}

/// Query `?from=YYYY-MM-DD&to=YYYY-MM-DD` de los reportes
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReportQuery {
    #[validate(custom = "validate_date_param")]
    pub from: Option<String>,
    #[validate(custom = "validate_date_param")]
    pub to: Option<String>,
}

impl ReportQuery {
    /// Rango ya validado; fechas mal formadas se descartan
    pub fn range(&self) -> ReportRange {
        ReportRange {
            from: self.from.as_deref().and_then(|d| validate_date(d).ok()),
            to: self.to.as_deref().and_then(|d| validate_date(d).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_report_query_range() {
        let query = ReportQuery {
            from: Some("2024-05-01".into()),
            to: None,
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.range().from, NaiveDate::from_ymd_opt(2024, 5, 1));

        let bad = ReportQuery {
            from: Some("01/05/2024".into()),
            to: None,
        };
        assert!(bad.validate().is_err());
    }
}
