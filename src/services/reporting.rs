//! Agregaciones de reportes
//!
//! Funciones puras sobre visitas completadas; los controllers obtienen las
//! filas del store y las proyectan aquí.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::pending_service::PendingService;
use crate::models::report::{
    CompletedVisit, DailyIncome, ServiceTypeShare, ServiceTypeTime, VehicleVisitDay,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn service_minutes(visit: &CompletedVisit) -> f64 {
    (visit.completed_at - visit.entry_time).num_seconds() as f64 / 60.0
}

/// Ingreso y número de visitas por día de finalización
pub fn daily_income(visits: &[CompletedVisit]) -> Vec<DailyIncome> {
    let mut days: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();
    for visit in visits {
        let entry = days
            .entry(visit.completed_at.date_naive())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += visit.base_price;
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(day, (income, services))| DailyIncome {
            day,
            income,
            services,
        })
        .collect()
}

/// Participación de cada tipo de servicio, del más frecuente al menos
pub fn service_type_mix(visits: &[CompletedVisit]) -> Vec<ServiceTypeShare> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for visit in visits {
        *counts.entry(visit.service_type_name.as_str()).or_default() += 1;
    }
    let total = visits.len() as f64;
    let mut shares: Vec<ServiceTypeShare> = counts
        .into_iter()
        .map(|(name, count)| ServiceTypeShare {
            name: name.to_string(),
            count,
            percentage: round2(count as f64 / total * 100.0),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares
}

/// Minutos promedio entre ingreso y finalización por tipo de servicio
pub fn service_times(visits: &[CompletedVisit]) -> Vec<ServiceTypeTime> {
    let mut groups: BTreeMap<&str, (f64, i64)> = BTreeMap::new();
    for visit in visits {
        let entry = groups
            .entry(visit.service_type_name.as_str())
            .or_insert((0.0, 0));
        entry.0 += service_minutes(visit);
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(name, (minutes, samples))| ServiceTypeTime {
            service_type: name.to_string(),
            avg_minutes: round2(minutes / samples as f64),
            samples,
        })
        .collect()
}

/// Visitas de un vehículo agrupadas por día de ingreso
pub fn vehicle_visits(services: &[PendingService]) -> Vec<VehicleVisitDay> {
    let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for service in services {
        *days.entry(service.entry_time.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, services)| VehicleVisitDay { date, services })
        .collect()
}

/// Promedio de minutos de servicio; 0 sin visitas
pub fn average_minutes(visits: &[CompletedVisit]) -> f64 {
    if visits.is_empty() {
        return 0.0;
    }
    let total: f64 = visits.iter().map(service_minutes).sum();
    round2(total / visits.len() as f64)
}

pub fn total_income(visits: &[CompletedVisit]) -> Decimal {
    visits.iter().map(|visit| visit.base_price).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::str::FromStr;

    fn visit(id: i64, name: &str, price: &str, day: u32, minutes: i64) -> CompletedVisit {
        let entry = Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap();
        CompletedVisit {
            service_id: id,
            service_type_name: name.into(),
            base_price: Decimal::from_str(price).unwrap(),
            license_plate: "ABC123".into(),
            entry_time: entry,
            completed_at: entry + Duration::minutes(minutes),
        }
    }

    fn sample() -> Vec<CompletedVisit> {
        vec![
            visit(1, "Lavado Básico", "100.00", 1, 30),
            visit(2, "Lavado Básico", "100.00", 1, 50),
            visit(3, "Encerado", "250.50", 2, 90),
            visit(4, "Lavado Básico", "100.00", 2, 40),
        ]
    }

    #[test]
    fn test_daily_income_groups_by_completion_day() {
        let days = daily_income(&sample());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].income, Decimal::from_str("200.00").unwrap());
        assert_eq!(days[0].services, 2);
        assert_eq!(days[1].income, Decimal::from_str("350.50").unwrap());
    }

    #[test]
    fn test_service_type_mix_percentages() {
        let mix = service_type_mix(&sample());
        assert_eq!(mix[0].name, "Lavado Básico");
        assert_eq!(mix[0].count, 3);
        assert_eq!(mix[0].percentage, 75.0);
        assert_eq!(mix[1].percentage, 25.0);
        assert!(service_type_mix(&[]).is_empty());
    }

    #[test]
    fn test_service_times_average_minutes() {
        let times = service_times(&sample());
        let basic = times.iter().find(|t| t.service_type == "Lavado Básico").unwrap();
        assert_eq!(basic.avg_minutes, 40.0);
        assert_eq!(basic.samples, 3);
        assert_eq!(average_minutes(&sample()), 52.5);
        assert_eq!(average_minutes(&[]), 0.0);
    }

    #[test]
    fn test_total_income() {
        assert_eq!(total_income(&sample()), Decimal::from_str("550.50").unwrap());
        assert_eq!(total_income(&[]), Decimal::ZERO);
    }
}
