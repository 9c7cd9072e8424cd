//! Store en memoria
//!
//! Implementa todos los traits de store sobre tablas en memoria protegidas
//! por un único `Mutex`. Cada método toma el lock una sola vez, así que las
//! operaciones compuestas son atómicas igual que una transacción. Emula las
//! restricciones del schema: claves foráneas (RESTRICT, CASCADE, SET NULL),
//! matrícula única, una calificación por visita y existencias no negativas.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::customer::{Customer, CustomerDraft};
use crate::models::employee::{Employee, EmployeeDraft, EmployeeFilters};
use crate::models::inventory::{InventoryItem, InventoryItemDraft, InventoryUsage, UsageDraft};
use crate::models::pending_service::{
    PendingService, PendingServiceChanges, PendingServiceDraft, PendingServiceFilters,
    ServiceStatus,
};
use crate::models::rating::{
    LinkState, NewRatingLink, RatingDraft, RatingLink, RatingLinkValidation, RatingReport,
    ServiceRating,
};
use crate::models::report::{CompletedVisit, ReportRange};
use crate::models::service_offer::{ServiceCategory, ServiceOffer, ServiceOfferDraft};
use crate::models::vehicle::{Vehicle, VehicleDraft};
use crate::models::work_order::{
    order_total, OrderPartDraft, OrderPartLine, OrderServiceDraft, OrderServiceLine, WorkOrder,
    WorkOrderDetail, WorkOrderDraft, WorkOrderFilters, WorkOrderStatus,
};
use crate::repositories::{
    CatalogStore, CustomerStore, EmployeeStore, InventoryStore, PendingServiceStore, RatingStore,
    VehicleStore, WorkOrderStore,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

fn missing_reference(context: &str) -> AppError {
    AppError::BadRequest(format!("{}: referenced record does not exist", context))
}

/// Coincidencia case-insensitive; `needle` ya viene en minúsculas
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn contains_opt(haystack: &Option<String>, needle: &str) -> bool {
    haystack.as_deref().map_or(false, |value| contains(value, needle))
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    customers: BTreeMap<i64, Customer>,
    vehicles: BTreeMap<i64, Vehicle>,
    employees: BTreeMap<i64, Employee>,
    categories: BTreeMap<i64, ServiceCategory>,
    offers: BTreeMap<i64, ServiceOffer>,
    pending: BTreeMap<i64, PendingService>,
    items: BTreeMap<i64, InventoryItem>,
    usage: BTreeMap<i64, InventoryUsage>,
    work_orders: BTreeMap<i64, WorkOrder>,
    order_services: BTreeMap<i64, OrderServiceLine>,
    order_parts: BTreeMap<i64, OrderPartLine>,
    links: BTreeMap<String, RatingLink>,
    ratings: BTreeMap<i64, ServiceRating>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn vehicle_view(&self, vehicle: &Vehicle) -> Vehicle {
        let mut view = vehicle.clone();
        view.customer_name = self
            .customers
            .get(&vehicle.customer_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        view
    }

    fn offer_view(&self, offer: &ServiceOffer) -> ServiceOffer {
        let mut view = offer.clone();
        view.category_name = offer
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| c.name.clone());
        view
    }

    fn pending_view(&self, service: &PendingService) -> PendingService {
        let mut view = service.clone();
        if let Some(vehicle) = self.vehicles.get(&service.vehicle_id) {
            view.license_plate = vehicle.license_plate.clone();
            view.make = vehicle.make.clone();
            view.model = vehicle.model.clone();
            view.year = vehicle.year;
            view.color = vehicle.color.clone();
            if let Some(customer) = self.customers.get(&vehicle.customer_id) {
                view.client_name = customer.name.clone();
                view.client_phone = customer.phone.clone();
            }
        }
        if let Some(offer) = self.offers.get(&service.service_type_id) {
            view.service_type_name = offer.name.clone();
            view.service_price = offer.base_price;
            view.service_hours = offer.estimated_hours;
        }
        let employee = service.employee_id.and_then(|id| self.employees.get(&id));
        view.employee_name = employee.map(|e| e.name.clone());
        view.employee_position = employee.map(|e| e.position.clone());
        view
    }

    fn usage_view(&self, usage: &InventoryUsage) -> InventoryUsage {
        let mut view = usage.clone();
        view.item_name = self
            .items
            .get(&usage.item_id)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        view.employee_name = usage
            .employee_id
            .and_then(|id| self.employees.get(&id))
            .map(|e| e.name.clone());
        view.service_name = usage
            .service_id
            .and_then(|id| self.pending.get(&id))
            .and_then(|p| self.offers.get(&p.service_type_id))
            .map(|o| o.name.clone());
        view
    }

    fn work_order_view(&self, order: &WorkOrder) -> WorkOrder {
        let mut view = order.clone();
        if let Some(vehicle) = self.vehicles.get(&order.vehicle_id) {
            view.make = vehicle.make.clone();
            view.model = vehicle.model.clone();
            view.license_plate = vehicle.license_plate.clone();
            view.customer_name = self
                .customers
                .get(&vehicle.customer_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
        }
        view
    }

    fn order_lines(&self, order_id: i64) -> (Vec<OrderServiceLine>, Vec<OrderPartLine>) {
        let services = self
            .order_services
            .values()
            .filter(|line| line.order_id == order_id)
            .map(|line| {
                let mut view = line.clone();
                view.name = self
                    .offers
                    .get(&line.service_id)
                    .map(|o| o.name.clone())
                    .unwrap_or_default();
                view
            })
            .collect();
        let parts = self
            .order_parts
            .values()
            .filter(|line| line.order_id == order_id)
            .map(|line| {
                let mut view = line.clone();
                view.name = self
                    .items
                    .get(&line.item_id)
                    .map(|i| i.name.clone())
                    .unwrap_or_default();
                view
            })
            .collect();
        (services, parts)
    }

    fn work_order_detail(&self, order_id: i64) -> Option<WorkOrderDetail> {
        let order = self.work_orders.get(&order_id)?;
        let (services, parts) = self.order_lines(order_id);
        Some(WorkOrderDetail {
            order: self.work_order_view(order),
            services,
            parts,
        })
    }

    fn open_order(&self, order_id: i64) -> AppResult<()> {
        match self.work_orders.get(&order_id) {
            None => Err(not_found_error("Work order", order_id)),
            Some(order) if order.status.is_terminal() => Err(AppError::Conflict(format!(
                "Work order {} is {} and can no longer change",
                order_id, order.status
            ))),
            Some(_) => Ok(()),
        }
    }

    fn recompute_total(&mut self, order_id: i64) {
        let (services, parts) = self.order_lines(order_id);
        let total = order_total(&services, &parts).round_dp(2);
        if let Some(order) = self.work_orders.get_mut(&order_id) {
            order.total_cost = total;
            order.updated_at = Utc::now();
        }
    }

    /// `quantity += delta` con la misma guarda que el UPDATE de PostgreSQL
    fn move_stock(&mut self, item_id: i64, delta: Decimal) -> AppResult<InventoryItem> {
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| not_found_error("Inventory item", item_id))?;
        let next = item.quantity + delta;
        if next < Decimal::ZERO {
            return Err(AppError::Conflict(format!(
                "Inventory item {} does not have enough stock",
                item_id
            )));
        }
        item.quantity = next;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    fn plate_taken(&self, plate: &str, except: Option<i64>) -> bool {
        self.vehicles
            .values()
            .any(|v| v.license_plate == plate && Some(v.vehicle_id) != except)
    }
}

/// Implementación en memoria de todos los stores
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let tables = self.tables.lock().await;
        let mut customers: Vec<Customer> = tables.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn search_customers(&self, term: &str) -> AppResult<Vec<Customer>> {
        let term = normalize_term(term);
        let mut customers = self.list_customers().await?;
        customers.retain(|c| {
            contains(&c.name, &term) || contains_opt(&c.email, &term) || contains(&c.phone, &term)
        });
        Ok(customers)
    }

    async fn find_customer(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(self.tables.lock().await.customers.get(&id).cloned())
    }

    async fn insert_customer(&self, draft: &CustomerDraft) -> AppResult<Customer> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let customer = Customer {
            customer_id: tables.next_id(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            address: draft.address.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.customers.insert(customer.customer_id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(&self, id: i64, draft: &CustomerDraft) -> AppResult<Option<Customer>> {
        let mut tables = self.tables.lock().await;
        let Some(customer) = tables.customers.get_mut(&id) else {
            return Ok(None);
        };
        customer.name = draft.name.clone();
        customer.email = draft.email.clone();
        customer.phone = draft.phone.clone();
        customer.address = draft.address.clone();
        customer.updated_at = Utc::now();
        Ok(Some(customer.clone()))
    }

    async fn delete_customer(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.customers.contains_key(&id) {
            return Ok(false);
        }
        if tables.vehicles.values().any(|v| v.customer_id == id) {
            return Err(AppError::Conflict(format!("Customer {} still owns vehicles", id)));
        }
        tables.customers.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.lock().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .map(|v| tables.vehicle_view(v))
            .collect();
        vehicles.sort_by(|a, b| (&a.make, &a.model).cmp(&(&b.make, &b.model)));
        Ok(vehicles)
    }

    async fn search_vehicles(&self, term: &str) -> AppResult<Vec<Vehicle>> {
        let term = normalize_term(term);
        let mut vehicles = self.list_vehicles().await?;
        vehicles.retain(|v| {
            contains(&v.make, &term)
                || contains(&v.model, &term)
                || contains(&v.license_plate, &term)
                || contains_opt(&v.vin, &term)
                || contains(&v.customer_name, &term)
        });
        Ok(vehicles)
    }

    async fn list_vehicles_by_customer(&self, customer_id: i64) -> AppResult<Vec<Vehicle>> {
        let mut vehicles = self.list_vehicles().await?;
        vehicles.retain(|v| v.customer_id == customer_id);
        Ok(vehicles)
    }

    async fn find_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.lock().await;
        Ok(tables.vehicles.get(&id).map(|v| tables.vehicle_view(v)))
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .vehicles
            .values()
            .find(|v| v.license_plate == plate)
            .map(|v| tables.vehicle_view(v)))
    }

    async fn insert_vehicle(&self, draft: &VehicleDraft) -> AppResult<Vehicle> {
        let mut tables = self.tables.lock().await;
        if !tables.customers.contains_key(&draft.customer_id) {
            return Err(missing_reference("creating vehicle"));
        }
        if tables.plate_taken(&draft.license_plate, None) {
            return Err(AppError::Conflict("creating vehicle: duplicate value".to_string()));
        }
        let now = Utc::now();
        let vehicle = Vehicle {
            vehicle_id: tables.next_id(),
            customer_id: draft.customer_id,
            make: draft.make.clone(),
            model: draft.model.clone(),
            year: draft.year,
            license_plate: draft.license_plate.clone(),
            vin: draft.vin.clone(),
            color: draft.color.clone(),
            last_service_date: draft.last_service_date,
            created_at: now,
            updated_at: now,
            customer_name: String::new(),
        };
        tables.vehicles.insert(vehicle.vehicle_id, vehicle.clone());
        Ok(tables.vehicle_view(&vehicle))
    }

    async fn update_vehicle(&self, id: i64, draft: &VehicleDraft) -> AppResult<Option<Vehicle>> {
        let mut tables = self.tables.lock().await;
        if !tables.vehicles.contains_key(&id) {
            return Ok(None);
        }
        if !tables.customers.contains_key(&draft.customer_id) {
            return Err(missing_reference("updating vehicle"));
        }
        if tables.plate_taken(&draft.license_plate, Some(id)) {
            return Err(AppError::Conflict("updating vehicle: duplicate value".to_string()));
        }
        let Some(vehicle) = tables.vehicles.get_mut(&id) else {
            return Ok(None);
        };
        vehicle.customer_id = draft.customer_id;
        vehicle.make = draft.make.clone();
        vehicle.model = draft.model.clone();
        vehicle.year = draft.year;
        vehicle.license_plate = draft.license_plate.clone();
        vehicle.vin = draft.vin.clone();
        vehicle.color = draft.color.clone();
        vehicle.last_service_date = draft.last_service_date;
        vehicle.updated_at = Utc::now();
        let vehicle = vehicle.clone();
        Ok(Some(tables.vehicle_view(&vehicle)))
    }

    async fn delete_vehicle(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.vehicles.contains_key(&id) {
            return Ok(false);
        }
        let referenced = tables.pending.values().any(|p| p.vehicle_id == id)
            || tables.work_orders.values().any(|o| o.vehicle_id == id);
        if referenced {
            return Err(AppError::Conflict(format!(
                "Vehicle {} has visits or work orders on record",
                id
            )));
        }
        tables.vehicles.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self, filters: &EmployeeFilters) -> AppResult<Vec<Employee>> {
        let tables = self.tables.lock().await;
        let term = filters
            .q
            .as_deref()
            .map(normalize_term)
            .filter(|t| !t.is_empty());
        let mut employees: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| filters.status.map_or(true, |status| e.status == status))
            .filter(|e| {
                term.as_deref().map_or(true, |term| {
                    contains(&e.name, term)
                        || contains(&e.position, term)
                        || contains_opt(&e.email, term)
                        || contains_opt(&e.phone, term)
                })
            })
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(employees)
    }

    async fn find_employee(&self, id: i64) -> AppResult<Option<Employee>> {
        Ok(self.tables.lock().await.employees.get(&id).cloned())
    }

    async fn insert_employee(&self, draft: &EmployeeDraft) -> AppResult<Employee> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let employee = Employee {
            employee_id: tables.next_id(),
            name: draft.name.clone(),
            position: draft.position.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            hire_date: draft.hire_date,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        tables.employees.insert(employee.employee_id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: i64, draft: &EmployeeDraft) -> AppResult<Option<Employee>> {
        let mut tables = self.tables.lock().await;
        let Some(employee) = tables.employees.get_mut(&id) else {
            return Ok(None);
        };
        employee.name = draft.name.clone();
        employee.position = draft.position.clone();
        employee.email = draft.email.clone();
        employee.phone = draft.phone.clone();
        employee.hire_date = draft.hire_date;
        employee.status = draft.status;
        employee.updated_at = Utc::now();
        Ok(Some(employee.clone()))
    }

    async fn delete_employee(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.employees.remove(&id).is_none() {
            return Ok(false);
        }
        for service in tables.pending.values_mut() {
            if service.employee_id == Some(id) {
                service.employee_id = None;
            }
        }
        for usage in tables.usage.values_mut() {
            if usage.employee_id == Some(id) {
                usage.employee_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_offers(&self) -> AppResult<Vec<ServiceOffer>> {
        let tables = self.tables.lock().await;
        let mut offers: Vec<ServiceOffer> =
            tables.offers.values().map(|o| tables.offer_view(o)).collect();
        offers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(offers)
    }

    async fn list_offers_by_category(&self, category_id: i64) -> AppResult<Vec<ServiceOffer>> {
        let mut offers = self.list_offers().await?;
        offers.retain(|o| o.category_id == Some(category_id));
        Ok(offers)
    }

    async fn find_offer(&self, id: i64) -> AppResult<Option<ServiceOffer>> {
        let tables = self.tables.lock().await;
        Ok(tables.offers.get(&id).map(|o| tables.offer_view(o)))
    }

    async fn insert_offer(&self, draft: &ServiceOfferDraft) -> AppResult<ServiceOffer> {
        let mut tables = self.tables.lock().await;
        if let Some(category_id) = draft.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(missing_reference("creating service"));
            }
        }
        let now = Utc::now();
        let offer = ServiceOffer {
            service_id: tables.next_id(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            base_price: draft.base_price,
            estimated_hours: draft.estimated_hours,
            category_id: draft.category_id,
            created_at: now,
            updated_at: now,
            category_name: None,
        };
        tables.offers.insert(offer.service_id, offer.clone());
        Ok(tables.offer_view(&offer))
    }

    async fn update_offer(&self, id: i64, draft: &ServiceOfferDraft) -> AppResult<Option<ServiceOffer>> {
        let mut tables = self.tables.lock().await;
        if let Some(category_id) = draft.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(missing_reference("updating service"));
            }
        }
        let Some(offer) = tables.offers.get_mut(&id) else {
            return Ok(None);
        };
        offer.name = draft.name.clone();
        offer.description = draft.description.clone();
        offer.base_price = draft.base_price;
        offer.estimated_hours = draft.estimated_hours;
        offer.category_id = draft.category_id;
        offer.updated_at = Utc::now();
        let offer = offer.clone();
        Ok(Some(tables.offer_view(&offer)))
    }

    async fn delete_offer(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.offers.contains_key(&id) {
            return Ok(false);
        }
        let referenced = tables.pending.values().any(|p| p.service_type_id == id)
            || tables.order_services.values().any(|l| l.service_id == id);
        if referenced {
            return Err(AppError::Conflict(format!(
                "Service {} is referenced by visits or orders",
                id
            )));
        }
        tables.offers.remove(&id);
        Ok(true)
    }

    async fn list_categories(&self) -> AppResult<Vec<ServiceCategory>> {
        let tables = self.tables.lock().await;
        let mut categories: Vec<ServiceCategory> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<ServiceCategory>> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, name: &str, description: Option<&str>) -> AppResult<ServiceCategory> {
        let mut tables = self.tables.lock().await;
        if tables.categories.values().any(|c| c.name == name) {
            return Err(AppError::Conflict(
                "creating service category: duplicate value".to_string(),
            ));
        }
        let category = ServiceCategory {
            category_id: tables.next_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        tables.categories.insert(category.category_id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl PendingServiceStore for MemoryStore {
    async fn list_pending_services(&self, filters: &PendingServiceFilters) -> AppResult<Vec<PendingService>> {
        let tables = self.tables.lock().await;
        let term = filters.term().map(normalize_term);
        let mut services: Vec<PendingService> = tables
            .pending
            .values()
            .filter(|p| filters.status.map_or(true, |status| p.status == status))
            .map(|p| tables.pending_view(p))
            .filter(|p| {
                term.as_deref().map_or(true, |term| {
                    contains(&p.license_plate, term) || contains(&p.client_name, term)
                })
            })
            .collect();
        services.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        Ok(services)
    }

    async fn list_pending_services_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<PendingService>> {
        let mut services = self
            .list_pending_services(&PendingServiceFilters::default())
            .await?;
        services.retain(|p| p.vehicle_id == vehicle_id);
        Ok(services)
    }

    async fn find_pending_service(&self, id: i64) -> AppResult<Option<PendingService>> {
        let tables = self.tables.lock().await;
        Ok(tables.pending.get(&id).map(|p| tables.pending_view(p)))
    }

    async fn insert_pending_service(&self, draft: &PendingServiceDraft) -> AppResult<PendingService> {
        let mut tables = self.tables.lock().await;
        let employee_missing = draft
            .employee_id
            .map_or(false, |id| !tables.employees.contains_key(&id));
        if !tables.vehicles.contains_key(&draft.vehicle_id)
            || !tables.offers.contains_key(&draft.service_type_id)
            || employee_missing
        {
            return Err(missing_reference("creating pending service"));
        }
        let now = Utc::now();
        let service = PendingService {
            service_id: tables.next_id(),
            vehicle_id: draft.vehicle_id,
            service_type_id: draft.service_type_id,
            employee_id: draft.employee_id,
            entry_time: draft.entry_time,
            estimated_completion_time: draft.estimated_completion_time,
            completed_at: None,
            status: draft.status,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
            license_plate: String::new(),
            make: String::new(),
            model: String::new(),
            year: 0,
            color: None,
            client_name: String::new(),
            client_phone: String::new(),
            service_type_name: String::new(),
            service_price: Decimal::ZERO,
            service_hours: None,
            employee_name: None,
            employee_position: None,
        };
        tables.pending.insert(service.service_id, service.clone());
        Ok(tables.pending_view(&service))
    }

    async fn update_pending_service(
        &self,
        id: i64,
        changes: &PendingServiceChanges,
    ) -> AppResult<Option<PendingService>> {
        let mut tables = self.tables.lock().await;
        let Some(service) = tables.pending.get_mut(&id).filter(|s| s.status.is_open()) else {
            return Ok(None);
        };
        service.notes = changes.notes.clone();
        service.estimated_completion_time = changes.estimated_completion_time;
        service.updated_at = Utc::now();
        let service = service.clone();
        Ok(Some(tables.pending_view(&service)))
    }

    async fn transition_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        to: ServiceStatus,
        employee_id: Option<i64>,
    ) -> AppResult<Option<PendingService>> {
        let mut tables = self.tables.lock().await;
        if let Some(employee_id) = employee_id {
            if !tables.employees.contains_key(&employee_id) {
                return Err(missing_reference("changing pending service status"));
            }
        }
        let Some(service) = tables.pending.get_mut(&id).filter(|p| p.status == from) else {
            return Ok(None);
        };
        service.status = to;
        if employee_id.is_some() {
            service.employee_id = employee_id;
        }
        service.updated_at = Utc::now();
        let service = service.clone();
        Ok(Some(tables.pending_view(&service)))
    }

    async fn complete_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        completed_at: DateTime<Utc>,
        link: &NewRatingLink,
    ) -> AppResult<Option<(PendingService, RatingLink)>> {
        let mut tables = self.tables.lock().await;
        if tables.links.contains_key(&link.token) {
            return Err(AppError::Conflict("issuing rating link: duplicate value".to_string()));
        }
        let Some(service) = tables.pending.get_mut(&id).filter(|p| p.status == from) else {
            return Ok(None);
        };
        service.status = ServiceStatus::Completed;
        service.completed_at = Some(completed_at);
        service.updated_at = completed_at;
        let service = service.clone();

        if let Some(vehicle) = tables.vehicles.get_mut(&service.vehicle_id) {
            vehicle.last_service_date = Some(completed_at.date_naive());
            vehicle.updated_at = completed_at;
        }

        let rating_link = RatingLink {
            token: link.token.clone(),
            service_id: id,
            created_at: link.created_at,
            expires_at: link.expires_at,
            used_at: None,
        };
        tables.links.insert(rating_link.token.clone(), rating_link.clone());
        Ok(Some((tables.pending_view(&service), rating_link)))
    }

    async fn delete_pending_service(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.pending.remove(&id).is_none() {
            return Ok(false);
        }
        tables.links.retain(|_, link| link.service_id != id);
        tables.ratings.retain(|_, rating| rating.service_id != id);
        for usage in tables.usage.values_mut() {
            if usage.service_id == Some(id) {
                usage.service_id = None;
            }
        }
        Ok(true)
    }

    async fn list_completed_visits(&self, range: &ReportRange) -> AppResult<Vec<CompletedVisit>> {
        let tables = self.tables.lock().await;
        let mut visits: Vec<CompletedVisit> = tables
            .pending
            .values()
            .filter(|p| p.status == ServiceStatus::Completed)
            .filter_map(|p| {
                let completed_at = p.completed_at.filter(|at| range.contains(*at))?;
                let view = tables.pending_view(p);
                Some(CompletedVisit {
                    service_id: p.service_id,
                    service_type_name: view.service_type_name,
                    base_price: view.service_price,
                    license_plate: view.license_plate,
                    entry_time: p.entry_time,
                    completed_at,
                })
            })
            .collect();
        visits.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
        Ok(visits)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let tables = self.tables.lock().await;
        let mut items: Vec<InventoryItem> = tables.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn search_items(&self, term: &str) -> AppResult<Vec<InventoryItem>> {
        let term = normalize_term(term);
        let mut items = self.list_items().await?;
        items.retain(|i| {
            contains(&i.name, &term)
                || contains_opt(&i.description, &term)
                || contains(&i.category, &term)
        });
        Ok(items)
    }

    async fn list_items_by_category(&self, category: &str) -> AppResult<Vec<InventoryItem>> {
        let mut items = self.list_items().await?;
        items.retain(|i| i.category == category);
        Ok(items)
    }

    async fn list_item_categories(&self) -> AppResult<Vec<String>> {
        let tables = self.tables.lock().await;
        let mut categories: Vec<String> = tables.items.values().map(|i| i.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn list_low_stock(&self) -> AppResult<Vec<InventoryItem>> {
        let mut items = self.list_items().await?;
        items.retain(InventoryItem::is_low_stock);
        items.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn find_item(&self, id: i64) -> AppResult<Option<InventoryItem>> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn insert_item(&self, draft: &InventoryItemDraft) -> AppResult<InventoryItem> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let item = InventoryItem {
            item_id: tables.next_id(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            quantity: draft.quantity,
            unit: draft.unit.clone(),
            cost_price: draft.cost_price,
            selling_price: draft.selling_price,
            reorder_level: draft.reorder_level,
            created_at: now,
            updated_at: now,
        };
        tables.items.insert(item.item_id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: i64, draft: &InventoryItemDraft) -> AppResult<Option<InventoryItem>> {
        let mut tables = self.tables.lock().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        item.name = draft.name.clone();
        item.description = draft.description.clone();
        item.category = draft.category.clone();
        item.unit = draft.unit.clone();
        item.cost_price = draft.cost_price;
        item.selling_price = draft.selling_price;
        item.reorder_level = draft.reorder_level;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.items.contains_key(&id) {
            return Ok(false);
        }
        if tables.order_parts.values().any(|p| p.item_id == id) {
            return Err(AppError::Conflict(format!(
                "Inventory item {} is used by work orders",
                id
            )));
        }
        tables.items.remove(&id);
        tables.usage.retain(|_, usage| usage.item_id != id);
        Ok(true)
    }

    async fn adjust_quantity(&self, id: i64, delta: Decimal) -> AppResult<InventoryItem> {
        let mut tables = self.tables.lock().await;
        tables.move_stock(id, delta).map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Inventory item {} does not have enough stock for this operation",
                id
            )),
            other => other,
        })
    }

    async fn record_usage(&self, draft: &UsageDraft) -> AppResult<InventoryUsage> {
        let mut tables = self.tables.lock().await;
        if !tables.items.contains_key(&draft.item_id) {
            return Err(not_found_error("Inventory item", draft.item_id));
        }
        let service_missing = draft
            .service_id
            .map_or(false, |id| !tables.pending.contains_key(&id));
        let employee_missing = draft
            .employee_id
            .map_or(false, |id| !tables.employees.contains_key(&id));
        if service_missing || employee_missing {
            return Err(missing_reference("recording usage"));
        }
        tables.move_stock(draft.item_id, -draft.quantity).map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Inventory item {} does not have enough stock for this operation",
                draft.item_id
            )),
            other => other,
        })?;

        let usage = InventoryUsage {
            usage_id: tables.next_id(),
            item_id: draft.item_id,
            service_id: draft.service_id,
            employee_id: draft.employee_id,
            quantity: draft.quantity,
            usage_date: draft.usage_date,
            notes: draft.notes.clone(),
            created_at: Utc::now(),
            item_name: String::new(),
            employee_name: None,
            service_name: None,
        };
        tables.usage.insert(usage.usage_id, usage.clone());
        Ok(tables.usage_view(&usage))
    }

    async fn list_usage_for_item(&self, item_id: i64) -> AppResult<Vec<InventoryUsage>> {
        let mut usage = self.list_usage(i64::MAX).await?;
        usage.retain(|u| u.item_id == item_id);
        Ok(usage)
    }

    async fn list_usage(&self, limit: i64) -> AppResult<Vec<InventoryUsage>> {
        let tables = self.tables.lock().await;
        let mut usage: Vec<InventoryUsage> =
            tables.usage.values().map(|u| tables.usage_view(u)).collect();
        usage.sort_by(|a, b| {
            b.usage_date
                .cmp(&a.usage_date)
                .then_with(|| b.usage_id.cmp(&a.usage_id))
        });
        usage.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(usage)
    }
}

#[async_trait]
impl WorkOrderStore for MemoryStore {
    async fn list_work_orders(&self, filters: &WorkOrderFilters) -> AppResult<Vec<WorkOrder>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<WorkOrder> = tables
            .work_orders
            .values()
            .filter(|o| filters.status.map_or(true, |status| o.status == status))
            .map(|o| tables.work_order_view(o))
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_id.cmp(&a.order_id))
        });
        Ok(orders)
    }

    async fn list_work_orders_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<WorkOrder>> {
        let mut orders = self.list_work_orders(&WorkOrderFilters::default()).await?;
        orders.retain(|o| o.vehicle_id == vehicle_id);
        Ok(orders)
    }

    async fn find_work_order(&self, id: i64) -> AppResult<Option<WorkOrderDetail>> {
        Ok(self.tables.lock().await.work_order_detail(id))
    }

    async fn insert_work_order(&self, draft: &WorkOrderDraft) -> AppResult<WorkOrderDetail> {
        let mut tables = self.tables.lock().await;
        if !tables.vehicles.contains_key(&draft.vehicle_id) {
            return Err(missing_reference("creating work order"));
        }
        let now = Utc::now();
        let order = WorkOrder {
            order_id: tables.next_id(),
            vehicle_id: draft.vehicle_id,
            status: draft.status,
            start_date: draft.start_date,
            completion_date: draft.completion_date,
            total_cost: Decimal::ZERO,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
            make: String::new(),
            model: String::new(),
            license_plate: String::new(),
            customer_name: String::new(),
        };
        let id = order.order_id;
        tables.work_orders.insert(id, order);
        tables
            .work_order_detail(id)
            .ok_or_else(|| AppError::Internal(format!("work order {} vanished after insert", id)))
    }

    async fn update_work_order(
        &self,
        id: i64,
        expected: WorkOrderStatus,
        draft: &WorkOrderDraft,
    ) -> AppResult<Option<WorkOrderDetail>> {
        let mut tables = self.tables.lock().await;
        match tables.work_orders.get(&id) {
            Some(order) if order.status == expected => {}
            _ => return Ok(None),
        }
        if !tables.vehicles.contains_key(&draft.vehicle_id) {
            return Err(missing_reference("updating work order"));
        }
        if let Some(order) = tables.work_orders.get_mut(&id) {
            order.vehicle_id = draft.vehicle_id;
            order.status = draft.status;
            order.start_date = draft.start_date;
            order.completion_date = draft.completion_date;
            order.notes = draft.notes.clone();
            order.updated_at = Utc::now();
        }
        Ok(tables.work_order_detail(id))
    }

    async fn delete_work_order(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.work_orders.remove(&id).is_none() {
            return Ok(false);
        }
        let parts: Vec<OrderPartLine> = tables
            .order_parts
            .values()
            .filter(|p| p.order_id == id)
            .cloned()
            .collect();
        for part in parts {
            if let Some(item) = tables.items.get_mut(&part.item_id) {
                item.quantity += part.quantity;
                item.updated_at = Utc::now();
            }
        }
        tables.order_parts.retain(|_, p| p.order_id != id);
        tables.order_services.retain(|_, s| s.order_id != id);
        Ok(true)
    }

    async fn add_service_line(&self, order_id: i64, draft: &OrderServiceDraft) -> AppResult<WorkOrderDetail> {
        let mut tables = self.tables.lock().await;
        tables.open_order(order_id)?;
        if !tables.offers.contains_key(&draft.service_id) {
            return Err(missing_reference("adding service line"));
        }
        let line = OrderServiceLine {
            order_service_id: tables.next_id(),
            order_id,
            service_id: draft.service_id,
            price: draft.price,
            notes: draft.notes.clone(),
            name: String::new(),
        };
        tables.order_services.insert(line.order_service_id, line);
        tables.recompute_total(order_id);
        tables
            .work_order_detail(order_id)
            .ok_or_else(|| not_found_error("Work order", order_id))
    }

    async fn remove_service_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        let mut tables = self.tables.lock().await;
        tables.open_order(order_id)?;
        let belongs = tables
            .order_services
            .get(&line_id)
            .map_or(false, |line| line.order_id == order_id);
        if !belongs {
            return Err(not_found_error("Order service line", line_id));
        }
        tables.order_services.remove(&line_id);
        tables.recompute_total(order_id);
        tables
            .work_order_detail(order_id)
            .ok_or_else(|| not_found_error("Work order", order_id))
    }

    async fn add_part_line(&self, order_id: i64, draft: &OrderPartDraft) -> AppResult<WorkOrderDetail> {
        let mut tables = self.tables.lock().await;
        tables.open_order(order_id)?;
        tables.move_stock(draft.item_id, -draft.quantity)?;
        let line = OrderPartLine {
            order_part_id: tables.next_id(),
            order_id,
            item_id: draft.item_id,
            quantity: draft.quantity,
            price_per_unit: draft.price_per_unit,
            name: String::new(),
        };
        tables.order_parts.insert(line.order_part_id, line);
        tables.recompute_total(order_id);
        tables
            .work_order_detail(order_id)
            .ok_or_else(|| not_found_error("Work order", order_id))
    }

    async fn remove_part_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail> {
        let mut tables = self.tables.lock().await;
        tables.open_order(order_id)?;
        let Some(line) = tables
            .order_parts
            .get(&line_id)
            .filter(|line| line.order_id == order_id)
            .cloned()
        else {
            return Err(not_found_error("Order part line", line_id));
        };
        tables.order_parts.remove(&line_id);
        tables.move_stock(line.item_id, line.quantity)?;
        tables.recompute_total(order_id);
        tables
            .work_order_detail(order_id)
            .ok_or_else(|| not_found_error("Work order", order_id))
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn find_active_link(&self, service_id: i64, now: DateTime<Utc>) -> AppResult<Option<RatingLink>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .links
            .values()
            .filter(|link| link.service_id == service_id && link.state_at(now) == LinkState::Active)
            .max_by_key(|link| link.created_at)
            .cloned())
    }

    async fn insert_link(&self, service_id: i64, link: &NewRatingLink) -> AppResult<RatingLink> {
        let mut tables = self.tables.lock().await;
        if !tables.pending.contains_key(&service_id) {
            return Err(missing_reference("creating rating link"));
        }
        if tables.links.contains_key(&link.token) {
            return Err(AppError::Conflict("creating rating link: duplicate value".to_string()));
        }
        let rating_link = RatingLink {
            token: link.token.clone(),
            service_id,
            created_at: link.created_at,
            expires_at: link.expires_at,
            used_at: None,
        };
        tables.links.insert(rating_link.token.clone(), rating_link.clone());
        Ok(rating_link)
    }

    async fn find_link(&self, token: &str) -> AppResult<Option<RatingLink>> {
        Ok(self.tables.lock().await.links.get(token).cloned())
    }

    async fn link_validation(&self, token: &str) -> AppResult<Option<RatingLinkValidation>> {
        let tables = self.tables.lock().await;
        let validation = tables
            .links
            .get(token)
            .and_then(|link| tables.pending.get(&link.service_id))
            .and_then(|service| tables.vehicles.get(&service.vehicle_id).map(|v| (service, v)))
            .map(|(service, vehicle)| RatingLinkValidation {
                service_id: service.service_id,
                vehicle_make: vehicle.make.clone(),
                vehicle_model: vehicle.model.clone(),
                license_plate: vehicle.license_plate.clone(),
            });
        Ok(validation)
    }

    async fn submit_rating(
        &self,
        draft: &RatingDraft,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<ServiceRating> {
        let mut tables = self.tables.lock().await;
        if !tables.pending.contains_key(&draft.service_id) {
            return Err(missing_reference("submitting rating"));
        }
        if let Some(token) = token {
            let usable = tables.links.get(token).map_or(false, |link| {
                link.service_id == draft.service_id && link.state_at(now) == LinkState::Active
            });
            if !usable {
                return Err(AppError::Gone(
                    "Rating link is no longer valid for this service".to_string(),
                ));
            }
        }
        if tables.ratings.values().any(|r| r.service_id == draft.service_id) {
            return Err(AppError::Conflict(format!(
                "Service {} has already been rated",
                draft.service_id
            )));
        }
        for link in tables
            .links
            .values_mut()
            .filter(|link| link.service_id == draft.service_id && link.used_at.is_none())
        {
            link.used_at = Some(now);
        }
        let rating = ServiceRating {
            rating_id: tables.next_id(),
            service_id: draft.service_id,
            wait_time_rating: draft.wait_time_rating,
            staff_friendliness_rating: draft.staff_friendliness_rating,
            service_quality_rating: draft.service_quality_rating,
            customer_comment: draft.customer_comment.clone(),
            created_at: now,
        };
        tables.ratings.insert(rating.rating_id, rating.clone());
        Ok(rating)
    }

    async fn list_ratings(&self, service_id: i64) -> AppResult<Vec<ServiceRating>> {
        let tables = self.tables.lock().await;
        let mut ratings: Vec<ServiceRating> = tables
            .ratings
            .values()
            .filter(|r| r.service_id == service_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn rating_report(&self) -> AppResult<RatingReport> {
        let tables = self.tables.lock().await;
        let ratings: Vec<ServiceRating> = tables.ratings.values().cloned().collect();
        Ok(RatingReport::from_ratings(&ratings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn item_draft(quantity: &str, reorder_level: &str) -> InventoryItemDraft {
        InventoryItemDraft {
            name: "Shampoo".into(),
            description: None,
            category: "Limpieza".into(),
            quantity: dec(quantity),
            unit: "litros".into(),
            cost_price: dec("5.00"),
            selling_price: dec("8.00"),
            reorder_level: dec(reorder_level),
        }
    }

    async fn seed_vehicle(store: &MemoryStore, plate: &str) -> Vehicle {
        let customer = store
            .insert_customer(&CustomerDraft {
                name: "Juan Pérez".into(),
                email: None,
                phone: "5551234".into(),
                address: None,
            })
            .await
            .unwrap();
        store
            .insert_vehicle(&VehicleDraft {
                customer_id: customer.customer_id,
                make: "Toyota".into(),
                model: "Corolla".into(),
                year: 2020,
                license_plate: plate.into(),
                vin: None,
                color: None,
                last_service_date: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_plate_is_conflict() {
        let store = MemoryStore::new();
        let vehicle = seed_vehicle(&store, "ABC123").await;
        let mut draft = VehicleDraft::from(&vehicle);
        draft.license_plate = "ABC123".into();
        let result = store.insert_vehicle(&draft).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_customer_with_vehicles_cannot_be_deleted() {
        let store = MemoryStore::new();
        let vehicle = seed_vehicle(&store, "XYZ789").await;
        let result = store.delete_customer(vehicle.customer_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(vehicle.customer_name, "Juan Pérez");
    }

    #[tokio::test]
    async fn test_adjust_quantity_never_goes_negative() {
        let store = MemoryStore::new();
        let item = store.insert_item(&item_draft("10", "2")).await.unwrap();

        let lowered = store.adjust_quantity(item.item_id, dec("-5")).await.unwrap();
        assert_eq!(lowered.quantity, dec("5"));
        let restored = store.adjust_quantity(item.item_id, dec("5")).await.unwrap();
        assert_eq!(restored.quantity, dec("10"));

        let rejected = store.adjust_quantity(item.item_id, dec("-11")).await;
        assert!(matches!(rejected, Err(AppError::Conflict(_))));
        let unchanged = store.find_item(item.item_id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, dec("10"));

        let missing = store.adjust_quantity(9999, dec("1")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_usage_debits_and_logs_once() {
        let store = MemoryStore::new();
        let item = store.insert_item(&item_draft("10", "2")).await.unwrap();
        let draft = UsageDraft {
            item_id: item.item_id,
            service_id: None,
            employee_id: None,
            quantity: dec("3"),
            usage_date: Utc::now(),
            notes: None,
        };
        let usage = store.record_usage(&draft).await.unwrap();
        assert_eq!(usage.item_name, "Shampoo");

        let item = store.find_item(item.item_id).await.unwrap().unwrap();
        assert_eq!(item.quantity, dec("7"));
        assert_eq!(store.list_usage_for_item(item.item_id).await.unwrap().len(), 1);

        let too_much = UsageDraft {
            quantity: dec("8"),
            ..draft
        };
        assert!(matches!(
            store.record_usage(&too_much).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(store.list_usage(100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_low_stock_includes_threshold() {
        let store = MemoryStore::new();
        let at_threshold = store.insert_item(&item_draft("2", "2")).await.unwrap();
        let below = store.insert_item(&item_draft("1", "2")).await.unwrap();
        store.insert_item(&item_draft("3", "2")).await.unwrap();

        let low: Vec<i64> = store
            .list_low_stock()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.item_id)
            .collect();
        assert_eq!(low, vec![below.item_id, at_threshold.item_id]);
    }

    #[tokio::test]
    async fn test_complete_is_compare_and_swap() {
        let store = MemoryStore::new();
        let vehicle = seed_vehicle(&store, "CAS001").await;
        let offer = store
            .insert_offer(&ServiceOfferDraft {
                name: "Lavado Básico".into(),
                description: None,
                base_price: dec("100.00"),
                estimated_hours: Some(dec("1")),
                category_id: None,
            })
            .await
            .unwrap();
        let entry = Utc::now();
        let service = store
            .insert_pending_service(&PendingServiceDraft {
                vehicle_id: vehicle.vehicle_id,
                service_type_id: offer.service_id,
                employee_id: None,
                entry_time: entry,
                estimated_completion_time: entry + Duration::hours(1),
                status: ServiceStatus::Pending,
                notes: None,
            })
            .await
            .unwrap();

        let link = NewRatingLink {
            token: "token-1".into(),
            created_at: entry,
            expires_at: entry + Duration::hours(168),
        };
        let (done, issued) = store
            .complete_pending_service(service.service_id, ServiceStatus::Pending, entry, &link)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ServiceStatus::Completed);
        assert_eq!(issued.service_id, service.service_id);

        let again = NewRatingLink {
            token: "token-2".into(),
            ..link
        };
        let second = store
            .complete_pending_service(service.service_id, ServiceStatus::Pending, entry, &again)
            .await
            .unwrap();
        assert!(second.is_none());

        let vehicle = store.find_vehicle(vehicle.vehicle_id).await.unwrap().unwrap();
        assert_eq!(vehicle.last_service_date, Some(entry.date_naive()));

        let range = ReportRange {
            from: Some(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            to: None,
        };
        assert_eq!(store.list_completed_visits(&range).await.unwrap().len(), 1);

        let changes = PendingServiceChanges {
            notes: Some("tarde".into()),
            estimated_completion_time: entry + Duration::hours(2),
        };
        let edited = store.update_pending_service(service.service_id, &changes).await.unwrap();
        assert!(edited.is_none(), "completed visits are read-only");
    }

    #[tokio::test]
    async fn test_stale_work_order_write_is_rejected() {
        let store = MemoryStore::new();
        let vehicle = seed_vehicle(&store, "WO0001").await;
        let stale = store
            .insert_work_order(&WorkOrderDraft {
                vehicle_id: vehicle.vehicle_id,
                status: WorkOrderStatus::Pending,
                start_date: None,
                completion_date: None,
                notes: None,
            })
            .await
            .unwrap();
        let id = stale.order.order_id;
        let now = Utc::now();

        let completed = WorkOrderDraft::from(&stale.order).with_status(WorkOrderStatus::Completed, now);
        let done = store
            .update_work_order(id, WorkOrderStatus::Pending, &completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.order.status, WorkOrderStatus::Completed);

        let cancelled = WorkOrderDraft::from(&stale.order).with_status(WorkOrderStatus::Cancelled, now);
        let lost = store
            .update_work_order(id, WorkOrderStatus::Pending, &cancelled)
            .await
            .unwrap();
        assert!(lost.is_none());

        let current = store.find_work_order(id).await.unwrap().unwrap();
        assert_eq!(current.order.status, WorkOrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_tokenless_rating_closes_open_links() {
        let store = MemoryStore::new();
        let vehicle = seed_vehicle(&store, "RAT002").await;
        let offer = store
            .insert_offer(&ServiceOfferDraft {
                name: "Lavado Básico".into(),
                description: None,
                base_price: dec("100.00"),
                estimated_hours: None,
                category_id: None,
            })
            .await
            .unwrap();
        let now = Utc::now();
        let service = store
            .insert_pending_service(&PendingServiceDraft {
                vehicle_id: vehicle.vehicle_id,
                service_type_id: offer.service_id,
                employee_id: None,
                entry_time: now,
                estimated_completion_time: now + Duration::hours(1),
                status: ServiceStatus::Pending,
                notes: None,
            })
            .await
            .unwrap();
        let link = NewRatingLink {
            token: "token-open".into(),
            created_at: now,
            expires_at: now + Duration::hours(168),
        };
        store
            .complete_pending_service(service.service_id, ServiceStatus::Pending, now, &link)
            .await
            .unwrap()
            .unwrap();

        let draft = RatingDraft {
            service_id: service.service_id,
            wait_time_rating: 4,
            staff_friendliness_rating: 5,
            service_quality_rating: 4,
            customer_comment: None,
        };
        store.submit_rating(&draft, None, now).await.unwrap();

        let link = store.find_link("token-open").await.unwrap().unwrap();
        assert_eq!(link.state_at(now), LinkState::Used);
        assert!(store.find_active_link(service.service_id, now).await.unwrap().is_none());
    }
}
