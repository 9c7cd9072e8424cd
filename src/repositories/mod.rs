//! Capa de acceso a datos
//!
//! Cada recurso expone un trait de store. Las implementaciones PostgreSQL
//! viven en `*_repository.rs` (sobre `table::PgTable`), y `memory::MemoryStore`
//! implementa todos los traits en memoria para tests y desarrollo local.
//!
//! Las operaciones de varios pasos (consumo + descuento de existencia,
//! línea de orden + recálculo de total, calificación + consumo de token,
//! cierre de visita + emisión de enlace) son un único método del store y
//! se ejecutan de forma atómica.

pub mod customer_repository;
pub mod employee_repository;
pub mod inventory_repository;
pub mod memory;
pub mod pending_service_repository;
pub mod rating_repository;
pub mod service_offer_repository;
pub mod table;
pub mod vehicle_repository;
pub mod work_order_repository;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::customer::{Customer, CustomerDraft};
use crate::models::employee::{Employee, EmployeeDraft, EmployeeFilters};
use crate::models::inventory::{InventoryItem, InventoryItemDraft, InventoryUsage, UsageDraft};
use crate::models::pending_service::{
    PendingService, PendingServiceChanges, PendingServiceDraft, PendingServiceFilters,
    ServiceStatus,
};
use crate::models::rating::{
    NewRatingLink, RatingDraft, RatingLink, RatingLinkValidation, RatingReport, ServiceRating,
};
use crate::models::report::{CompletedVisit, ReportRange};
use crate::models::service_offer::{ServiceCategory, ServiceOffer, ServiceOfferDraft};
use crate::models::vehicle::{Vehicle, VehicleDraft};
use crate::models::work_order::{
    OrderPartDraft, OrderServiceDraft, WorkOrder, WorkOrderDetail, WorkOrderDraft,
    WorkOrderFilters, WorkOrderStatus,
};
use crate::utils::errors::AppResult;

pub use customer_repository::CustomerRepository;
pub use employee_repository::EmployeeRepository;
pub use inventory_repository::InventoryRepository;
pub use memory::MemoryStore;
pub use pending_service_repository::PendingServiceRepository;
pub use rating_repository::RatingRepository;
pub use service_offer_repository::ServiceOfferRepository;
pub use vehicle_repository::VehicleRepository;
pub use work_order_repository::WorkOrderRepository;

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list_customers(&self) -> AppResult<Vec<Customer>>;
    async fn search_customers(&self, term: &str) -> AppResult<Vec<Customer>>;
    async fn find_customer(&self, id: i64) -> AppResult<Option<Customer>>;
    async fn insert_customer(&self, draft: &CustomerDraft) -> AppResult<Customer>;
    async fn update_customer(&self, id: i64, draft: &CustomerDraft) -> AppResult<Option<Customer>>;
    async fn delete_customer(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;
    async fn search_vehicles(&self, term: &str) -> AppResult<Vec<Vehicle>>;
    async fn list_vehicles_by_customer(&self, customer_id: i64) -> AppResult<Vec<Vehicle>>;
    async fn find_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>>;
    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>>;
    async fn insert_vehicle(&self, draft: &VehicleDraft) -> AppResult<Vehicle>;
    async fn update_vehicle(&self, id: i64, draft: &VehicleDraft) -> AppResult<Option<Vehicle>>;
    async fn delete_vehicle(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn list_employees(&self, filters: &EmployeeFilters) -> AppResult<Vec<Employee>>;
    async fn find_employee(&self, id: i64) -> AppResult<Option<Employee>>;
    async fn insert_employee(&self, draft: &EmployeeDraft) -> AppResult<Employee>;
    async fn update_employee(&self, id: i64, draft: &EmployeeDraft) -> AppResult<Option<Employee>>;
    async fn delete_employee(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_offers(&self) -> AppResult<Vec<ServiceOffer>>;
    async fn list_offers_by_category(&self, category_id: i64) -> AppResult<Vec<ServiceOffer>>;
    async fn find_offer(&self, id: i64) -> AppResult<Option<ServiceOffer>>;
    async fn insert_offer(&self, draft: &ServiceOfferDraft) -> AppResult<ServiceOffer>;
    async fn update_offer(&self, id: i64, draft: &ServiceOfferDraft) -> AppResult<Option<ServiceOffer>>;
    async fn delete_offer(&self, id: i64) -> AppResult<bool>;
    async fn list_categories(&self) -> AppResult<Vec<ServiceCategory>>;
    async fn find_category(&self, id: i64) -> AppResult<Option<ServiceCategory>>;
    async fn insert_category(&self, name: &str, description: Option<&str>) -> AppResult<ServiceCategory>;
}

#[async_trait]
pub trait PendingServiceStore: Send + Sync {
    async fn list_pending_services(&self, filters: &PendingServiceFilters) -> AppResult<Vec<PendingService>>;
    async fn list_pending_services_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<PendingService>>;
    async fn find_pending_service(&self, id: i64) -> AppResult<Option<PendingService>>;
    async fn insert_pending_service(&self, draft: &PendingServiceDraft) -> AppResult<PendingService>;
    /// No toca visitas completadas; `None` si no existe o ya se completó
    async fn update_pending_service(
        &self,
        id: i64,
        changes: &PendingServiceChanges,
    ) -> AppResult<Option<PendingService>>;
    /// Cambia el estado sólo si sigue siendo `from`; `None` si otro request se adelantó
    async fn transition_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        to: ServiceStatus,
        employee_id: Option<i64>,
    ) -> AppResult<Option<PendingService>>;
    /// Completa la visita y emite su enlace de calificación en una transacción
    async fn complete_pending_service(
        &self,
        id: i64,
        from: ServiceStatus,
        completed_at: DateTime<Utc>,
        link: &NewRatingLink,
    ) -> AppResult<Option<(PendingService, RatingLink)>>;
    async fn delete_pending_service(&self, id: i64) -> AppResult<bool>;
    async fn list_completed_visits(&self, range: &ReportRange) -> AppResult<Vec<CompletedVisit>>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_items(&self) -> AppResult<Vec<InventoryItem>>;
    async fn search_items(&self, term: &str) -> AppResult<Vec<InventoryItem>>;
    async fn list_items_by_category(&self, category: &str) -> AppResult<Vec<InventoryItem>>;
    async fn list_item_categories(&self) -> AppResult<Vec<String>>;
    async fn list_low_stock(&self) -> AppResult<Vec<InventoryItem>>;
    async fn find_item(&self, id: i64) -> AppResult<Option<InventoryItem>>;
    async fn insert_item(&self, draft: &InventoryItemDraft) -> AppResult<InventoryItem>;
    /// Actualiza todo salvo la cantidad, que sólo cambia por ajustes y consumos
    async fn update_item(&self, id: i64, draft: &InventoryItemDraft) -> AppResult<Option<InventoryItem>>;
    async fn delete_item(&self, id: i64) -> AppResult<bool>;
    /// `quantity += delta`; rechaza resultados negativos sin aplicar nada
    async fn adjust_quantity(&self, id: i64, delta: Decimal) -> AppResult<InventoryItem>;
    /// Descuenta la existencia y agrega la fila de consumo en una transacción
    async fn record_usage(&self, draft: &UsageDraft) -> AppResult<InventoryUsage>;
    async fn list_usage_for_item(&self, item_id: i64) -> AppResult<Vec<InventoryUsage>>;
    async fn list_usage(&self, limit: i64) -> AppResult<Vec<InventoryUsage>>;
}

#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn list_work_orders(&self, filters: &WorkOrderFilters) -> AppResult<Vec<WorkOrder>>;
    async fn list_work_orders_by_vehicle(&self, vehicle_id: i64) -> AppResult<Vec<WorkOrder>>;
    async fn find_work_order(&self, id: i64) -> AppResult<Option<WorkOrderDetail>>;
    async fn insert_work_order(&self, draft: &WorkOrderDraft) -> AppResult<WorkOrderDetail>;
    /// Escribe sólo si el estado sigue siendo `expected`; `None` si no existe o cambió
    async fn update_work_order(
        &self,
        id: i64,
        expected: WorkOrderStatus,
        draft: &WorkOrderDraft,
    ) -> AppResult<Option<WorkOrderDetail>>;
    /// Borra la orden devolviendo sus repuestos al inventario
    async fn delete_work_order(&self, id: i64) -> AppResult<bool>;
    async fn add_service_line(&self, order_id: i64, draft: &OrderServiceDraft) -> AppResult<WorkOrderDetail>;
    async fn remove_service_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail>;
    async fn add_part_line(&self, order_id: i64, draft: &OrderPartDraft) -> AppResult<WorkOrderDetail>;
    async fn remove_part_line(&self, order_id: i64, line_id: i64) -> AppResult<WorkOrderDetail>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn find_active_link(&self, service_id: i64, now: DateTime<Utc>) -> AppResult<Option<RatingLink>>;
    async fn insert_link(&self, service_id: i64, link: &NewRatingLink) -> AppResult<RatingLink>;
    async fn find_link(&self, token: &str) -> AppResult<Option<RatingLink>>;
    async fn link_validation(&self, token: &str) -> AppResult<Option<RatingLinkValidation>>;
    /// Inserta la calificación y, en la misma transacción, da por usados todos
    /// los enlaces abiertos de la visita. Si viene token debe estar vigente.
    async fn submit_rating(
        &self,
        draft: &RatingDraft,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<ServiceRating>;
    async fn list_ratings(&self, service_id: i64) -> AppResult<Vec<ServiceRating>>;
    async fn rating_report(&self) -> AppResult<RatingReport>;
}

/// Conjunto de stores que comparten los controllers
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn CustomerStore>,
    pub vehicles: Arc<dyn VehicleStore>,
    pub employees: Arc<dyn EmployeeStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub pending_services: Arc<dyn PendingServiceStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub work_orders: Arc<dyn WorkOrderStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub backend: &'static str,
}

impl Stores {
    /// Stores respaldados por PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            vehicles: Arc::new(VehicleRepository::new(pool.clone())),
            employees: Arc::new(EmployeeRepository::new(pool.clone())),
            catalog: Arc::new(ServiceOfferRepository::new(pool.clone())),
            pending_services: Arc::new(PendingServiceRepository::new(pool.clone())),
            inventory: Arc::new(InventoryRepository::new(pool.clone())),
            work_orders: Arc::new(WorkOrderRepository::new(pool.clone())),
            ratings: Arc::new(RatingRepository::new(pool)),
            backend: "postgres",
        }
    }

    /// Todos los stores sobre un único `MemoryStore`
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            customers: store.clone(),
            vehicles: store.clone(),
            employees: store.clone(),
            catalog: store.clone(),
            pending_services: store.clone(),
            inventory: store.clone(),
            work_orders: store.clone(),
            ratings: store,
            backend: "memory",
        }
    }
}
