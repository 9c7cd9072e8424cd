use tracing::info;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::vehicle::{Vehicle, VehicleDraft, VehicleHistory};
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, missing_reference, not_found_error, AppResult};

pub struct VehicleController {
    stores: Stores,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    /// El dueño debe existir y la matrícula no puede pertenecer a otro vehículo
    async fn check_draft(&self, draft: &VehicleDraft, vehicle_id: Option<i64>) -> AppResult<()> {
        if self
            .stores
            .customers
            .find_customer(draft.customer_id)
            .await?
            .is_none()
        {
            return Err(missing_reference("Customer", draft.customer_id));
        }
        if let Some(existing) = self
            .stores
            .vehicles
            .find_vehicle_by_plate(&draft.license_plate)
            .await?
        {
            if Some(existing.vehicle_id) != vehicle_id {
                return Err(conflict_error("Vehicle", "license_plate", &draft.license_plate));
            }
        }
        Ok(())
    }

    pub async fn list(&self, term: Option<&str>) -> AppResult<Vec<Vehicle>> {
        match term {
            Some(term) => self.stores.vehicles.search_vehicles(term).await,
            None => self.stores.vehicles.list_vehicles().await,
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Vehicle> {
        self.stores
            .vehicles
            .find_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn list_by_customer(&self, customer_id: i64) -> AppResult<Vec<Vehicle>> {
        if self
            .stores
            .customers
            .find_customer(customer_id)
            .await?
            .is_none()
        {
            return Err(not_found_error("Customer", customer_id));
        }
        self.stores.vehicles.list_vehicles_by_customer(customer_id).await
    }

    pub async fn history(&self, id: i64) -> AppResult<VehicleHistory> {
        let vehicle = self.get(id).await?;
        let services = self
            .stores
            .pending_services
            .list_pending_services_by_vehicle(id)
            .await?;
        let work_orders = self.stores.work_orders.list_work_orders_by_vehicle(id).await?;
        Ok(VehicleHistory {
            vehicle,
            services,
            work_orders,
        })
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;
        let draft = VehicleDraft::from(request);
        self.check_draft(&draft, None).await?;

        let vehicle = self.stores.vehicles.insert_vehicle(&draft).await?;
        info!(
            "🚗 Vehículo {} registrado ({} {})",
            vehicle.license_plate, vehicle.make, vehicle.model
        );
        Ok(vehicle)
    }

    pub async fn update(&self, id: i64, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;
        let current = self.get(id).await?;
        let draft = request.apply(VehicleDraft::from(&current));
        self.check_draft(&draft, Some(id)).await?;

        self.stores
            .vehicles
            .update_vehicle(id, &draft)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.vehicles.delete_vehicle(id).await? {
            return Err(not_found_error("Vehicle", id));
        }
        info!("🗑️ Vehículo {} eliminado", id);
        Ok(())
    }
}
