use tracing::info;
use validator::Validate;

use crate::dto::customer_dto::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::models::customer::{Customer, CustomerDraft};
use crate::models::vehicle::Vehicle;
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct CustomerController {
    stores: Stores,
}

impl CustomerController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    pub async fn list(&self, term: Option<&str>) -> AppResult<Vec<Customer>> {
        match term {
            Some(term) => self.stores.customers.search_customers(term).await,
            None => self.stores.customers.list_customers().await,
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Customer> {
        self.stores
            .customers
            .find_customer(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", id))
    }

    pub async fn vehicles(&self, id: i64) -> AppResult<Vec<Vehicle>> {
        self.get(id).await?;
        self.stores.vehicles.list_vehicles_by_customer(id).await
    }

    pub async fn create(&self, request: CreateCustomerRequest) -> AppResult<Customer> {
        request.validate()?;
        let customer = self
            .stores
            .customers
            .insert_customer(&CustomerDraft::from(request))
            .await?;
        info!("👤 Cliente {} registrado: {}", customer.customer_id, customer.name);
        Ok(customer)
    }

    pub async fn update(&self, id: i64, request: UpdateCustomerRequest) -> AppResult<Customer> {
        request.validate()?;
        let current = self.get(id).await?;
        let draft = request.apply(CustomerDraft::from(&current));
        self.stores
            .customers
            .update_customer(id, &draft)
            .await?
            .ok_or_else(|| not_found_error("Customer", id))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.customers.delete_customer(id).await? {
            return Err(not_found_error("Customer", id));
        }
        info!("🗑️ Cliente {} eliminado", id);
        Ok(())
    }
}
