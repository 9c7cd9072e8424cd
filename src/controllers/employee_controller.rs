use tracing::info;
use validator::Validate;

use crate::dto::employee_dto::{CreateEmployeeRequest, UpdateEmployeeRequest};
use crate::models::employee::{Employee, EmployeeDraft, EmployeeFilters, EmployeeStatus};
use crate::repositories::Stores;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub struct EmployeeController {
    stores: Stores,
}

impl EmployeeController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
        }
    }

    pub async fn list(&self, filters: &EmployeeFilters) -> AppResult<Vec<Employee>> {
        self.stores.employees.list_employees(filters).await
    }

    pub async fn active(&self) -> AppResult<Vec<Employee>> {
        let filters = EmployeeFilters {
            q: None,
            status: Some(EmployeeStatus::Active),
        };
        self.stores.employees.list_employees(&filters).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Employee> {
        self.stores
            .employees
            .find_employee(id)
            .await?
            .ok_or_else(|| not_found_error("Employee", id))
    }

    pub async fn create(&self, request: CreateEmployeeRequest) -> AppResult<Employee> {
        request.validate()?;
        let employee = self
            .stores
            .employees
            .insert_employee(&EmployeeDraft::from(request))
            .await?;
        info!("👷 Empleado {} registrado: {}", employee.employee_id, employee.name);
        Ok(employee)
    }

    pub async fn update(&self, id: i64, request: UpdateEmployeeRequest) -> AppResult<Employee> {
        request.validate()?;
        let current = self.get(id).await?;
        let draft = request.apply(EmployeeDraft::from(&current));
        self.save(id, &draft).await
    }

    pub async fn set_status(&self, id: i64, status: EmployeeStatus) -> AppResult<Employee> {
        let current = self.get(id).await?;
        let mut draft = EmployeeDraft::from(&current);
        draft.status = status;
        let employee = self.save(id, &draft).await?;
        info!("👷 Empleado {} ahora está {:?}", id, status);
        Ok(employee)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.stores.employees.delete_employee(id).await? {
            return Err(not_found_error("Employee", id));
        }
        info!("🗑️ Empleado {} eliminado", id);
        Ok(())
    }

    async fn save(&self, id: i64, draft: &EmployeeDraft) -> AppResult<Employee> {
        self.stores
            .employees
            .update_employee(id, draft)
            .await?
            .ok_or_else(|| not_found_error("Employee", id))
    }
}
