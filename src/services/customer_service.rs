// src/services/customer_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, VisitRepository},
    models::customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload},
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    visit_repo: VisitRepository,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, visit_repo: VisitRepository) -> Self {
        Self { repo, visit_repo }
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_active(executor).await
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        acting_user: Uuid,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = self.repo.create(executor, acting_user, payload).await?;
        tracing::info!(customer_id = %customer.id, shop_name = %customer.shop_name, "Customer created");
        Ok(customer)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update(executor, id, payload)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    // Clientes com relatórios de visita não podem ser apagados
    pub async fn delete<'e, A>(&self, executor: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let visits = self.visit_repo.count_by_customer(&mut *tx, id).await?;
        if visits > 0 {
            return Err(AppError::CustomerHasVisits);
        }

        let deleted = self.repo.delete(&mut *tx, id).await?;
        if deleted == 0 {
            return Err(AppError::CustomerNotFound);
        }

        tx.commit().await?;
        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(())
    }
}
