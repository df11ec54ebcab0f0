// src/db/customer_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload},
    services::lifecycle::CustomerDirectory,
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clientes ativos em ordem alfabética (o select do formulário usa essa ordem).
    pub async fn list_active<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE status = 'active' ORDER BY shop_name ASC",
        )
            .fetch_all(executor)
            .await?;
        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                shop_name, shop_type, shop_address, zipcode, city, county,
                contact_person, contact_phone, contact_email, job_title,
                region, gps_coordinates, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
            .bind(&payload.shop_name)
            .bind(payload.shop_type)
            .bind(&payload.shop_address)
            .bind(&payload.zipcode)
            .bind(&payload.city)
            .bind(&payload.county)
            .bind(&payload.contact_person)
            .bind(&payload.contact_phone)
            .bind(&payload.contact_email)
            .bind(&payload.job_title)
            .bind(&payload.region)
            .bind(&payload.gps_coordinates)
            .bind(payload.status)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(customer)
    }

    // Campos ausentes mantêm o valor atual
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                shop_name = COALESCE($2, shop_name),
                shop_type = COALESCE($3, shop_type),
                shop_address = COALESCE($4, shop_address),
                zipcode = COALESCE($5, zipcode),
                city = COALESCE($6, city),
                county = COALESCE($7, county),
                contact_person = COALESCE($8, contact_person),
                contact_phone = COALESCE($9, contact_phone),
                contact_email = COALESCE($10, contact_email),
                job_title = COALESCE($11, job_title),
                region = COALESCE($12, region),
                gps_coordinates = COALESCE($13, gps_coordinates),
                status = COALESCE($14, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(&payload.shop_name)
            .bind(payload.shop_type)
            .bind(&payload.shop_address)
            .bind(&payload.zipcode)
            .bind(&payload.city)
            .bind(&payload.county)
            .bind(&payload.contact_person)
            .bind(&payload.contact_phone)
            .bind(&payload.contact_email)
            .bind(&payload.job_title)
            .bind(&payload.region)
            .bind(&payload.gps_coordinates)
            .bind(payload.status)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                // Visitas ainda apontam para o cliente
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::CustomerHasVisits;
                    }
                }
                e.into()
            })?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CustomerDirectory for CustomerRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        self.find_by_id(&self.pool, id).await
    }
}
