// src/db/visit_repo.rs

use sqlx::{postgres::PgArguments, query::QueryAs, types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::visit::{Visit, VisitFilter, VisitRecord},
};

// Os parâmetros $1..$37 seguem a ordem de `bind_record`
const INSERT_VISIT: &str = r#"
    INSERT INTO shop_visits (
        customer_id, shop_name, shop_type, shop_address, zipcode, city, county,
        contact_person, contact_phone, contact_email, job_title, gps_coordinates,
        visit_date, visit_duration, visit_purpose,
        product_visibility_score, products_discussed, competitor_presence,
        training_provided, training_topics,
        support_materials_required, support_materials_items, support_materials_other_text,
        sales_data, commercial_outcome, order_value, overall_satisfaction,
        follow_up_required, follow_up_notes, notes, visit_photos,
        signature, signature_signer_name, signature_date,
        is_draft, calculated_score, priority_level,
        draft_saved_at, created_by
    )
    VALUES (
        $1, $2, $3, $4, $5, $6, $7,
        $8, $9, $10, $11, $12,
        $13, $14, $15,
        $16, $17, $18,
        $19, $20,
        $21, $22, $23,
        $24, $25, $26, $27,
        $28, $29, $30, $31,
        $32, $33, $34,
        $35, $36, $37,
        CASE WHEN $35 THEN NOW() END, $38
    )
    RETURNING *
"#;

const UPDATE_VISIT: &str = r#"
    UPDATE shop_visits SET
        customer_id = $1, shop_name = $2, shop_type = $3, shop_address = $4,
        zipcode = $5, city = $6, county = $7,
        contact_person = $8, contact_phone = $9, contact_email = $10,
        job_title = $11, gps_coordinates = $12,
        visit_date = $13, visit_duration = $14, visit_purpose = $15,
        product_visibility_score = $16, products_discussed = $17, competitor_presence = $18,
        training_provided = $19, training_topics = $20,
        support_materials_required = $21, support_materials_items = $22,
        support_materials_other_text = $23,
        sales_data = $24, commercial_outcome = $25, order_value = $26,
        overall_satisfaction = $27,
        follow_up_required = $28, follow_up_notes = $29, notes = $30, visit_photos = $31,
        signature = $32, signature_signer_name = $33, signature_date = $34,
        is_draft = $35, calculated_score = $36, priority_level = $37,
        draft_saved_at = CASE WHEN $35 THEN NOW() END,
        updated_at = NOW()
    WHERE id = $38
    RETURNING *
"#;

fn bind_record<'q>(
    query: QueryAs<'q, Postgres, Visit, PgArguments>,
    record: &'q VisitRecord,
) -> QueryAs<'q, Postgres, Visit, PgArguments> {
    let d = &record.draft;
    let score = record.score.as_ref();

    query
        .bind(d.customer_id)
        .bind(&d.shop_name)
        .bind(d.shop_type)
        .bind(&d.shop_address)
        .bind(&d.zipcode)
        .bind(&d.city)
        .bind(&d.county)
        .bind(&d.contact_person)
        .bind(&d.contact_phone)
        .bind(&d.contact_email)
        .bind(&d.job_title)
        .bind(&d.gps_coordinates)
        .bind(d.visit_date)
        .bind(d.visit_duration)
        .bind(&d.visit_purpose)
        .bind(d.product_visibility_score)
        .bind(&d.products_discussed)
        .bind(&d.competitor_presence)
        .bind(d.training_provided)
        .bind(&d.training_topics)
        .bind(d.support_materials_required)
        .bind(&d.support_materials_items)
        .bind(&d.support_materials_other_text)
        .bind(Json(&d.sales_data))
        .bind(d.commercial_outcome)
        .bind(d.order_value)
        .bind(d.overall_satisfaction)
        .bind(d.follow_up_required)
        .bind(&d.follow_up_notes)
        .bind(&d.notes)
        .bind(&d.visit_photos)
        .bind(&d.signature)
        .bind(&d.signature_signer_name)
        .bind(d.signature_date)
        .bind(record.is_draft())
        .bind(score.map(|s| s.calculated_score))
        .bind(score.map(|s| s.priority_level))
}

// FK de customer_id quebrada = cliente inexistente
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::CustomerNotFound;
        }
    }
    e.into()
}

// Sem pool próprio: toda chamada recebe o executor (pool ou transação)
#[derive(Clone, Default)]
pub struct VisitRepository;

impl VisitRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        record: &VisitRecord,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = bind_record(sqlx::query_as::<_, Visit>(INSERT_VISIT), record)
            .bind(created_by)
            .fetch_one(executor)
            .await
            .map_err(map_write_error)?;

        Ok(visit)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        record: &VisitRecord,
    ) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = bind_record(sqlx::query_as::<_, Visit>(UPDATE_VISIT), record)
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_write_error)?;

        Ok(visit)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            SELECT v.*, c.shop_name AS customer_shop_name
            FROM shop_visits v
            LEFT JOIN customers c ON c.id = v.customer_id
            WHERE v.id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(visit)
    }

    /// Mesma busca, mas trava a linha até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = sqlx::query_as::<_, Visit>("SELECT * FROM shop_visits WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(visit)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &VisitFilter) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT v.*, c.shop_name AS customer_shop_name
            FROM shop_visits v
            LEFT JOIN customers c ON c.id = v.customer_id
            WHERE ($1::uuid IS NULL OR v.customer_id = $1)
              AND ($2::shop_type IS NULL OR v.shop_type = $2)
              AND ($3::priority_level IS NULL OR v.priority_level = $3)
              AND ($4::boolean IS NULL OR v.follow_up_required = $4)
              AND ($5::date IS NULL OR v.visit_date >= $5)
              AND ($6::date IS NULL OR v.visit_date <= $6)
              AND ($7::boolean IS NULL OR v.is_draft = $7)
            ORDER BY v.created_at DESC
            LIMIT $8 OFFSET $9
            "#,
        )
            .bind(filter.customer_id)
            .bind(filter.shop_type)
            .bind(filter.priority)
            .bind(filter.follow_up.and_then(|f| f.as_flag()))
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(filter.is_draft)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(executor)
            .await?;

        Ok(visits)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM shop_visits WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_customer<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop_visits WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
