// src/services/visit_service.rs

use async_trait::async_trait;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::VisitRepository,
    models::visit::{SaveVisitPayload, UpdateVisitPayload, Visit, VisitDraft, VisitFilter, VisitRecord},
    services::{
        checklist::{evaluate_checklist, missing_required_fields},
        lifecycle::VisitStore,
        scoring::compute_score,
    },
};

/// Regras aplicadas a toda gravação vinda de fora.
///
/// Rascunhos nunca carregam pontuação. Relatórios finais precisam dos campos
/// obrigatórios e do checklist completo; a pontuação é sempre recalculada aqui,
/// qualquer valor enviado pelo cliente é ignorado.
pub fn prepare_record(draft: VisitDraft, is_draft: bool) -> Result<VisitRecord, AppError> {
    draft.validate()?;

    if draft.customer_id.is_none() {
        return Err(AppError::CustomerRequired);
    }

    if is_draft {
        return Ok(VisitRecord::draft(draft));
    }

    let missing = missing_required_fields(&draft);
    if !missing.is_empty() {
        return Err(AppError::MissingRequiredFields(missing));
    }

    let checklist = evaluate_checklist(&draft);
    if !checklist.all_pass {
        return Err(AppError::ChecklistIncomplete(checklist));
    }

    let score = compute_score(&draft);
    Ok(VisitRecord::finalized(draft, score))
}

#[derive(Clone)]
pub struct VisitService {
    repo: VisitRepository,
}

impl VisitService {
    pub fn new(repo: VisitRepository) -> Self {
        Self { repo }
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &VisitFilter) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, filter).await
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::VisitNotFound)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        acting_user: Uuid,
        payload: SaveVisitPayload,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = prepare_record(payload.draft, payload.is_draft)?;
        let visit = self.repo.insert(executor, acting_user, &record).await?;

        tracing::info!(
            visit_id = %visit.id,
            user_id = %acting_user,
            is_draft = visit.is_draft,
            "Visit report created"
        );
        Ok(visit)
    }

    /// Atualização parcial: as chaves enviadas são sobrepostas à linha gravada,
    /// já travada, e o resultado passa pelas mesmas regras de `prepare_record`.
    pub async fn update<'e, A>(
        &self,
        executor: A,
        id: Uuid,
        payload: UpdateVisitPayload,
    ) -> Result<Visit, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let UpdateVisitPayload { is_draft, fields } = payload;

        self.update_locked(executor, id, |existing| {
            let draft = existing.draft.merged_with(fields)?;
            prepare_record(draft, is_draft.unwrap_or(existing.is_draft))
        })
        .await
    }

    // Relatórios finalizados são imutáveis: trava a linha e confere antes de gravar
    async fn update_locked<'e, A, F>(&self, executor: A, id: Uuid, build: F) -> Result<Visit, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
        F: FnOnce(&Visit) -> Result<VisitRecord, AppError>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::VisitNotFound)?;

        if !existing.is_draft {
            return Err(AppError::VisitFinalized);
        }

        let record = build(&existing)?;

        let visit = self
            .repo
            .update(&mut *tx, id, &record)
            .await?
            .ok_or(AppError::VisitNotFound)?;

        tx.commit().await?;

        if !visit.is_draft {
            tracing::info!(visit_id = %id, score = ?visit.calculated_score, "Visit report finalized");
        }
        Ok(visit)
    }

    pub async fn delete<'e, A>(&self, executor: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let existing = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::VisitNotFound)?;

        if !existing.is_draft {
            return Err(AppError::VisitFinalized);
        }

        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, "Visit report draft deleted");
        Ok(())
    }
}

/// `VisitStore` sobre o Postgres, passando pelas mesmas regras da API REST.
#[derive(Clone)]
pub struct PgVisitStore {
    pool: PgPool,
    service: VisitService,
}

impl PgVisitStore {
    pub fn new(pool: PgPool, service: VisitService) -> Self {
        Self { pool, service }
    }
}

#[async_trait]
impl VisitStore for PgVisitStore {
    async fn create(&self, acting_user: Uuid, record: &VisitRecord) -> Result<Visit, AppError> {
        let payload = SaveVisitPayload {
            draft: record.draft.clone(),
            is_draft: record.is_draft(),
        };
        self.service.create(&self.pool, acting_user, payload).await
    }

    async fn update(&self, id: Uuid, record: &VisitRecord) -> Result<Visit, AppError> {
        self.service
            .update_locked(&self.pool, id, |_| {
                prepare_record(record.draft.clone(), record.is_draft())
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.service.delete(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::models::{
        customer::ShopType,
        visit::{CommercialOutcome, PriorityLevel},
    };

    fn final_ready_draft() -> VisitDraft {
        VisitDraft {
            customer_id: Some(Uuid::new_v4()),
            shop_name: "Acme Grow".into(),
            shop_type: Some(ShopType::Growshop),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 14),
            visit_purpose: "routine_check".into(),
            product_visibility_score: 50,
            commercial_outcome: Some(CommercialOutcome::InformationOnly),
            overall_satisfaction: 6,
            visit_photos: vec!["https://cdn.example/shelf.jpg".into()],
            signature: Some("data:image/png;base64,AAAA".into()),
            signature_signer_name: Some("Jane Doe".into()),
            signature_date: Some(Utc::now()),
            ..Default::default()
        }
    }

    #[test]
    fn drafts_never_carry_a_score() {
        let record = prepare_record(final_ready_draft(), true).unwrap();
        assert!(record.is_draft());
        assert!(record.score.is_none());
    }

    #[test]
    fn final_submission_recomputes_score() {
        let record = prepare_record(final_ready_draft(), false).unwrap();
        let score = record.score.unwrap();
        // 15 + 0 + 5 + 15
        assert!((score.calculated_score - 35.0).abs() < 1e-9);
        assert_eq!(score.priority_level, PriorityLevel::High);
    }

    #[test]
    fn customer_is_required_even_for_drafts() {
        let draft = VisitDraft {
            customer_id: None,
            ..final_ready_draft()
        };
        assert!(matches!(
            prepare_record(draft, true),
            Err(AppError::CustomerRequired)
        ));
    }

    #[test]
    fn final_submission_lists_missing_fields() {
        let draft = VisitDraft {
            shop_type: None,
            visit_purpose: String::new(),
            ..final_ready_draft()
        };
        match prepare_record(draft, false) {
            Err(AppError::MissingRequiredFields(fields)) => {
                assert_eq!(fields, vec!["shop_type", "visit_purpose"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn final_submission_requires_checklist() {
        let draft = VisitDraft {
            visit_photos: Vec::new(),
            ..final_ready_draft()
        };
        match prepare_record(draft, false) {
            Err(AppError::ChecklistIncomplete(checklist)) => {
                assert!(!checklist.photos_attached);
                assert!(checklist.signature_attached);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn partial_body_is_merged_before_the_rules_run() {
        let stored = final_ready_draft();
        let payload: UpdateVisitPayload = serde_json::from_value(serde_json::json!({
            "customer_id": stored.customer_id,
            "notes": "only notes changed"
        }))
        .unwrap();

        let draft = stored.merged_with(payload.fields).unwrap();
        let record = prepare_record(draft, payload.is_draft.unwrap_or(true)).unwrap();

        assert_eq!(record.draft.notes, "only notes changed");
        assert_eq!(record.draft.shop_name, "Acme Grow");
        assert_eq!(record.draft.visit_photos, stored.visit_photos);
        assert_eq!(record.draft.visit_date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(record.draft.overall_satisfaction, 6);
        assert_eq!(record.draft.signature, stored.signature);
    }

    #[test]
    fn partial_body_finalizing_an_incomplete_draft_is_rejected() {
        let stored = VisitDraft {
            signature: None,
            ..final_ready_draft()
        };
        let payload: UpdateVisitPayload =
            serde_json::from_value(serde_json::json!({ "is_draft": false })).unwrap();

        let draft = stored.merged_with(payload.fields).unwrap();
        assert!(matches!(
            prepare_record(draft, payload.is_draft.unwrap_or(true)),
            Err(AppError::ChecklistIncomplete(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let draft = VisitDraft {
            product_visibility_score: 140,
            ..final_ready_draft()
        };
        assert!(matches!(
            prepare_record(draft, true),
            Err(AppError::ValidationError(_))
        ));
    }
}
