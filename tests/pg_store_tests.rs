// Adaptadores Postgres do ciclo de vida (PgVisitStore, CustomerRepository).
// Rodar com: DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use visit_report::{
    common::error::{AppError, LifecycleError},
    db::{CustomerRepository, UserRepository, VisitRepository},
    models::{
        auth::UserRole,
        customer::{CreateCustomerPayload, Customer, RecordStatus, ShopType},
        visit::{
            CommercialOutcome, DraftPatch, PriorityLevel, SaveVisitPayload, UpdateVisitPayload,
            VisitDraft,
        },
    },
    services::{
        lifecycle::{LifecyclePhase, SessionOptions, VisitReportSession},
        visit_service::{PgVisitStore, VisitService},
    },
};

// --- Fixtures ---

async fn seed(pool: &PgPool) -> (Uuid, Customer) {
    let user = UserRepository::new(pool.clone())
        .create_user(pool, "rep@canna.com", "not-a-real-hash", "Sales Rep", UserRole::User)
        .await
        .unwrap();

    let customer = CustomerRepository::new(pool.clone())
        .create(
            pool,
            user.id,
            &CreateCustomerPayload {
                shop_name: "Acme Grow".into(),
                shop_type: ShopType::Growshop,
                shop_address: Some("12 Harbour Street".into()),
                zipcode: Some("20095".into()),
                city: Some("Hamburg".into()),
                county: None,
                contact_person: Some("Jane Doe".into()),
                contact_phone: None,
                contact_email: Some("jane@acmegrow.com".into()),
                job_title: Some("Owner".into()),
                region: None,
                gps_coordinates: None,
                status: RecordStatus::Active,
            },
        )
        .await
        .unwrap();

    (user.id, customer)
}

fn services(pool: &PgPool) -> (VisitService, Arc<PgVisitStore>, CustomerRepository) {
    let service = VisitService::new(VisitRepository::new());
    let store = Arc::new(PgVisitStore::new(pool.clone(), service.clone()));
    (service, store, CustomerRepository::new(pool.clone()))
}

// Visibilidade 50, sem treinamento, só informação, satisfação 6 => 35 (alta prioridade)
fn ready_patch() -> DraftPatch {
    DraftPatch {
        visit_purpose: Some("routine_check".into()),
        product_visibility_score: Some(50),
        commercial_outcome: Some(Some(CommercialOutcome::InformationOnly)),
        overall_satisfaction: Some(6),
        visit_photos: Some(vec!["https://cdn.example/shelf.jpg".into()]),
        signature: Some(Some("data:image/png;base64,AAAA".into())),
        signature_signer_name: Some(Some("Jane Doe".into())),
        signature_date: Some(Some(Utc::now())),
        ..Default::default()
    }
}

// --- Testes ---

#[sqlx::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn session_drafts_and_submits_through_postgres(pool: PgPool) {
    let (user_id, customer) = seed(&pool).await;
    let (service, store, directory) = services(&pool);
    let session = VisitReportSession::new(store, user_id, SessionOptions::default());

    session.select_customer(&directory, customer.id).await.unwrap();
    assert_eq!(session.advance_section(0).await.unwrap(), 1);
    let id = session.visit_id().unwrap();

    let stored = service.get(&pool, id).await.unwrap();
    assert!(stored.is_draft);
    assert!(stored.draft_saved_at.is_some());
    assert_eq!(stored.created_by, Some(user_id));
    assert_eq!(stored.draft.city, "Hamburg");
    assert_eq!(stored.customer_shop_name.as_deref(), Some("Acme Grow"));

    session.update_fields(ready_patch());
    let visit = session.submit().await.unwrap();

    assert_eq!(visit.id, id);
    assert!(!visit.is_draft);
    assert!(visit.draft_saved_at.is_none());
    assert_eq!(visit.priority_level, Some(PriorityLevel::High));
    assert!((visit.calculated_score.unwrap() - 35.0).abs() < 1e-9);
    assert_eq!(session.phase(), LifecyclePhase::Finalized);

    // Relatório enviado não aceita mais edição nem exclusão
    let err = service
        .update(&pool, id, UpdateVisitPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VisitFinalized));

    let err = service.delete(&pool, id).await.unwrap_err();
    assert!(matches!(err, AppError::VisitFinalized));
}

#[sqlx::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn discarded_draft_is_removed_from_postgres(pool: PgPool) {
    let (user_id, customer) = seed(&pool).await;
    let (service, store, directory) = services(&pool);
    let session = VisitReportSession::new(store, user_id, SessionOptions::default());

    session.select_customer(&directory, customer.id).await.unwrap();
    session.advance_section(0).await.unwrap();
    let id = session.visit_id().unwrap();

    session.discard().await.unwrap();

    assert_eq!(session.phase(), LifecyclePhase::Empty);
    assert!(matches!(
        service.get(&pool, id).await,
        Err(AppError::VisitNotFound)
    ));
}

#[sqlx::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn unknown_customer_is_reported_by_the_directory(pool: PgPool) {
    let (user_id, _) = seed(&pool).await;
    let (_, store, directory) = services(&pool);
    let session = VisitReportSession::new(store, user_id, SessionOptions::default());

    let missing = Uuid::new_v4();
    let err = session.select_customer(&directory, missing).await.unwrap_err();
    assert!(matches!(err, LifecycleError::CustomerNotFound(id) if id == missing));
}

#[sqlx::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn partial_update_keeps_the_stored_report(pool: PgPool) {
    let (user_id, customer) = seed(&pool).await;
    let (service, _, _) = services(&pool);

    let created = service
        .create(
            &pool,
            user_id,
            SaveVisitPayload {
                draft: VisitDraft {
                    customer_id: Some(customer.id),
                    shop_name: "Acme Grow".into(),
                    shop_type: Some(ShopType::Growshop),
                    visit_purpose: "routine_check".into(),
                    overall_satisfaction: 8,
                    visit_photos: vec!["https://cdn.example/shelf.jpg".into()],
                    ..Default::default()
                },
                is_draft: true,
            },
        )
        .await
        .unwrap();

    let payload: UpdateVisitPayload = serde_json::from_value(json!({
        "customer_id": customer.id,
        "notes": "only notes changed"
    }))
    .unwrap();

    let updated = service.update(&pool, created.id, payload).await.unwrap();

    assert!(updated.is_draft);
    assert_eq!(updated.draft.notes, "only notes changed");
    assert_eq!(updated.draft.shop_name, "Acme Grow");
    assert_eq!(updated.draft.overall_satisfaction, 8);
    assert_eq!(updated.draft.visit_photos, created.draft.visit_photos);
    assert_eq!(updated.draft.visit_date, created.draft.visit_date);
}

#[sqlx::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn visit_for_unknown_customer_is_rejected(pool: PgPool) {
    let (user_id, _) = seed(&pool).await;
    let (service, _, _) = services(&pool);

    let err = service
        .create(
            &pool,
            user_id,
            SaveVisitPayload {
                draft: VisitDraft {
                    customer_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
                is_draft: true,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CustomerNotFound));
}
