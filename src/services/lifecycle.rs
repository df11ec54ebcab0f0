// src/services/lifecycle.rs
//
// Ciclo de vida de um relatório de visita em edição:
// Empty (sem id) -> DraftPersisted (rascunho gravado, autosave ativo) -> Finalized (terminal).

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    common::error::{AppError, LifecycleError},
    config::AppConfig,
    models::{
        customer::Customer,
        visit::{DraftPatch, ScoreCard, Visit, VisitDraft, VisitRecord},
    },
    services::{
        checklist::{evaluate_checklist, missing_required_fields, ChecklistResult},
        scoring::compute_score,
    },
};

const CREATE_FAILED: &str = "Could not create a new visit report draft.";
const SAVE_FAILED: &str = "Could not save the visit report draft.";
const SUBMIT_FAILED: &str = "Could not submit the visit report.";
const DISCARD_FAILED: &str = "Could not discard the visit report draft.";
const CUSTOMER_LOOKUP_FAILED: &str = "Could not load the selected customer.";

// =============================================================================
//  PORTAS (implementadas pelo Postgres e pelos mocks de teste)
// =============================================================================

/// Onde os relatórios são gravados.
#[async_trait]
pub trait VisitStore: Send + Sync + 'static {
    async fn create(&self, acting_user: Uuid, record: &VisitRecord) -> Result<Visit, AppError>;
    async fn update(&self, id: Uuid, record: &VisitRecord) -> Result<Visit, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError>;
}

// =============================================================================
//  SEÇÕES DO FORMULÁRIO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormSection {
    ShopInformation,
    ProductVisibility,
    TrainingSupport,
    CommercialOutcomes,
    PhotosNotes,
    Signature,
}

impl FormSection {
    pub const ALL: [FormSection; 6] = [
        FormSection::ShopInformation,
        FormSection::ProductVisibility,
        FormSection::TrainingSupport,
        FormSection::CommercialOutcomes,
        FormSection::PhotosNotes,
        FormSection::Signature,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            FormSection::ShopInformation => "Shop Information",
            FormSection::ProductVisibility => "Product Visibility",
            FormSection::TrainingSupport => "Training & Support",
            FormSection::CommercialOutcomes => "Commercial Outcomes",
            FormSection::PhotosNotes => "Photos & Notes",
            FormSection::Signature => "Signature",
        }
    }
}

pub const SECTION_COUNT: usize = FormSection::ALL.len();

// =============================================================================
//  ESTADO DA SESSÃO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Empty,
    DraftPersisted,
    Finalized,
}

/// Resultado de um disparo do autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    Saved,
    /// Outra gravação estava em andamento.
    Skipped,
    /// O relatório saiu de DraftPersisted; o timer deve parar.
    Discarded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub autosave_interval: Duration,
}

impl SessionOptions {
    pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autosave_interval: Self::DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            autosave_interval: config.autosave_interval,
        }
    }
}

struct SessionState {
    phase: LifecyclePhase,
    visit_id: Option<Uuid>,
    draft: VisitDraft,
    score: Option<ScoreCard>,
    last_saved_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl SessionState {
    fn blank() -> Self {
        Self {
            phase: LifecyclePhase::Empty,
            visit_id: None,
            draft: VisitDraft::default(),
            score: None,
            last_saved_at: None,
            last_error: None,
        }
    }
}

// Parte compartilhada com a task de autosave
struct Shared<S> {
    store: Arc<S>,
    acting_user: Uuid,
    state: Mutex<SessionState>,
    // No máximo uma gravação em andamento por rascunho
    persist_lock: tokio::sync::Mutex<()>,
    // Garante um único create de rascunho
    draft_latch: AtomicBool,
}

impl<S: VisitStore> Shared<S> {
    async fn autosave_tick(&self) -> AutosaveOutcome {
        let Ok(_guard) = self.persist_lock.try_lock() else {
            tracing::debug!("Autosave skipped: another save is in flight");
            return AutosaveOutcome::Skipped;
        };

        let (id, record) = {
            let state = self.state.lock();
            match (state.phase, state.visit_id) {
                (LifecyclePhase::DraftPersisted, Some(id)) => {
                    (id, VisitRecord::draft(state.draft.clone()))
                }
                _ => return AutosaveOutcome::Discarded,
            }
        };

        match self.store.update(id, &record).await {
            Ok(visit) => {
                let mut state = self.state.lock();
                // Uma submissão pode ter terminado enquanto gravávamos
                if state.phase != LifecyclePhase::DraftPersisted {
                    return AutosaveOutcome::Discarded;
                }
                state.last_saved_at = Some(visit.draft_saved_at.unwrap_or_else(Utc::now));
                tracing::debug!(visit_id = %id, "Draft autosaved");
                AutosaveOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(visit_id = %id, error = %e, "Autosave failed");
                AutosaveOutcome::Failed
            }
        }
    }
}

/// Um relatório de visita sendo preenchido por um representante.
///
/// Toda gravação passa pelo `VisitStore`; o estado em memória é a fonte
/// da verdade até a submissão. Precisa rodar dentro de um runtime Tokio,
/// porque o autosave é uma task própria.
pub struct VisitReportSession<S: VisitStore> {
    shared: Arc<Shared<S>>,
    options: SessionOptions,
    autosave: Mutex<Option<JoinHandle<()>>>,
}

impl<S: VisitStore> VisitReportSession<S> {
    pub fn new(store: Arc<S>, acting_user: Uuid, options: SessionOptions) -> Self {
        Self::with_state(store, acting_user, options, SessionState::blank(), false)
    }

    /// Retoma um rascunho já gravado. Relatórios finalizados não podem ser reabertos.
    pub fn resume(
        store: Arc<S>,
        acting_user: Uuid,
        visit: Visit,
        options: SessionOptions,
    ) -> Result<Self, LifecycleError> {
        if !visit.is_draft {
            return Err(LifecycleError::Finalized);
        }

        let mut draft = visit.draft;
        draft.sales_data.normalize_pairs();

        let state = SessionState {
            phase: LifecyclePhase::DraftPersisted,
            visit_id: Some(visit.id),
            draft,
            score: None,
            last_saved_at: visit.draft_saved_at,
            last_error: None,
        };

        let session = Self::with_state(store, acting_user, options, state, true);
        session.start_autosave();
        tracing::info!(visit_id = %visit.id, "Resumed visit report draft");
        Ok(session)
    }

    fn with_state(
        store: Arc<S>,
        acting_user: Uuid,
        options: SessionOptions,
        state: SessionState,
        latched: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                acting_user,
                state: Mutex::new(state),
                persist_lock: tokio::sync::Mutex::new(()),
                draft_latch: AtomicBool::new(latched),
            }),
            options,
            autosave: Mutex::new(None),
        }
    }

    // --- Leitura ---

    pub fn phase(&self) -> LifecyclePhase {
        self.shared.state.lock().phase
    }

    pub fn visit_id(&self) -> Option<Uuid> {
        self.shared.state.lock().visit_id
    }

    pub fn draft(&self) -> VisitDraft {
        self.shared.state.lock().draft.clone()
    }

    pub fn score(&self) -> Option<ScoreCard> {
        self.shared.state.lock().score
    }

    pub fn checklist(&self) -> ChecklistResult {
        evaluate_checklist(&self.shared.state.lock().draft)
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.shared.state.lock().last_saved_at
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    pub fn acting_user(&self) -> Uuid {
        self.shared.acting_user
    }

    pub fn is_autosave_running(&self) -> bool {
        self.autosave
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // --- Edição ---

    /// Mescla um patch no rascunho em memória. Ignorado depois da submissão.
    pub fn update_fields(&self, patch: DraftPatch) {
        let mut state = self.shared.state.lock();
        if state.phase == LifecyclePhase::Finalized {
            tracing::debug!("Ignoring field update on a submitted visit report");
            return;
        }
        state.draft.apply(patch);
        state.last_error = None;
    }

    pub async fn select_customer<D>(&self, directory: &D, customer_id: Uuid) -> Result<(), LifecycleError>
    where
        D: CustomerDirectory + ?Sized,
    {
        if self.phase() == LifecyclePhase::Finalized {
            return Err(LifecycleError::Finalized);
        }

        let customer = directory
            .get_by_id(customer_id)
            .await
            .map_err(|source| LifecycleError::Persistence {
                context: CUSTOMER_LOOKUP_FAILED,
                source,
            })?
            .ok_or(LifecycleError::CustomerNotFound(customer_id))?;

        let mut state = self.shared.state.lock();
        if state.phase == LifecyclePhase::Finalized {
            return Err(LifecycleError::Finalized);
        }
        state.draft.apply_customer(&customer);
        state.last_error = None;
        Ok(())
    }

    // --- Navegação ---

    /// Avança uma seção. Saindo da primeira seção com um cliente escolhido,
    /// o rascunho é criado antes.
    pub async fn advance_section(&self, current: usize) -> Result<usize, LifecycleError> {
        if current == 0 {
            self.ensure_draft().await?;
        }

        let state = self.shared.state.lock();
        if state.visit_id.is_none() {
            return Err(if state.draft.customer_id.is_none() {
                LifecycleError::Validation(vec!["customer_id".to_string()])
            } else {
                LifecycleError::NotPersisted
            });
        }

        Ok(current.saturating_add(1).min(SECTION_COUNT - 1))
    }

    pub fn previous_section(&self, current: usize) -> usize {
        current.saturating_sub(1).min(SECTION_COUNT - 1)
    }

    async fn ensure_draft(&self) -> Result<(), LifecycleError> {
        let _guard = self.shared.persist_lock.lock().await;

        let record = {
            let state = self.shared.state.lock();
            if state.phase != LifecyclePhase::Empty || state.draft.customer_id.is_none() {
                return Ok(());
            }
            VisitRecord::draft(state.draft.clone())
        };

        if self
            .shared
            .draft_latch
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        match self.shared.store.create(self.shared.acting_user, &record).await {
            Ok(visit) => {
                {
                    let mut state = self.shared.state.lock();
                    state.phase = LifecyclePhase::DraftPersisted;
                    state.visit_id = Some(visit.id);
                    state.last_saved_at = Some(visit.draft_saved_at.unwrap_or_else(Utc::now));
                    state.last_error = None;
                }
                tracing::info!(visit_id = %visit.id, "Visit report draft created");
                self.start_autosave();
                Ok(())
            }
            Err(source) => {
                self.shared.draft_latch.store(false, Ordering::Release);
                self.shared.state.lock().last_error = Some(CREATE_FAILED.to_string());
                tracing::error!(error = %source, "Failed to create visit report draft");
                Err(LifecycleError::Persistence {
                    context: CREATE_FAILED,
                    source,
                })
            }
        }
    }

    // --- Gravação ---

    /// Grava o rascunho agora, esperando qualquer gravação em andamento.
    pub async fn save_draft(&self) -> Result<(), LifecycleError> {
        let _guard = self.shared.persist_lock.lock().await;

        let (id, record) = {
            let state = self.shared.state.lock();
            match (state.phase, state.visit_id) {
                (LifecyclePhase::Finalized, _) => return Err(LifecycleError::Finalized),
                (LifecyclePhase::DraftPersisted, Some(id)) => {
                    (id, VisitRecord::draft(state.draft.clone()))
                }
                _ => return Err(LifecycleError::NotPersisted),
            }
        };

        match self.shared.store.update(id, &record).await {
            Ok(visit) => {
                let mut state = self.shared.state.lock();
                state.last_saved_at = Some(visit.draft_saved_at.unwrap_or_else(Utc::now));
                state.last_error = None;
                Ok(())
            }
            Err(source) => {
                self.shared.state.lock().last_error = Some(SAVE_FAILED.to_string());
                tracing::error!(visit_id = %id, error = %source, "Failed to save visit report draft");
                Err(LifecycleError::Persistence {
                    context: SAVE_FAILED,
                    source,
                })
            }
        }
    }

    /// Submissão final. Campos obrigatórios e checklist são verificados antes
    /// de qualquer gravação.
    pub async fn submit(&self) -> Result<Visit, LifecycleError> {
        let _guard = self.shared.persist_lock.lock().await;

        let (visit_id, draft) = {
            let state = self.shared.state.lock();
            if state.phase == LifecyclePhase::Finalized {
                return Err(LifecycleError::Finalized);
            }
            (state.visit_id, state.draft.clone())
        };

        let missing = missing_required_fields(&draft);
        if !missing.is_empty() {
            let err = LifecycleError::Validation(missing);
            self.shared.state.lock().last_error = Some(err.to_string());
            return Err(err);
        }

        let checklist = evaluate_checklist(&draft);
        if !checklist.all_pass {
            let err = LifecycleError::ChecklistIncomplete(checklist);
            self.shared.state.lock().last_error = Some(err.to_string());
            return Err(err);
        }

        let score = compute_score(&draft);
        let record = VisitRecord::finalized(draft, score);

        let result = match visit_id {
            Some(id) => self.shared.store.update(id, &record).await,
            None => self.shared.store.create(self.shared.acting_user, &record).await,
        };

        match result {
            Ok(visit) => {
                {
                    let mut state = self.shared.state.lock();
                    state.phase = LifecyclePhase::Finalized;
                    state.visit_id = Some(visit.id);
                    state.draft = record.draft;
                    state.score = Some(score);
                    state.last_error = None;
                }
                self.shared.draft_latch.store(true, Ordering::Release);
                self.stop_autosave();
                tracing::info!(
                    visit_id = %visit.id,
                    score = score.calculated_score,
                    priority = ?score.priority_level,
                    "Visit report submitted"
                );
                Ok(visit)
            }
            Err(source) => {
                self.shared.state.lock().last_error = Some(SUBMIT_FAILED.to_string());
                tracing::error!(error = %source, "Failed to submit visit report");
                Err(LifecycleError::Persistence {
                    context: SUBMIT_FAILED,
                    source,
                })
            }
        }
    }

    /// Apaga o rascunho gravado e volta a sessão para o estado inicial.
    pub async fn discard(&self) -> Result<(), LifecycleError> {
        let _guard = self.shared.persist_lock.lock().await;

        let id = {
            let state = self.shared.state.lock();
            match (state.phase, state.visit_id) {
                (LifecyclePhase::Finalized, _) => return Err(LifecycleError::Finalized),
                (LifecyclePhase::DraftPersisted, Some(id)) => id,
                _ => return Err(LifecycleError::NotPersisted),
            }
        };

        if let Err(source) = self.shared.store.delete(id).await {
            self.shared.state.lock().last_error = Some(DISCARD_FAILED.to_string());
            tracing::error!(visit_id = %id, error = %source, "Failed to discard visit report draft");
            return Err(LifecycleError::Persistence {
                context: DISCARD_FAILED,
                source,
            });
        }

        self.stop_autosave();
        *self.shared.state.lock() = SessionState::blank();
        self.shared.draft_latch.store(false, Ordering::Release);
        tracing::info!(visit_id = %id, "Visit report draft discarded");
        Ok(())
    }

    // --- Autosave ---

    fn start_autosave(&self) {
        let shared = Arc::clone(&self.shared);
        let period = self.options.autosave_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if shared.autosave_tick().await == AutosaveOutcome::Discarded {
                    break;
                }
            }
        });

        if let Some(previous) = self.autosave.lock().replace(handle) {
            previous.abort();
        }
    }

    fn stop_autosave(&self) {
        if let Some(handle) = self.autosave.lock().take() {
            handle.abort();
        }
    }
}

impl<S: VisitStore> Drop for VisitReportSession<S> {
    fn drop(&mut self) {
        self.stop_autosave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_ordered() {
        assert_eq!(SECTION_COUNT, 6);
        assert_eq!(FormSection::from_index(0), Some(FormSection::ShopInformation));
        assert_eq!(FormSection::from_index(5), Some(FormSection::Signature));
        assert_eq!(FormSection::from_index(6), None);
        assert_eq!(FormSection::CommercialOutcomes.index(), 3);
        assert_eq!(FormSection::TrainingSupport.title(), "Training & Support");
    }

    #[test]
    fn default_autosave_interval_is_thirty_seconds() {
        assert_eq!(
            SessionOptions::default().autosave_interval,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn options_follow_app_config() {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/visits".to_string()),
            "JWT_SECRET" => Some("secret".to_string()),
            "AUTOSAVE_INTERVAL_SECS" => Some("12".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(
            SessionOptions::from(&config).autosave_interval,
            Duration::from_secs(12)
        );
    }
}
