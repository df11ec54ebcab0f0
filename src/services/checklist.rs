// src/services/checklist.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::visit::VisitDraft;

// Campos obrigatórios para a submissão final, independentes do checklist
pub const REQUIRED_FIELDS: [&str; 5] = [
    "customer_id",
    "shop_name",
    "shop_type",
    "visit_date",
    "visit_purpose",
];

/// Checklist de pré-submissão. Cada item é avaliado de forma independente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChecklistResult {
    pub photos_attached: bool,
    pub questionnaire_complete: bool,
    pub follow_up_added: bool,
    pub signature_attached: bool,
    pub all_pass: bool,
}

fn filled(value: &str) -> bool {
    !value.is_empty()
}

fn filled_opt(value: Option<&str>) -> bool {
    value.is_some_and(filled)
}

pub fn evaluate_checklist(draft: &VisitDraft) -> ChecklistResult {
    let photos_attached = !draft.visit_photos.is_empty();

    let questionnaire_complete = draft.customer_id.is_some()
        && filled(&draft.shop_name)
        && draft.shop_type.is_some()
        && filled(&draft.visit_purpose);

    let follow_up_added = !draft.follow_up_required || filled(&draft.follow_up_notes);

    let signature_attached = filled_opt(draft.signature.as_deref())
        && filled_opt(draft.signature_signer_name.as_deref())
        && draft.signature_date.is_some();

    ChecklistResult {
        photos_attached,
        questionnaire_complete,
        follow_up_added,
        signature_attached,
        all_pass: photos_attached && questionnaire_complete && follow_up_added && signature_attached,
    }
}

/// Nomes dos campos obrigatórios ausentes, na ordem de `REQUIRED_FIELDS`.
pub fn missing_required_fields(draft: &VisitDraft) -> Vec<String> {
    let present = [
        draft.customer_id.is_some(),
        filled(&draft.shop_name),
        draft.shop_type.is_some(),
        draft.visit_date.is_some(),
        filled(&draft.visit_purpose),
    ];

    REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::models::customer::ShopType;

    fn complete_draft() -> VisitDraft {
        VisitDraft {
            customer_id: Some(Uuid::new_v4()),
            shop_name: "Acme Grow".into(),
            shop_type: Some(ShopType::Growshop),
            visit_purpose: "routine_check".into(),
            visit_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            visit_photos: vec!["https://cdn.example/front.jpg".into()],
            signature: Some("data:image/png;base64,AAAA".into()),
            signature_signer_name: Some("Jane Doe".into()),
            signature_date: Some(Utc::now()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_draft_passes() {
        let result = evaluate_checklist(&complete_draft());
        assert!(result.all_pass);
        assert!(missing_required_fields(&complete_draft()).is_empty());
    }

    #[test]
    fn follow_up_requires_notes_only_when_flagged() {
        let mut draft = complete_draft();
        draft.follow_up_required = true;
        draft.follow_up_notes.clear();

        let result = evaluate_checklist(&draft);
        assert!(!result.follow_up_added);
        assert!(!result.all_pass);

        draft.follow_up_required = false;
        assert!(evaluate_checklist(&draft).follow_up_added);

        draft.follow_up_notes = "call back next week".into();
        assert!(evaluate_checklist(&draft).follow_up_added);
    }

    #[test]
    fn photos_and_signature_are_checked_independently() {
        let mut draft = complete_draft();
        draft.visit_photos.clear();
        draft.signature_signer_name = Some(String::new());

        let result = evaluate_checklist(&draft);
        assert!(!result.photos_attached);
        assert!(!result.signature_attached);
        assert!(result.questionnaire_complete);
        assert!(result.follow_up_added);
        assert!(!result.all_pass);
    }

    #[test]
    fn questionnaire_needs_customer() {
        let mut draft = complete_draft();
        draft.customer_id = None;
        assert!(!evaluate_checklist(&draft).questionnaire_complete);
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let draft = VisitDraft {
            visit_date: None,
            ..Default::default()
        };
        assert_eq!(missing_required_fields(&draft), REQUIRED_FIELDS.map(String::from).to_vec());

        let mut draft = complete_draft();
        draft.shop_type = None;
        draft.visit_purpose.clear();
        assert_eq!(missing_required_fields(&draft), vec!["shop_type", "visit_purpose"]);
    }
}
