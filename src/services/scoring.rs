// src/services/scoring.rs

use crate::models::visit::{CommercialOutcome, PriorityLevel, ScoreCard, VisitDraft};

pub const VISIBILITY_WEIGHT: f64 = 0.3;
pub const TRAINING_BONUS: f64 = 20.0;
pub const SATISFACTION_WEIGHT: f64 = 2.5;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

// Limiares de prioridade (pontuação >= limiar)
pub const LOW_PRIORITY_THRESHOLD: f64 = 80.0;
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 60.0;

/// Pontuação da visita (0..=100) e a prioridade de follow-up derivada dela.
///
/// A fórmula é compartilhada pelo formulário e pelo backend: a prioridade
/// alimenta a triagem de follow-ups nos relatórios.
pub fn compute_score(draft: &VisitDraft) -> ScoreCard {
    let training = if draft.training_provided { TRAINING_BONUS } else { 0.0 };
    let commercial = draft
        .commercial_outcome
        .map_or(0.0, CommercialOutcome::weight);

    let raw = f64::from(draft.product_visibility_score) * VISIBILITY_WEIGHT
        + training
        + commercial
        + f64::from(draft.overall_satisfaction) * SATISFACTION_WEIGHT;

    let calculated_score = raw.clamp(MIN_SCORE, MAX_SCORE);

    ScoreCard {
        calculated_score,
        priority_level: priority_for(calculated_score),
    }
}

pub fn priority_for(score: f64) -> PriorityLevel {
    if score >= LOW_PRIORITY_THRESHOLD {
        PriorityLevel::Low
    } else if score >= MEDIUM_PRIORITY_THRESHOLD {
        PriorityLevel::Medium
    } else {
        PriorityLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(visibility: i32, training: bool, outcome: Option<CommercialOutcome>, satisfaction: i32) -> VisitDraft {
        VisitDraft {
            product_visibility_score: visibility,
            training_provided: training,
            commercial_outcome: outcome,
            overall_satisfaction: satisfaction,
            ..Default::default()
        }
    }

    #[test]
    fn routine_check_scores_35_with_high_priority() {
        let card = compute_score(&draft(50, false, Some(CommercialOutcome::InformationOnly), 6));

        assert!((card.calculated_score - 35.0).abs() < 1e-9);
        assert_eq!(card.priority_level, PriorityLevel::High);
    }

    #[test]
    fn all_zero_input_scores_zero() {
        let card = compute_score(&draft(0, false, None, 0));
        assert_eq!(card.calculated_score, 0.0);
        assert_eq!(card.priority_level, PriorityLevel::High);
    }

    #[test]
    fn maximum_input_is_clamped_to_100() {
        let card = compute_score(&draft(100, true, Some(CommercialOutcome::NewOrder), 10));
        assert_eq!(card.calculated_score, 100.0);
        assert_eq!(card.priority_level, PriorityLevel::Low);

        // Satisfação fora da faixa passa pelo núcleo; o clamp segura
        let card = compute_score(&draft(100, true, Some(CommercialOutcome::NewOrder), 14));
        assert_eq!(card.calculated_score, 100.0);
    }

    #[test]
    fn negative_raw_score_is_clamped_to_zero() {
        let card = compute_score(&draft(-200, false, None, 1));
        assert_eq!(card.calculated_score, 0.0);
    }

    #[test]
    fn no_outcome_and_absent_outcome_weigh_the_same() {
        let none = compute_score(&draft(40, false, None, 5));
        let explicit = compute_score(&draft(40, false, Some(CommercialOutcome::NoOutcome), 5));
        assert_eq!(none, explicit);
    }

    #[test]
    fn commercial_weights_match_table() {
        assert_eq!(CommercialOutcome::NewOrder.weight(), 25.0);
        assert_eq!(CommercialOutcome::OrderCommitment.weight(), 20.0);
        assert_eq!(CommercialOutcome::PriceNegotiation.weight(), 15.0);
        assert_eq!(CommercialOutcome::ComplaintResolved.weight(), 10.0);
        assert_eq!(CommercialOutcome::InformationOnly.weight(), 5.0);
        assert_eq!(CommercialOutcome::NoOutcome.weight(), 0.0);
    }

    #[test]
    fn priority_boundaries() {
        assert_eq!(priority_for(80.0), PriorityLevel::Low);
        assert_eq!(priority_for(79.999), PriorityLevel::Medium);
        assert_eq!(priority_for(60.0), PriorityLevel::Medium);
        assert_eq!(priority_for(59.999), PriorityLevel::High);
    }

    #[test]
    fn score_always_within_bounds() {
        let outcomes = [
            None,
            Some(CommercialOutcome::NewOrder),
            Some(CommercialOutcome::ComplaintResolved),
            Some(CommercialOutcome::NoOutcome),
        ];
        for visibility in [-50, 0, 37, 100, 250] {
            for training in [false, true] {
                for outcome in outcomes {
                    for satisfaction in [-3, 0, 1, 10, 40] {
                        let score = compute_score(&draft(visibility, training, outcome, satisfaction))
                            .calculated_score;
                        assert!((MIN_SCORE..=MAX_SCORE).contains(&score), "score {score} out of range");
                    }
                }
            }
        }
    }
}
