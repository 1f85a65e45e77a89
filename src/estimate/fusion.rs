//! Estimation fusion.
//!
//! Combines the latest per-method estimates for one task into a single
//! [`FinalEstimate`] with a confidence-weighted mean and an uncertainty
//! range. The engine never judges estimate quality itself; an upstream
//! collaborator produced the numbers, this step only fuses them.

use crate::error::EngineError;
use crate::model::{EstimationMethod, FinalEstimate, TaskEstimate};
use std::collections::BTreeMap;
use tracing::debug;

/// One method's contribution to the fused estimate.
struct Contribution {
    method: EstimationMethod,
    hours: f64,
    confidence: f64,
}

/// Fuse the supplied estimates (all for one task) into a final estimate.
///
/// A task may carry anywhere from 1 to 5 method estimates; when several
/// estimates exist for the same method, only the latest (by `created_at`)
/// contributes. Three-point estimates contribute their PERT expected value
/// with confidence `1 - min(1, std_dev / expected)`; every other method
/// contributes its stated hours and confidence as-is.
///
/// Fails with [`EngineError::InsufficientEstimates`] on an empty slice and
/// [`EngineError::InvalidConfidence`] when any stated confidence falls
/// outside [0, 1].
pub fn fuse_estimates(estimates: &[TaskEstimate]) -> Result<FinalEstimate, EngineError> {
    let latest = latest_per_method(estimates);
    if latest.is_empty() {
        return Err(EngineError::InsufficientEstimates);
    }

    let task_id = latest.values().next().expect("non-empty").task_id;

    let mut contributions: Vec<Contribution> = Vec::with_capacity(latest.len());
    let mut pert_std_dev = None;

    for (&method, estimate) in &latest {
        if !(0.0..=1.0).contains(&estimate.confidence) {
            return Err(EngineError::InvalidConfidence {
                task_id: estimate.task_id,
                method,
                confidence: estimate.confidence,
            });
        }

        let contribution = match (method, estimate.pert) {
            (EstimationMethod::ThreePointPert, Some(triad)) => {
                let expected = triad.expected();
                let std_dev = triad.std_dev();
                let confidence = if expected > 0.0 {
                    (1.0 - (std_dev / expected).min(1.0)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                pert_std_dev = Some(std_dev);
                Contribution {
                    method,
                    hours: expected,
                    confidence,
                }
            }
            _ => Contribution {
                method,
                hours: estimate.estimated_hours,
                confidence: estimate.confidence,
            },
        };
        contributions.push(contribution);
    }

    let total_confidence: f64 = contributions.iter().map(|c| c.confidence).sum();
    let hours = if total_confidence > 0.0 {
        contributions
            .iter()
            .map(|c| c.hours * c.confidence)
            .sum::<f64>()
            / total_confidence
    } else {
        // All-zero confidence: fall back to the unweighted mean.
        contributions.iter().map(|c| c.hours).sum::<f64>() / contributions.len() as f64
    };

    let confidence =
        contributions.iter().map(|c| c.confidence).sum::<f64>() / contributions.len() as f64;

    let mut low = contributions
        .iter()
        .map(|c| c.hours)
        .fold(f64::INFINITY, f64::min);
    let mut high = contributions
        .iter()
        .map(|c| c.hours)
        .fold(f64::NEG_INFINITY, f64::max);
    if let Some(std_dev) = pert_std_dev {
        // Widen by the PERT spread; the range is never narrower than the raw
        // spread of the contributing methods.
        let pert_hours = contributions
            .iter()
            .find(|c| c.method == EstimationMethod::ThreePointPert)
            .map(|c| c.hours)
            .expect("PERT contributed");
        low = low.min(pert_hours - std_dev).max(0.0);
        high = high.max(pert_hours + std_dev);
    }

    debug!(
        %task_id,
        methods = contributions.len(),
        hours,
        "fused estimates"
    );

    Ok(FinalEstimate {
        task_id,
        hours,
        confidence,
        range_hours: (low, high),
        methods: contributions.iter().map(|c| c.method).collect(),
        pert_std_dev,
    })
}

/// Latest estimate per method, keyed in canonical method order. Later slice
/// position wins on equal timestamps.
fn latest_per_method(estimates: &[TaskEstimate]) -> BTreeMap<EstimationMethod, &TaskEstimate> {
    let mut latest: BTreeMap<EstimationMethod, &TaskEstimate> = BTreeMap::new();
    for estimate in estimates {
        match latest.get(&estimate.method) {
            Some(current) if current.created_at > estimate.created_at => {}
            _ => {
                latest.insert(estimate.method, estimate);
            }
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn task_id() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert_eq!(
            fuse_estimates(&[]).unwrap_err(),
            EngineError::InsufficientEstimates
        );
    }

    #[test]
    fn pert_expected_and_std_dev() {
        let id = task_id();
        let estimate =
            TaskEstimate::new(id, EstimationMethod::ThreePointPert, 8.0).with_pert(4.0, 8.0, 16.0);

        let fused = fuse_estimates(&[estimate]).unwrap();

        assert!((fused.hours - 8.67).abs() < 0.01);
        assert_eq!(fused.pert_std_dev, Some(2.0));
        // confidence = 1 - 2.0 / 8.666...
        assert!((fused.confidence - 0.7692).abs() < 0.001);
        // Range widened by the std dev around the expected value.
        assert!(fused.range_hours.0 <= fused.hours - 2.0 + 1e-9);
        assert!(fused.range_hours.1 >= fused.hours + 2.0 - 1e-9);
    }

    #[test]
    fn equal_confidence_is_a_simple_mean() {
        let id = task_id();
        let estimates = vec![
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 10.0).with_confidence(0.8),
            TaskEstimate::new(id, EstimationMethod::AnalogyBased, 20.0).with_confidence(0.8),
        ];

        let fused = fuse_estimates(&estimates).unwrap();

        assert_eq!(fused.hours, 15.0);
        assert_eq!(fused.range_hours, (10.0, 20.0));
        assert_eq!(fused.methods.len(), 2);
    }

    #[test]
    fn confidence_weights_shift_the_mean() {
        let id = task_id();
        let estimates = vec![
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 10.0).with_confidence(0.9),
            TaskEstimate::new(id, EstimationMethod::AnalogyBased, 20.0).with_confidence(0.1),
        ];

        let fused = fuse_estimates(&estimates).unwrap();

        assert!((fused.hours - 11.0).abs() < 1e-9);
    }

    #[test]
    fn single_method_passes_through_unmodified() {
        let id = task_id();
        let estimate =
            TaskEstimate::new(id, EstimationMethod::Parametric, 42.0).with_confidence(0.65);

        let fused = fuse_estimates(&[estimate]).unwrap();

        assert_eq!(fused.hours, 42.0);
        assert_eq!(fused.confidence, 0.65);
        assert_eq!(fused.range_hours, (42.0, 42.0));
        assert_eq!(fused.methods, vec![EstimationMethod::Parametric]);
    }

    #[test]
    fn zero_confidence_falls_back_to_unweighted_mean() {
        let id = task_id();
        let estimates = vec![
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 10.0).with_confidence(0.0),
            TaskEstimate::new(id, EstimationMethod::BottomUp, 30.0).with_confidence(0.0),
        ];

        let fused = fuse_estimates(&estimates).unwrap();
        assert_eq!(fused.hours, 20.0);
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let id = task_id();
        let estimate =
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 10.0).with_confidence(1.5);

        let err = fuse_estimates(&[estimate]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfidence { .. }));
    }

    #[test]
    fn only_latest_estimate_per_method_contributes() {
        let id = task_id();
        let mut stale =
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 100.0).with_confidence(0.9);
        stale.created_at = Utc::now() - Duration::days(7);
        let fresh =
            TaskEstimate::new(id, EstimationMethod::ExpertJudgment, 10.0).with_confidence(0.9);

        let fused = fuse_estimates(&[stale, fresh]).unwrap();
        assert_eq!(fused.hours, 10.0);
    }
}
