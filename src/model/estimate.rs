use crate::model::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Independent estimation techniques whose outputs the fusion engine combines.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EstimationMethod {
    ExpertJudgment,
    AnalogyBased,
    ThreePointPert,
    Parametric,
    BottomUp,
}

impl EstimationMethod {
    /// All methods, in their canonical order.
    pub const ALL: [EstimationMethod; 5] = [
        EstimationMethod::ExpertJudgment,
        EstimationMethod::AnalogyBased,
        EstimationMethod::ThreePointPert,
        EstimationMethod::Parametric,
        EstimationMethod::BottomUp,
    ];
}

/// Optimistic / most-likely / pessimistic triad for three-point estimation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PertTriad {
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
}

impl PertTriad {
    /// PERT expected value: (O + 4M + P) / 6.
    pub fn expected(&self) -> f64 {
        (self.optimistic + 4.0 * self.most_likely + self.pessimistic) / 6.0
    }

    /// PERT standard deviation: (P - O) / 6.
    pub fn std_dev(&self) -> f64 {
        (self.pessimistic - self.optimistic) / 6.0
    }
}

/// One method's estimate for one task. Estimates accumulate over time; the
/// fusion step reads the latest per method.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskEstimate {
    pub task_id: TaskId,
    pub method: EstimationMethod,
    pub estimated_hours: f64,
    /// Only meaningful for [`EstimationMethod::ThreePointPert`].
    pub pert: Option<PertTriad>,
    /// Confidence score in [0, 1].
    pub confidence: f64,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskEstimate {
    pub fn new(task_id: TaskId, method: EstimationMethod, estimated_hours: f64) -> Self {
        Self {
            task_id,
            method,
            estimated_hours,
            pert: None,
            confidence: 0.5,
            rationale: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_pert(mut self, optimistic: f64, most_likely: f64, pessimistic: f64) -> Self {
        self.pert = Some(PertTriad {
            optimistic,
            most_likely,
            pessimistic,
        });
        self
    }
}

/// The fused output of one or more method estimates for a task.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FinalEstimate {
    pub task_id: TaskId,
    /// Confidence-weighted mean of the contributing methods' hours.
    pub hours: f64,
    pub confidence: f64,
    /// Uncertainty range, never narrower than the raw spread of the
    /// contributing methods.
    pub range_hours: (f64, f64),
    /// Methods that contributed, in canonical order.
    pub methods: Vec<EstimationMethod>,
    /// Present when a three-point estimate contributed.
    pub pert_std_dev: Option<f64>,
}

/// Append-only audit record comparing an estimate against recorded actuals.
///
/// `method` is `None` for the fused estimate, `Some` for a per-method record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EstimationHistoryEntry {
    pub task_id: TaskId,
    pub method: Option<EstimationMethod>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    /// 1 - |estimated - actual| / actual, clamped to [0, 1].
    pub accuracy_score: f64,
    pub recorded_at: DateTime<Utc>,
}
