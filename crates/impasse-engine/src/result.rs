use impasse_cp::{
    AssembledModel, ComponentOutcome, Interpretation, ModelType, SolutionRecord, SolveStatus,
};
use serde::Serialize;

/// Weight reported for every impossible-differential result.
pub const IMPOSSIBLE_TOTAL_WEIGHT: &str = "0.0";

/// A component that had no encoding and was left out of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedComponent {
    pub id: String,
    pub direction: String,
    pub reason: String,
}

/// Outcome of one search, in the shape written to result files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub cipher_id: String,
    pub model_type: ModelType,
    pub solver_name: String,
    pub status: SolveStatus,
    pub solving_time_seconds: f64,
    pub memory_megabytes: f64,
    pub components_values: SolutionRecord,
    pub total_weight: String,
    /// Empty when the model covered every component.
    pub skipped_components: Vec<SkippedComponent>,
}

impl SearchResult {
    pub fn new(
        cipher_id: impl Into<String>,
        solver_name: impl Into<String>,
        model: &AssembledModel,
        interpretation: Interpretation,
    ) -> Self {
        let skipped_components = model
            .reports
            .iter()
            .filter_map(|report| match &report.outcome {
                ComponentOutcome::Modeled => None,
                ComponentOutcome::Skipped(reason) => Some(SkippedComponent {
                    id: report.id.clone(),
                    direction: report.direction.as_str().to_string(),
                    reason: reason.to_string(),
                }),
            })
            .collect();
        Self {
            cipher_id: cipher_id.into(),
            model_type: interpretation.model_type,
            solver_name: solver_name.into(),
            status: interpretation.status,
            solving_time_seconds: interpretation.statistics.solving_time_seconds,
            memory_megabytes: interpretation.statistics.memory_megabytes,
            components_values: interpretation.record,
            total_weight: IMPOSSIBLE_TOTAL_WEIGHT.to_string(),
            skipped_components,
        }
    }

    /// Whether the solver found a trail at all.
    pub fn is_satisfiable(&self) -> bool {
        self.status == SolveStatus::Satisfiable
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
