//! One search, end to end: build the model, optionally dump it, solve,
//! and interpret what the solver printed.

use std::path::{Path, PathBuf};

use impasse_cp::backends::minizinc_backend::MiniZincSolver;
use impasse_cp::{
    AssembledModel, BuildRequest, CpSolver, ImpossibleXorDifferentialModel, ModelError, ModelType,
    SolveMode, TruncatedEncoder,
};
use impasse_ir::{Cipher, CipherError, FixedVariable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::result::SearchResult;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Which MiniZinc solver backend to run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverChoice {
    #[default]
    Chuffed,
    Gecode,
    CoinBc,
    /// Any other solver tag MiniZinc knows.
    Custom(String),
}

impl SolverChoice {
    /// Name passed to `minizinc --solver`.
    pub fn minizinc_name(&self) -> &str {
        match self {
            SolverChoice::Chuffed => "chuffed",
            SolverChoice::Gecode => "gecode",
            SolverChoice::CoinBc => "coin-bc",
            SolverChoice::Custom(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub solver: SolverChoice,
    pub minizinc_command: String,
    /// Zero disables the time limit.
    pub timeout_secs: u64,
    pub middle_round: usize,
    pub number_of_rounds: Option<usize>,
    pub fixed_variables: Vec<FixedVariable>,
    pub dump_model: Option<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            solver: SolverChoice::Chuffed,
            minizinc_command: "minizinc".to_string(),
            timeout_secs: 300,
            middle_round: 1,
            number_of_rounds: None,
            fixed_variables: Vec::new(),
            dump_model: None,
        }
    }
}

impl SearchOptions {
    /// Read options from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build_request(&self) -> BuildRequest {
        BuildRequest {
            number_of_rounds: self.number_of_rounds,
            middle_round: self.middle_round,
            fixed_variables: self.fixed_variables.clone(),
        }
    }

    pub fn minizinc_solver(&self) -> MiniZincSolver {
        let timeout_ms = match self.timeout_secs {
            0 => None,
            secs => Some(secs.saturating_mul(1000)),
        };
        MiniZincSolver::with_command_and_timeout(
            &self.minizinc_command,
            self.solver.minizinc_name(),
            timeout_ms,
        )
    }
}

/// Load a cipher and its structural inverse from their JSON descriptions.
pub fn model_from_json<E: TruncatedEncoder>(
    cipher_json: &str,
    inverse_json: &str,
    encoder: E,
) -> Result<ImpossibleXorDifferentialModel<E>, PipelineError> {
    let cipher = Cipher::from_json_str(cipher_json)?;
    let inverse = Cipher::from_json_str(inverse_json)?;
    info!(
        cipher = %cipher.id,
        rounds = cipher.number_of_rounds(),
        "Cipher descriptions loaded"
    );
    Ok(ImpossibleXorDifferentialModel::new(cipher, inverse, encoder))
}

/// Write the emitted model text to `path`.
pub fn dump_model(model: &AssembledModel, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, model.to_minizinc())
}

/// Search for one impossible trail with the MiniZinc driver configured by
/// `options`.
pub fn find_one_impossible_xor_differential_trail<E: TruncatedEncoder>(
    model: &ImpossibleXorDifferentialModel<E>,
    options: &SearchOptions,
) -> Result<SearchResult, PipelineError> {
    let mut solver = options.minizinc_solver();
    find_one_impossible_xor_differential_trail_with(model, options, &mut solver)
}

/// Enumerate every solution with the MiniZinc driver configured by
/// `options`. Evidence is extracted from the first solution only.
pub fn find_all_impossible_xor_differential_trails<E: TruncatedEncoder>(
    model: &ImpossibleXorDifferentialModel<E>,
    options: &SearchOptions,
) -> Result<SearchResult, PipelineError> {
    let mut solver = options.minizinc_solver();
    find_all_impossible_xor_differential_trails_with(model, options, &mut solver)
}

pub fn find_one_impossible_xor_differential_trail_with<E, S>(
    model: &ImpossibleXorDifferentialModel<E>,
    options: &SearchOptions,
    solver: &mut S,
) -> Result<SearchResult, PipelineError>
where
    E: TruncatedEncoder,
    S: CpSolver,
{
    run_search(
        model,
        options,
        solver,
        ModelType::ImpossibleXorDifferentialOneSolution,
        SolveMode::FirstSolution,
    )
}

pub fn find_all_impossible_xor_differential_trails_with<E, S>(
    model: &ImpossibleXorDifferentialModel<E>,
    options: &SearchOptions,
    solver: &mut S,
) -> Result<SearchResult, PipelineError>
where
    E: TruncatedEncoder,
    S: CpSolver,
{
    run_search(
        model,
        options,
        solver,
        ModelType::ImpossibleXorDifferential,
        SolveMode::AllSolutions,
    )
}

fn run_search<E, S>(
    model: &ImpossibleXorDifferentialModel<E>,
    options: &SearchOptions,
    solver: &mut S,
    model_type: ModelType,
    mode: SolveMode,
) -> Result<SearchResult, PipelineError>
where
    E: TruncatedEncoder,
    S: CpSolver,
{
    let cipher_id = model.cipher().id.clone();
    info!(cipher = %cipher_id, %model_type, "Building impossible-differential model...");
    let built = model.build(&options.build_request())?;
    if !built.is_complete() {
        warn!(
            skipped = built.skipped().count(),
            "Model is incomplete; unsupported components were left out"
        );
    }

    if let Some(path) = &options.dump_model {
        match dump_model(&built, path) {
            Ok(()) => info!("Model dump written to {}", path.display()),
            Err(e) => warn!("could not write model dump to {}: {e}", path.display()),
        }
    }

    info!(solver = solver.name(), ?mode, "Solving...");
    let output = solver
        .solve(&built.to_minizinc(), mode)
        .map_err(|e| PipelineError::Solver(e.to_string()))?;

    let interpretation =
        model.parse_solver_output(&built.layout, output.lines.as_slice(), model_type);
    info!(
        status = ?interpretation.status,
        solutions = interpretation.record.non_empty_count(),
        extracted = interpretation.extracted,
        "Solver output interpreted"
    );
    Ok(SearchResult::new(
        cipher_id,
        solver.name(),
        &built,
        interpretation,
    ))
}
