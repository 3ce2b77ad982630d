#![allow(dead_code)]

use std::io;

use impasse_cp::toy::{toy_cipher, toy_inverse_cipher, ToyEncoder};
use impasse_cp::{CpSolver, ImpossibleXorDifferentialModel, SolveMode, SolverOutput};
use impasse_engine::SearchOptions;

/// Solver stand-in that replays fixed output and records what it was asked.
pub struct ScriptedSolver {
    output: String,
    pub calls: Vec<SolveMode>,
    pub models: Vec<String>,
}

impl ScriptedSolver {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: Vec::new(),
            models: Vec::new(),
        }
    }
}

impl CpSolver for ScriptedSolver {
    type Error = io::Error;

    fn name(&self) -> &str {
        "scripted"
    }

    fn solve(&mut self, model: &str, mode: SolveMode) -> Result<SolverOutput, io::Error> {
        self.calls.push(mode);
        self.models.push(model.to_string());
        Ok(SolverOutput::from_text(&self.output))
    }
}

/// Solver whose process always fails.
pub struct FailingSolver;

impl CpSolver for FailingSolver {
    type Error = io::Error;

    fn name(&self) -> &str {
        "failing"
    }

    fn solve(&mut self, _model: &str, _mode: SolveMode) -> Result<SolverOutput, io::Error> {
        Err(io::Error::other("solver crashed"))
    }
}

pub fn toy_model() -> ImpossibleXorDifferentialModel<ToyEncoder> {
    ImpossibleXorDifferentialModel::new(toy_cipher(), toy_inverse_cipher(), ToyEncoder::text())
}

pub fn search_options() -> SearchOptions {
    SearchOptions {
        timeout_secs: 60,
        ..SearchOptions::default()
    }
}

/// First solution contradicts at `xor_0_2` bit 0; the second is plain.
pub const CONTRADICTING_OUTPUT: &str = "\
plaintext = [1, 0, 0, 0]
key = [0, 0, 0, 0]
inverse_cipher_output_1_2 = [2, 2, 2, 2]
0
inverse_key = [0, 0, 0, 0]
0
inverse_xor_0_2 = [0, 0, 0, 0, 0, 0, 0, 0]
0
----------
plaintext = [0, 0, 0, 1]
key = [0, 0, 0, 0]
----------
%%%mzn-stat: solveTime=0.5
%%%mzn-stat: trailMem=1.25
";
