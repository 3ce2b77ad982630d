use std::io::Write;
use std::process::Command;

use thiserror::Error;

use crate::solver::{CpSolver, SolveMode, SolverOutput};

#[derive(Debug, Error)]
pub enum MiniZincError {
    #[error("minizinc I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("minizinc not found: {0}")]
    NotFound(String),
    #[error("minizinc error: {0}")]
    SolverError(String),
}

/// Runs the `minizinc` driver once per solve on a temporary model file.
pub struct MiniZincSolver {
    command: String,
    solver_name: String,
    timeout_ms: Option<u64>,
}

impl MiniZincSolver {
    pub fn new(solver_name: &str) -> Self {
        Self::with_command_and_timeout("minizinc", solver_name, None)
    }

    pub fn with_timeout_secs(solver_name: &str, timeout_secs: u64) -> Self {
        if timeout_secs == 0 {
            return Self::with_command_and_timeout("minizinc", solver_name, None);
        }
        let timeout_ms = timeout_secs.saturating_mul(1000);
        Self::with_command_and_timeout("minizinc", solver_name, Some(timeout_ms))
    }

    pub fn with_command_and_timeout(cmd: &str, solver_name: &str, timeout_ms: Option<u64>) -> Self {
        Self {
            command: cmd.to_string(),
            solver_name: solver_name.to_string(),
            timeout_ms,
        }
    }

    /// Command-line arguments preceding the model path.
    pub fn args(&self, mode: SolveMode) -> Vec<String> {
        let mut args = vec![
            "--solver-statistics".to_string(),
            "--solver".to_string(),
            self.solver_name.clone(),
        ];
        if mode == SolveMode::AllSolutions {
            args.push("--all-solutions".to_string());
        }
        if let Some(ms) = self.timeout_ms {
            args.push("--time-limit".to_string());
            args.push(ms.to_string());
        }
        args
    }
}

impl CpSolver for MiniZincSolver {
    type Error = MiniZincError;

    fn name(&self) -> &str {
        &self.solver_name
    }

    fn solve(&mut self, model: &str, mode: SolveMode) -> Result<SolverOutput, MiniZincError> {
        let mut file = tempfile::Builder::new()
            .prefix("impasse_")
            .suffix(".mzn")
            .tempfile()?;
        file.write_all(model.as_bytes())?;
        file.flush()?;

        tracing::debug!(
            command = %self.command,
            solver = %self.solver_name,
            path = %file.path().display(),
            "invoking minizinc"
        );

        let output = Command::new(&self.command)
            .args(self.args(mode))
            .arg(file.path())
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    MiniZincError::NotFound(format!("{}: {e}", self.command))
                }
                _ => MiniZincError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MiniZincError::SolverError(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(SolverOutput::from_text(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}
