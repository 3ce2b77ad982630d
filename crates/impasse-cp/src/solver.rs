/// How many solutions the solver is asked to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    FirstSolution,
    AllSolutions,
}

/// Raw printed output of one solver run, one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverOutput {
    pub lines: Vec<String>,
}

impl SolverOutput {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

/// Abstract constraint solver interface: takes a complete model text and
/// returns whatever the solver printed.
pub trait CpSolver {
    type Error: std::error::Error;

    /// Name reported in search results.
    fn name(&self) -> &str;

    /// Solve the model and collect its printed output.
    fn solve(&mut self, model: &str, mode: SolveMode) -> Result<SolverOutput, Self::Error>;
}
