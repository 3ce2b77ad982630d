#![doc = include_str!("../README.md")]

//! Meet-in-the-middle constraint model for impossible-differential search.
//!
//! This crate encodes cipher components as truncated-differential
//! constraints, joins a forward and a backward half-model under separate
//! namespaces, prints the result as MiniZinc, and interprets what the
//! solver prints back.

pub mod backends;
pub mod encoder;
pub mod finalize;
pub mod half_model;
pub mod incompatibility;
pub mod items;
pub mod model;
pub mod output;
pub mod rewrite;
pub mod solver;
pub mod terms;
#[cfg(any(test, feature = "toy"))]
pub mod toy;

pub use encoder::{ComponentEncoding, Direction, EncodingError, SboxTable, TruncatedEncoder};
pub use half_model::{ComponentOutcome, ComponentReport};
pub use model::{
    AssembledModel, BuildRequest, ImpossibleXorDifferentialModel, ModelError, SearchLayout,
};
pub use output::{
    ComponentValue, Interpretation, ModelType, Solution, SolutionRecord, SolveStatus,
    SolverStatistics,
};
pub use solver::{CpSolver, SolveMode, SolverOutput};
