#![doc = include_str!("../README.md")]

//! Impasse search engine.
//!
//! This crate drives one impossible-differential search end to end:
//! model assembly, optional model dump, solving, output interpretation,
//! and result reporting.

pub mod pipeline;
pub mod result;

pub use pipeline::{PipelineError, SearchOptions, SolverChoice};
pub use result::{SearchResult, SkippedComponent};
