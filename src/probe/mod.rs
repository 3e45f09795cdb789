//! The per-instance probe pipeline and its orchestration across the run.

pub mod fetch;
pub mod runner;
pub mod versions;
