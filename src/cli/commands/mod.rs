//! CLI command implementations

pub mod checklist;
pub mod completions;
pub mod condition;
pub mod detailed;
pub mod form;
pub mod hazard;
pub mod init;
pub mod overview;
pub mod plan;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod symptom;
