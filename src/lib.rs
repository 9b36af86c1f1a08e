//! Ergo Survey: musculoskeletal hazard surveys (근골격계 유해요인조사)
//!
//! Records the regulatory burden-task checklist and the per-unit survey
//! forms of a workplace, keeps them as sessions in xlsx workbooks or an
//! embedded database, and exports the deliverable report workbook.

pub mod cli;
pub mod core;
pub mod entities;
pub mod persist;
pub mod report;
