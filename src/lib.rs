//! Planboard: a project-planning server.
//!
//! Work is organized as Projects → Phases → Features → Items, each carrying a
//! start date, a duration in days, and (for features and items) free-text
//! dependency references. The [`schedule`] module is the scheduling engine:
//! dependency parsing, critical-path computation, and the cascade that
//! propagates date shifts to dependents while keeping children inside their
//! parents' windows. [`db`] persists the plan in SQLite and applies engine
//! output transactionally; [`api`] exposes everything over HTTP.

pub mod api;
pub mod db;
pub mod export;
pub mod models;
pub mod schedule;
