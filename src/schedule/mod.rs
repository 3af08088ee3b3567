//! The scheduling engine.
//!
//! Pure, in-memory, and persistence-free: the db layer loads a project's
//! parts, hands them to this module, and writes back whatever it says
//! changed. See the submodules:
//!
//! - [`deps`]: free-text dependency parsing
//! - [`graph`]: uniform node assembly and the numeric-id multimap
//! - [`critical_path`]: duration-weighted longest chain
//! - [`cascade`]: reschedule propagation and containment clamps
//! - [`reorder`]: dense sibling positions

pub mod cascade;
pub mod critical_path;
pub mod deps;
mod error;
pub mod graph;
pub mod reorder;

pub use cascade::{reschedule, settle_part, RescheduleOutcome};
pub use critical_path::compute_critical_path;
pub use deps::parse_dependencies;
pub use error::ScheduleError;
pub use graph::{TaskGraph, TaskNode};
pub use reorder::plan_positions;
