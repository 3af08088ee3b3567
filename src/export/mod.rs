//! Export formats: critical-path CSV, calendar ICS, project JSON bundle.

mod bundle;
mod csv;
mod ics;

pub use bundle::{project_bundle, ProjectBundle};
pub use csv::critical_path_csv;
pub use ics::calendar_ics;
