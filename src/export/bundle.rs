//! Whole-project JSON export.
//!
//! A flat document of the project tree (phases, features, items with their
//! scheduling fields and raw dependency text) suitable for re-import or
//! offline inspection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Feature, Item, Phase, Project};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBundle {
    pub project: BundleProject,
    pub phases: Vec<BundlePhase>,
    pub features: Vec<BundleFeature>,
    pub items: Vec<BundleItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleProject {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlePhase {
    pub id: i64,
    pub title: String,
    pub start: NaiveDate,
    pub duration: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFeature {
    pub id: i64,
    pub phase_id: i64,
    pub title: String,
    pub start: NaiveDate,
    pub duration: i64,
    pub deps: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleItem {
    pub id: i64,
    pub feature_id: i64,
    pub title: String,
    pub start: NaiveDate,
    pub duration: i64,
    pub deps: Option<String>,
    pub notes: Option<String>,
}

pub fn project_bundle(
    project: &Project,
    phases: &[Phase],
    features: &[Feature],
    items: &[Item],
) -> ProjectBundle {
    ProjectBundle {
        project: BundleProject {
            id: project.id,
            title: project.title.clone(),
        },
        phases: phases
            .iter()
            .map(|ph| BundlePhase {
                id: ph.id,
                title: ph.title.clone(),
                start: ph.start_date,
                duration: ph.duration,
                notes: ph.notes.clone(),
            })
            .collect(),
        features: features
            .iter()
            .map(|ft| BundleFeature {
                id: ft.id,
                phase_id: ft.phase_id,
                title: ft.title.clone(),
                start: ft.start_date,
                duration: ft.duration,
                deps: ft.dependencies.clone(),
                notes: ft.notes.clone(),
            })
            .collect(),
        items: items
            .iter()
            .map(|it| BundleItem {
                id: it.id,
                feature_id: it.feature_id,
                title: it.title.clone(),
                start: it.start_date,
                duration: it.duration,
                deps: it.dependencies.clone(),
                notes: it.notes.clone(),
            })
            .collect(),
    }
}
