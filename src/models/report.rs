//! Nursing reports and the checklist taxonomy they are generated from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Node in the report-category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCategory {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub position: i64,
}

/// One tickable phrase under a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub category_id: String,
    pub phrase: String,
    pub position: i64,
}

/// A finished report with its composed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NursingReport {
    pub id: String,
    pub patient_id: String,
    pub content: String,
    pub note: Option<String>,
    pub written_by: String,
    pub created_at: DateTime<Utc>,
}

/// Category with its items and children, for taxonomy responses.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyNode {
    #[serde(flatten)]
    pub category: ReportCategory,
    pub items: Vec<ChecklistItem>,
    pub children: Vec<TaxonomyNode>,
}
