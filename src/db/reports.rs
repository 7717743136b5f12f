//! Report taxonomy and nursing-report queries.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument};

use super::{from_millis, to_millis, Database};
use crate::models::report::{ChecklistItem, NursingReport, ReportCategory, TaxonomyNode};

fn category_from_row(row: &SqliteRow) -> Result<ReportCategory> {
    Ok(ReportCategory {
        id: row.try_get("id")?,
        parent_id: row.try_get("parent_id")?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.try_get("id")?,
        category_id: row.try_get("category_id")?,
        phrase: row.try_get("phrase")?,
        position: row.try_get("position")?,
    })
}

fn report_from_row(row: &SqliteRow) -> Result<NursingReport> {
    Ok(NursingReport {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        content: row.try_get("content")?,
        note: row.try_get("note")?,
        written_by: row.try_get("written_by")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

fn build_subtree(
    parent_id: Option<&str>,
    categories: &[ReportCategory],
    items: &[ChecklistItem],
) -> Vec<TaxonomyNode> {
    let mut level: Vec<&ReportCategory> = categories
        .iter()
        .filter(|c| c.parent_id.as_deref() == parent_id)
        .collect();
    level.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

    level
        .into_iter()
        .map(|category| {
            let mut own_items: Vec<ChecklistItem> = items
                .iter()
                .filter(|i| i.category_id == category.id)
                .cloned()
                .collect();
            own_items.sort_by_key(|i| i.position);

            TaxonomyNode {
                category: category.clone(),
                items: own_items,
                children: build_subtree(Some(&category.id), categories, items),
            }
        })
        .collect()
}

impl Database {
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_report_category(&self, category: &ReportCategory) -> Result<()> {
        sqlx::query(
            "INSERT INTO report_categories (id, parent_id, name, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&category.id)
        .bind(&category.parent_id)
        .bind(&category.name)
        .bind(category.position)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn list_report_categories(&self) -> Result<Vec<ReportCategory>> {
        let rows = sqlx::query("SELECT * FROM report_categories ORDER BY position, name")
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self, item), fields(category_id = %item.category_id))]
    pub async fn create_checklist_item(&self, item: &ChecklistItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO checklist_items (id, category_id, phrase, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.category_id)
        .bind(&item.phrase)
        .bind(item.position)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn list_checklist_items(&self) -> Result<Vec<ChecklistItem>> {
        let rows = sqlx::query("SELECT * FROM checklist_items ORDER BY position")
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(item_from_row).collect()
    }

    /// The full category tree with items, for the report-entry UI.
    pub async fn get_report_taxonomy(&self) -> Result<Vec<TaxonomyNode>> {
        let categories = self.list_report_categories().await?;
        let items = self.list_checklist_items().await?;
        Ok(build_subtree(None, &categories, &items))
    }

    #[instrument(skip(self, report, checked_item_ids), fields(patient_id = %report.patient_id))]
    pub async fn create_nursing_report(
        &self,
        report: &NursingReport,
        checked_item_ids: &[String],
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO nursing_reports (id, patient_id, content, note, written_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&report.id)
        .bind(&report.patient_id)
        .bind(&report.content)
        .bind(&report.note)
        .bind(&report.written_by)
        .bind(to_millis(report.created_at))
        .execute(&mut *tx)
        .await?;

        for item_id in checked_item_ids {
            sqlx::query("INSERT INTO report_checked_items (report_id, item_id) VALUES (?, ?)")
                .bind(&report.id)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!("Nursing report stored for patient {}", report.patient_id);
        Ok(())
    }

    pub async fn list_nursing_reports(&self, patient_id: &str) -> Result<Vec<NursingReport>> {
        let rows = sqlx::query(
            "SELECT * FROM nursing_reports WHERE patient_id = ? ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(report_from_row).collect()
    }
}
