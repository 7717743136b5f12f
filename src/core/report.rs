//! Nursing-report text generation.
//!
//! Reports are composed from the checklist taxonomy: nurses tick items
//! grouped under a category tree, and the generator renders the ticked
//! phrases into the stored report body. Composition is deterministic:
//! categories in position order (children directly after their parent),
//! items in position order within each category.

use std::collections::HashSet;

use crate::models::report::{ChecklistItem, ReportCategory};

/// Renders the report body from the taxonomy and the set of checked
/// item ids. Categories with no checked items are omitted. The optional
/// free-text note is appended as a trailing line.
pub fn compose_report(
    categories: &[ReportCategory],
    items: &[ChecklistItem],
    checked: &HashSet<String>,
    note: Option<&str>,
) -> String {
    let mut roots: Vec<&ReportCategory> =
        categories.iter().filter(|c| c.parent_id.is_none()).collect();
    roots.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

    let mut lines = Vec::new();
    for root in roots {
        push_category_lines(root, categories, items, checked, &mut lines);
    }

    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        lines.push(format!("Note: {}", note));
    }

    lines.join("\n")
}

fn push_category_lines(
    category: &ReportCategory,
    categories: &[ReportCategory],
    items: &[ChecklistItem],
    checked: &HashSet<String>,
    lines: &mut Vec<String>,
) {
    let mut selected: Vec<&ChecklistItem> = items
        .iter()
        .filter(|i| i.category_id == category.id && checked.contains(&i.id))
        .collect();
    selected.sort_by_key(|i| i.position);

    if !selected.is_empty() {
        let phrases: Vec<&str> = selected.iter().map(|i| i.phrase.as_str()).collect();
        lines.push(format!("{}: {}.", category.name, phrases.join(". ")));
    }

    let mut children: Vec<&ReportCategory> = categories
        .iter()
        .filter(|c| c.parent_id.as_deref() == Some(category.id.as_str()))
        .collect();
    children.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
    for child in children {
        push_category_lines(child, categories, items, checked, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, parent: Option<&str>, name: &str, position: i64) -> ReportCategory {
        ReportCategory {
            id: id.into(),
            parent_id: parent.map(Into::into),
            name: name.into(),
            position,
        }
    }

    fn item(id: &str, category: &str, phrase: &str, position: i64) -> ChecklistItem {
        ChecklistItem {
            id: id.into(),
            category_id: category.into(),
            phrase: phrase.into(),
            position,
        }
    }

    fn taxonomy() -> (Vec<ReportCategory>, Vec<ChecklistItem>) {
        let categories = vec![
            category("hygiene", None, "Hygiene", 2),
            category("nutrition", None, "Nutrition", 1),
            category("bathing", Some("hygiene"), "Bathing", 1),
        ];
        let items = vec![
            item("i1", "nutrition", "Ate full breakfast", 1),
            item("i2", "nutrition", "Drank 500ml water", 2),
            item("i3", "hygiene", "Oral care done", 1),
            item("i4", "bathing", "Assisted full bath", 1),
        ];
        (categories, items)
    }

    #[test]
    fn composes_in_category_and_item_order() {
        let (categories, items) = taxonomy();
        let checked: HashSet<String> =
            ["i2", "i1", "i4", "i3"].iter().map(|s| s.to_string()).collect();

        let body = compose_report(&categories, &items, &checked, None);
        assert_eq!(
            body,
            "Nutrition: Ate full breakfast. Drank 500ml water.\n\
             Hygiene: Oral care done.\n\
             Bathing: Assisted full bath."
        );
    }

    #[test]
    fn omits_categories_with_nothing_checked() {
        let (categories, items) = taxonomy();
        let checked: HashSet<String> = ["i4"].iter().map(|s| s.to_string()).collect();

        let body = compose_report(&categories, &items, &checked, None);
        assert_eq!(body, "Bathing: Assisted full bath.");
    }

    #[test]
    fn appends_trimmed_note() {
        let (categories, items) = taxonomy();
        let checked: HashSet<String> = ["i1"].iter().map(|s| s.to_string()).collect();

        let body = compose_report(&categories, &items, &checked, Some("  restless overnight "));
        assert_eq!(
            body,
            "Nutrition: Ate full breakfast.\nNote: restless overnight"
        );
    }

    #[test]
    fn note_only_report_has_no_category_lines() {
        let (categories, items) = taxonomy();
        let body = compose_report(&categories, &items, &HashSet::new(), Some("quiet shift"));
        assert_eq!(body, "Note: quiet shift");
    }

    #[test]
    fn blank_note_is_dropped() {
        let (categories, items) = taxonomy();
        let body = compose_report(&categories, &items, &HashSet::new(), Some("   "));
        assert_eq!(body, "");
    }
}
