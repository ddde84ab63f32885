//! Tabular result types shared by the processing collaborator, the storage
//! layer and the HTTP views.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// One flat record of a scene table: column name to scalar value.
///
/// Column order is significant and preserved through storage.
pub type TableRow = IndexMap<String, Value>;

/// An ordered sequence of records as produced by a [`ScriptProcessor`].
///
/// [`ScriptProcessor`]: crate::processing::ScriptProcessor
pub type SceneTable = Vec<TableRow>;

/// Column names in first-seen order across all rows.
pub fn column_names(rows: &[TableRow]) -> Vec<String> {
    let mut columns: IndexSet<&str> = IndexSet::new();
    for row in rows {
        columns.extend(row.keys().map(String::as_str));
    }
    columns.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> TableRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn column_names_follow_first_seen_order() {
        let rows = vec![
            row(&[("scene_number", json!(1)), ("location", json!("Office"))]),
            row(&[("location", json!("Street")), ("props", json!("Car"))]),
        ];

        assert_eq!(column_names(&rows), vec!["scene_number", "location", "props"]);
    }

    #[test]
    fn column_names_of_empty_table() {
        assert!(column_names(&[]).is_empty());
    }
}
