//! Text codec for the `data_json` column.
//!
//! Encoding is strict; decoding never fails and degrades an unreadable
//! payload to an empty table so a single bad row cannot break history reads.

use tracing::warn;

use crate::table::SceneTable;

pub fn encode(rows: &SceneTable) -> Result<String, serde_json::Error> {
    serde_json::to_string(rows)
}

pub fn decode(text: &str) -> SceneTable {
    match serde_json::from_str(text) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Discarding unparseable table payload: {}", e);
            Vec::new()
        }
    }
}
