use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use super::{write_table_xlsx, ScriptProcessor};
use crate::table::{SceneTable, TableRow};

pub const SCENE_COLUMNS: [&str; 7] = [
    "scene_number",
    "location",
    "time_of_day",
    "main_characters",
    "extras",
    "props",
    "special_effects",
];

/// Stand-in for a real script analysis pipeline.
///
/// Ignores the extracted files and always returns the same three scenes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleSceneProcessor;

impl SampleSceneProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn sample_table() -> SceneTable {
        vec![
            scene(1, "Кабинет", "День", "Иван, Мария", "Секретарь", "Стол, ноутбук", "Нет"),
            scene(2, "Улица", "Ночь", "Петр, Анна", "Прохожие", "Автомобиль", "Дым-машина"),
            scene(3, "Кафе", "Утро", "Мария, Анна", "Официанты, клиенты", "Чашки, меню", "Нет"),
        ]
    }
}

fn scene(
    number: u32,
    location: &str,
    time_of_day: &str,
    main_characters: &str,
    extras: &str,
    props: &str,
    special_effects: &str,
) -> TableRow {
    let values = [
        json!(number),
        json!(location),
        json!(time_of_day),
        json!(main_characters),
        json!(extras),
        json!(props),
        json!(special_effects),
    ];
    SCENE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .zip(values)
        .collect()
}

impl ScriptProcessor for SampleSceneProcessor {
    fn process(&self, extracted_dir: &Path, output_path: &Path) -> Result<SceneTable> {
        debug!("Sample processing of {}", extracted_dir.display());
        let table = Self::sample_table();
        write_table_xlsx(&table, output_path)?;
        Ok(table)
    }
}
