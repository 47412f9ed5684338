//! POI table resolution.
//!
//! Labels referencing a POI table get their final visibility and zoom range
//! from that table. Tables load asynchronously; until then such labels are
//! not ready for placement.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::element::TextElement;
use crate::error::LabelResult;
use crate::loading::LoadSignal;

/// Display overrides for one POI. `None` keeps the element's own value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiDisplayRule {
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub min_zoom: Option<f32>,
    #[serde(default)]
    pub max_zoom: Option<f32>,
}

impl PoiDisplayRule {
    /// Effective `(visible, min_zoom, max_zoom)` for `element`.
    pub fn apply(&self, element: &TextElement) -> (bool, f32, f32) {
        (
            element.visible && self.visible.unwrap_or(true),
            self.min_zoom.unwrap_or(element.min_zoom),
            self.max_zoom.unwrap_or(element.max_zoom),
        )
    }
}

/// Resolves display rules for labels with a POI reference.
pub trait PoiTableResolver {
    /// Rule for `element`, or `None` while the table it needs is not loaded.
    fn update_poi_from_poi_table(&self, element: &TextElement) -> Option<PoiDisplayRule>;

    /// Loads the resolver depends on, for readiness reporting.
    fn load_signals(&self) -> Vec<Arc<LoadSignal>> {
        Vec::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoiEntry {
    name: String,
    #[serde(default)]
    alt_names: Vec<String>,
    #[serde(flatten)]
    rule: PoiDisplayRule,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoiTableJson {
    poi_list: Vec<PoiEntry>,
}

/// In-memory POI table filled once its JSON arrives.
#[derive(Debug)]
pub struct PoiTable {
    name: String,
    rules: RwLock<HashMap<String, PoiDisplayRule>>,
    signal: Arc<LoadSignal>,
}

impl PoiTable {
    /// A table whose contents are still loading.
    pub fn pending(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new(Self {
            signal: LoadSignal::new(format!("poi-table:{name}")),
            name,
            rules: RwLock::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signal(&self) -> &Arc<LoadSignal> {
        &self.signal
    }

    /// Fill the table from JSON (`{"poiList": [{"name": .., "visible": ..}]}`)
    /// and mark it loaded. A parse failure fails the load signal.
    pub fn load_json(&self, json: &str) -> LabelResult<usize> {
        let parsed: PoiTableJson = match serde_json::from_str(json) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.signal.fail(e.to_string());
                return Err(e.into());
            }
        };

        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        for entry in parsed.poi_list {
            for alt in &entry.alt_names {
                rules.insert(alt.clone(), entry.rule);
            }
            rules.insert(entry.name, entry.rule);
        }
        let count = rules.len();
        drop(rules);

        log::debug!("poi table '{}' loaded with {} entries", self.name, count);
        self.signal.complete();
        Ok(count)
    }

    /// Rule for a POI name; unknown names get no overrides.
    pub fn rule(&self, poi_name: &str) -> PoiDisplayRule {
        self.rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(poi_name)
            .copied()
            .unwrap_or_default()
    }
}

/// Named POI tables.
#[derive(Debug, Default)]
pub struct PoiTables {
    tables: HashMap<String, Arc<PoiTable>>,
}

impl PoiTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Arc<PoiTable>) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PoiTable>> {
        self.tables.get(name)
    }
}

impl PoiTableResolver for PoiTables {
    fn update_poi_from_poi_table(&self, element: &TextElement) -> Option<PoiDisplayRule> {
        let Some(poi) = &element.poi else {
            return Some(PoiDisplayRule::default());
        };
        let table = self.tables.get(&poi.table)?;
        if !table.signal().is_ready() {
            return None;
        }
        Some(table.rule(&poi.name))
    }

    fn load_signals(&self) -> Vec<Arc<LoadSignal>> {
        self.tables.values().map(|t| Arc::clone(t.signal())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKey, GlyphRun, LabelContent};
    use glam::Vec3;

    const TABLE: &str = r#"{
        "poiList": [
            { "name": "cafe", "altNames": ["coffee"], "minZoom": 15 },
            { "name": "bench", "visible": false }
        ]
    }"#;

    fn poi_element(name: &str) -> TextElement {
        TextElement::point(
            ElementKey(1),
            LabelContent::Glyphs(GlyphRun::approximate(name, 12.0)),
            Vec3::ZERO,
        )
        .with_poi("city", name)
    }

    #[test]
    fn test_not_ready_until_loaded() {
        let table = PoiTable::pending("city");
        let mut tables = PoiTables::new();
        tables.insert(Arc::clone(&table));

        assert!(tables.update_poi_from_poi_table(&poi_element("cafe")).is_none());
        assert_eq!(table.load_json(TABLE).unwrap(), 3);

        let rule = tables.update_poi_from_poi_table(&poi_element("coffee")).unwrap();
        assert_eq!(rule.min_zoom, Some(15.0));
        let (visible, _, _) = tables
            .update_poi_from_poi_table(&poi_element("bench"))
            .unwrap()
            .apply(&poi_element("bench"));
        assert!(!visible);
    }

    #[test]
    fn test_unknown_table_is_never_ready() {
        let tables = PoiTables::new();
        assert!(tables.update_poi_from_poi_table(&poi_element("cafe")).is_none());
    }

    #[test]
    fn test_bad_json_fails_signal() {
        let table = PoiTable::pending("city");
        assert!(table.load_json("{").is_err());
        assert!(!table.signal().is_loading());
        assert!(table.signal().failure().is_some());
    }
}
