//! Forma serializable de una sesión.
//!
//! El JSON usa camelCase para que el host lo entienda tal cual:
//!
//! ```json
//! { "timestamp": "...", "schemaVersion": 1,
//!   "course": { "lessonId": "...", "progress": 0.5, "isComplete": false },
//!   "navigation": { "activeModuleIndex": 1, "activeModuleId": "m1" },
//!   "inventory": { "collectedIds": ["map"] },
//!   "modules": { "m1": { "currentStep": 2, ... } } }
//! ```
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::constants::SNAPSHOT_SCHEMA_VERSION;
use crate::runner::{RestorePlan, RestoreToken};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub lesson_id: String,
    /// Fracción en [0, 1].
    pub progress: f64,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub active_module_index: i64,
    #[serde(default)]
    pub active_module_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryState {
    #[serde(default)]
    pub collected_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub schema_version: u32,
    pub course: CourseProgress,
    pub navigation: NavigationState,
    #[serde(default)]
    pub inventory: InventoryState,
    /// Estado por id de módulo. Sólo el módulo vivo al capturar aparece aquí.
    #[serde(default)]
    pub modules: BTreeMap<String, Value>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")] Malformed(String),
    #[error("unsupported schema version {found} (expected {expected})")] SchemaVersion { found: u32, expected: u32 },
    #[error("snapshot belongs to lesson '{found}', loaded lesson is '{expected}'")]
    LessonMismatch { found: String, expected: String },
    #[error("module index {index} outside 0..={max}")] InvalidIndex { index: i64, max: i64 },
    #[error("no lesson loaded")] NoLesson,
}

impl SessionSnapshot {
    pub fn from_slice(raw: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: SessionSnapshot =
            serde_json::from_slice(raw).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        snapshot.check_schema()?;
        Ok(snapshot)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(self).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    pub fn check_schema(&self) -> Result<(), SnapshotError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::SchemaVersion { found: self.schema_version,
                                                      expected: SNAPSHOT_SCHEMA_VERSION });
        }
        if !(0.0..=1.0).contains(&self.course.progress) {
            return Err(SnapshotError::Malformed(format!("progress {} outside [0, 1]", self.course.progress)));
        }
        if self.navigation.active_module_index < -1 {
            return Err(SnapshotError::InvalidIndex { index: self.navigation.active_module_index,
                                                     max: i64::MAX });
        }
        Ok(())
    }

    /// Un token por módulo guardado.
    pub fn restore_tokens(&self) -> Vec<RestoreToken> {
        self.modules
            .iter()
            .map(|(module_id, state)| RestoreToken { module_id: module_id.clone(),
                                                     state: state.clone() })
            .collect()
    }

    pub fn restore_plan(&self, index: i64) -> RestorePlan {
        RestorePlan { index,
                      tokens: self.restore_tokens() }
    }
}

/// `clamp(index, 0, n) / n`; 1.0 al terminar. Una lección vacía sin terminar
/// vale 0.
pub fn progress_fraction(index: i64, module_count: usize, finished: bool) -> f64 {
    if finished {
        return 1.0;
    }
    if module_count == 0 {
        return 0.0;
    }
    index.clamp(0, module_count as i64) as f64 / module_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_shape_is_camel_case() {
        let snap = SessionSnapshot { timestamp: DateTime::<Utc>::UNIX_EPOCH,
                                     schema_version: SNAPSHOT_SCHEMA_VERSION,
                                     course: CourseProgress { lesson_id: "l".into(),
                                                              progress: 0.5,
                                                              is_complete: false },
                                     navigation: NavigationState { active_module_index: 1,
                                                                   active_module_id: Some("m1".into()) },
                                     inventory: InventoryState { collected_ids: vec!["map".into()] },
                                     modules: BTreeMap::from([("m1".to_string(), json!({ "currentStep": 2 }))]) };
        let v = serde_json::to_value(&snap).expect("json");
        assert_eq!(v["schemaVersion"], json!(1));
        assert_eq!(v["course"]["lessonId"], json!("l"));
        assert_eq!(v["navigation"]["activeModuleIndex"], json!(1));
        assert_eq!(v["inventory"]["collectedIds"], json!(["map"]));
        assert_eq!(snap.restore_plan(1).tokens.len(), 1);
    }

    #[test]
    fn rejects_garbage_and_foreign_schema() {
        assert!(matches!(SessionSnapshot::from_slice(b"{not json"), Err(SnapshotError::Malformed(_))));
        let raw = json!({
            "timestamp": "2024-01-01T00:00:00Z", "schemaVersion": 99,
            "course": { "lessonId": "l", "progress": 0.0, "isComplete": false },
            "navigation": { "activeModuleIndex": -1 }
        });
        let err = SessionSnapshot::from_slice(raw.to_string().as_bytes()).unwrap_err();
        assert_eq!(err, SnapshotError::SchemaVersion { found: 99, expected: 1 });
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_fraction(-1, 4, false), 0.0);
        assert_eq!(progress_fraction(2, 4, false), 0.5);
        assert_eq!(progress_fraction(9, 4, false), 1.0);
        assert_eq!(progress_fraction(0, 0, false), 0.0);
        assert_eq!(progress_fraction(0, 0, true), 1.0);
    }
}
