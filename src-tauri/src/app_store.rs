use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{item_data::ItemData, settings::AppSettings};

pub const SETTINGS_KEY: &str = "settings";
pub const ITEM_DATA_KEY: &str = "itemData";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store key must not be empty.")]
    EmptyKey,
    #[error("Value for '{key}' does not match the expected record: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("Failed to persist store {path}: {reason}")]
    Persist { path: String, reason: String },
    #[error("Failed to read store {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Store lock poisoned.")]
    Poisoned,
}

fn default_document() -> Map<String, Value> {
    let mut document = Map::new();
    document.insert(
        SETTINGS_KEY.to_string(),
        serde_json::to_value(AppSettings::default()).unwrap_or(Value::Null),
    );
    document.insert(
        ITEM_DATA_KEY.to_string(),
        serde_json::to_value(ItemData::default()).unwrap_or(Value::Null),
    );
    document
}

/// JSON key-value store holding the `settings` and `itemData` records.
///
/// Every `set` rewrites the whole document through a temp file and rename,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct AppStore {
    path: PathBuf,
    document: Mutex<Map<String, Value>>,
}

impl AppStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut document = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    log::warn!(
                        "[store] {} has non-object root; resetting to defaults",
                        path.display()
                    );
                    quarantine_corrupt_file(&path);
                    Map::new()
                }
                Err(error) => {
                    log::warn!(
                        "[store] failed to parse {}: {}. resetting to defaults",
                        path.display(),
                        error
                    );
                    quarantine_corrupt_file(&path);
                    Map::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let loaded = document.clone();
        for (key, value) in default_document() {
            if !document.contains_key(&key) {
                document.insert(key, value);
            }
        }
        for root in [SETTINGS_KEY, ITEM_DATA_KEY] {
            if let Err(error) = normalize_known_record(&mut document, root) {
                log::warn!("[store] {error}, resetting '{root}' to defaults");
                if let Some(value) = default_document().remove(root) {
                    document.insert(root.to_string(), value);
                }
            }
        }
        let filled_defaults = document != loaded;

        let store = Self {
            path,
            document: Mutex::new(document),
        };
        if filled_defaults {
            let document = store.document.lock().map_err(|_| StoreError::Poisoned)?;
            store.persist(&document)?;
        }
        log::info!("[store] initialized app data store at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a value by key; dotted keys walk into nested objects.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let segments = split_key(key)?;
        let document = self.document.lock().map_err(|_| StoreError::Poisoned)?;

        let (first, rest) = segments.split_first().ok_or(StoreError::EmptyKey)?;
        let mut current = match document.get(*first) {
            Some(value) => value,
            None => return Ok(None),
        };
        for segment in rest {
            current = match current.get(*segment) {
                Some(value) => value,
                None => return Ok(None),
            };
        }
        Ok(Some(current.clone()))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let segments = split_key(key)?;
        let mut document = self.document.lock().map_err(|_| StoreError::Poisoned)?;

        let mut next = document.clone();
        insert_path(&mut next, &segments, value);
        normalize_known_record(&mut next, segments[0])?;

        self.persist(&next)?;
        *document = next;
        Ok(())
    }

    pub fn settings(&self) -> Result<AppSettings, StoreError> {
        let value = self.get(SETTINGS_KEY)?.unwrap_or(Value::Null);
        decode_record::<AppSettings>(SETTINGS_KEY, value)
    }

    pub fn set_settings(&self, settings: &AppSettings) -> Result<(), StoreError> {
        let value = encode_record(SETTINGS_KEY, settings)?;
        self.set(SETTINGS_KEY, value)
    }

    pub fn item_data(&self) -> Result<ItemData, StoreError> {
        let value = self.get(ITEM_DATA_KEY)?.unwrap_or(Value::Null);
        ItemData::from_value(value).map_err(|error| StoreError::InvalidValue {
            key: ITEM_DATA_KEY.to_string(),
            reason: error.to_string(),
        })
    }

    pub fn set_item_data(&self, item: &ItemData) -> Result<(), StoreError> {
        let mut item = item.clone();
        item.normalize();
        let value = encode_record(ITEM_DATA_KEY, &item)?;
        self.set(ITEM_DATA_KEY, value)
    }

    fn persist(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        let persist_error = |reason: String| StoreError::Persist {
            path: self.path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| persist_error(error.to_string()))?;
        }
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|error| persist_error(error.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized).map_err(|error| persist_error(error.to_string()))?;
        fs::rename(&temp_path, &self.path).map_err(|error| persist_error(error.to_string()))
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = key.trim().split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::EmptyKey);
    }
    Ok(segments)
}

fn insert_path(document: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = document;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Replaces a typed root with its decoded and normalized form, so raw reads
/// see the same record the typed accessors return.
fn normalize_known_record(
    document: &mut Map<String, Value>,
    root: &str,
) -> Result<(), StoreError> {
    let value = document.get(root).cloned().unwrap_or(Value::Null);
    let normalized = match root {
        SETTINGS_KEY => {
            let settings = decode_record::<AppSettings>(SETTINGS_KEY, value)?;
            encode_record(SETTINGS_KEY, &settings)?
        }
        ITEM_DATA_KEY => {
            let item = ItemData::from_value(value).map_err(|error| StoreError::InvalidValue {
                key: ITEM_DATA_KEY.to_string(),
                reason: error.to_string(),
            })?;
            encode_record(ITEM_DATA_KEY, &item)?
        }
        _ => return Ok(()),
    };
    document.insert(root.to_string(), normalized);
    Ok(())
}

fn decode_record<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|error| StoreError::InvalidValue {
        key: key.to_string(),
        reason: error.to_string(),
    })
}

fn encode_record<T: serde::Serialize>(key: &str, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|error| StoreError::InvalidValue {
        key: key.to_string(),
        reason: error.to_string(),
    })
}

fn quarantine_corrupt_file(path: &Path) {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let mut backup = path.as_os_str().to_owned();
    backup.push(format!(".corrupt-{stamp}"));
    if let Err(error) = fs::rename(path, &backup) {
        log::warn!(
            "[store] failed to move corrupt store {} aside: {}",
            path.display(),
            error
        );
    }
}
