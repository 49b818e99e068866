//! Persisted label table: the bijection between intent names and the class
//! indices the model was trained against.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{info, warn};

use super::error::ClassifierError;

/// Label returned for any index the table does not assign.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Immutable label name ↔ class index mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    by_index: BTreeMap<usize, String>,
    by_label: HashMap<String, usize>,
}

impl LabelMap {
    /// Loads a JSON object of the form `{"open_airlock": 3, ...}` from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ConfigError(format!("Failed to read label table {}: {}", path.display(), e))
        })?;
        let labels = Self::from_json_str(&raw)?;
        info!("Loaded {} labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Parses a label table from its JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ClassifierError> {
        let table: BTreeMap<String, i64> = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::ConfigError(format!("Malformed label table: {}", e)))?;

        let mut pairs = Vec::with_capacity(table.len());
        for (label, index) in table {
            let index = usize::try_from(index).map_err(|_| {
                ClassifierError::ConfigError(format!("Label '{}' has negative index {}", label, index))
            })?;
            pairs.push((label, index));
        }
        Self::from_pairs(pairs)
    }

    /// Builds a label table, rejecting anything that is not a bijection.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut by_index = BTreeMap::new();
        let mut by_label = HashMap::new();

        for (label, index) in pairs {
            let label = label.into();
            if label.trim().is_empty() {
                return Err(ClassifierError::ConfigError("Label names cannot be empty".into()));
            }
            if let Some(existing) = by_index.get(&index) {
                return Err(ClassifierError::ConfigError(format!(
                    "Index {} is assigned to both '{}' and '{}'",
                    index, existing, label
                )));
            }
            if by_label.contains_key(&label) {
                return Err(ClassifierError::ConfigError(format!("Label '{}' appears twice", label)));
            }
            by_label.insert(label.clone(), index);
            by_index.insert(index, label);
        }

        if by_index.is_empty() {
            return Err(ClassifierError::ConfigError("Label table is empty".into()));
        }

        let labels = Self { by_index, by_label };
        if !labels.is_dense() {
            warn!(
                "Label table indices are not contiguous over [0, {}); gaps resolve to '{}'",
                labels.len(),
                UNKNOWN_LABEL
            );
        }
        Ok(labels)
    }

    /// Maps a predicted class index to its label, or [`UNKNOWN_LABEL`].
    pub fn resolve(&self, index: usize) -> &str {
        self.by_index
            .get(&index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// True when the indices are exactly `0..len()`.
    pub fn is_dense(&self) -> bool {
        self.by_index.keys().enumerate().all(|(i, &index)| i == index)
    }

    /// Labels in index order.
    pub fn labels(&self) -> Vec<String> {
        self.by_index.values().cloned().collect()
    }
}
