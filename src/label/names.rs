//! Display names for node titles.

use crate::utils::error::ParseError;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct NameEntry {
    en_name: String,
    ko_name: String,
}

/// Localized titles keyed by module type name
///
/// Unknown kinds fall back to the kind itself.
#[derive(Debug, Clone, Default)]
pub struct DisplayNames {
    names: HashMap<String, String>,
}

impl DisplayNames {
    /// Load a JSON list of `{"en_name": ..., "ko_name": ...}` entries
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let entries: Vec<NameEntry> = serde_json::from_reader(std::io::BufReader::new(file))?;
        debug!("Loaded {} display names from {}", entries.len(), path.display());
        Ok(Self::from_pairs(entries.into_iter().map(|e| (e.en_name, e.ko_name))))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: pairs.into_iter().collect(),
        }
    }

    pub fn title(&self, kind: &str) -> String {
        self.names
            .get(kind)
            .cloned()
            .unwrap_or_else(|| kind.to_string())
    }

    /// Title for a synthetic kind with a built-in default
    pub fn title_or(&self, kind: &str, default: &str) -> String {
        self.names
            .get(kind)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Title of an aggregate node covering `count` assignments
    pub fn aggregate_title(&self, kind: &str, count: usize) -> String {
        format!("{} x {}", self.title(kind), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_and_lookup() {
        let names = DisplayNames::from_pairs([("PlayPrompt".to_string(), "프롬프트 재생".to_string())]);
        assert_eq!(names.title("PlayPrompt"), "프롬프트 재생");
        assert_eq!(names.title("Dial"), "Dial");
        assert_eq!(names.aggregate_title("SetAttributes", 3), "SetAttributes x 3");
        assert_eq!(names.title_or("xray", "Lambda trace"), "Lambda trace");
    }

    #[test]
    fn test_load_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"[{"en_name": "Dial", "ko_name": "전화 걸기"}]"#).unwrap();
        let names = DisplayNames::load(file.path()).unwrap();
        assert_eq!(names.title("Dial"), "전화 걸기");
    }
}
