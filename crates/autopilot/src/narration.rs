use std::collections::HashMap;
use std::path::Path;

use crate::error::AutopilotError;

/// Supplies the expected spoken content of each slide.
pub trait NarrationProvider: Send + Sync + 'static {
    fn narration(&self, slide: u32) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticNarration(HashMap<u32, String>);

impl StaticNarration {
    pub fn new(entries: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<HashMap<u32, String>>(json).map(Self)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AutopilotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutopilotError::Narration(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
            .map_err(|e| AutopilotError::Narration(format!("{}: {e}", path.display())))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl NarrationProvider for StaticNarration {
    fn narration(&self, slide: u32) -> Option<String> {
        self.0.get(&slide).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slide_keyed_json() {
        let narration =
            StaticNarration::from_json(r#"{"0": "welcome everyone", "2": "quarterly numbers"}"#)
                .unwrap();
        assert_eq!(narration.len(), 2);
        assert_eq!(narration.narration(2).as_deref(), Some("quarterly numbers"));
        assert_eq!(narration.narration(1), None);
    }

    #[test]
    fn rejects_non_numeric_keys() {
        assert!(StaticNarration::from_json(r#"{"intro": "hi"}"#).is_err());
    }
}
