use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Desired plugin set for one target application.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Base URL of the target application, e.g. `https://jira.example.com`.
    pub url: String,
    /// Entries are reconciled in this order.
    pub config: Vec<TargetEntry>,
}

/// One desired plugin key + version pairing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetEntry {
    pub key: String,
    pub version: String,
}

#[cfg(test)]
impl TargetEntry {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let manifest = Manifest::parse(
            r#"{
                "url": "https://jira.example.com",
                "config": [
                    {"key": "com.example.b", "version": "2.0.0"},
                    {"key": "com.example.a", "version": "1.4.1"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.url, "https://jira.example.com");
        assert_eq!(
            manifest.config,
            vec![
                TargetEntry::new("com.example.b", "2.0.0"),
                TargetEntry::new("com.example.a", "1.4.1"),
            ]
        );
    }

    #[test]
    fn entry_without_version_is_rejected() {
        let raw = r#"{"url": "https://x", "config": [{"key": "com.example.a"}]}"#;
        assert!(Manifest::parse(raw).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("config.json")).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
