//! Scenario files for sortline.
//!
//! A scenario is a TOML file with optional `[log]` and `[collection]` tables
//! and a list of `[[steps]]`:
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [collection]
//! watch_attribute = "score"
//! lock_timeout_ms = 500
//!
//! [[steps]]
//! op = "insert"
//! name = "alice"
//! score = 5
//!
//! [[steps]]
//! op = "set"
//! name = "alice"
//! score = 1
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// A full scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// Collection configuration.
    #[serde(default)]
    pub collection: CollectionSettings,
    /// Operations, applied in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set
    /// (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Collection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSettings {
    /// Only reposition on changes to this attribute ("score" or "label").
    pub watch_attribute: Option<String>,
    /// Give up on a mutation after this many milliseconds.
    pub lock_timeout_ms: Option<u64>,
    /// Highest score first (default: false).
    #[serde(default)]
    pub descending: bool,
}

/// One scenario operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Insert a new entry.
    Insert {
        /// Entry name.
        name: String,
        /// Initial score.
        score: i64,
    },
    /// Remove the entry with this name.
    Remove {
        /// Entry name.
        name: String,
    },
    /// Remove whatever sits at `index`.
    RemoveAt {
        /// Position to remove.
        index: usize,
    },
    /// Put a new entry at `index` without re-sorting.
    ReplaceAt {
        /// Position to overwrite.
        index: usize,
        /// New entry name.
        name: String,
        /// New entry score.
        score: i64,
    },
    /// Change an entry's score; the entry reports the change itself.
    Set {
        /// Entry name.
        name: String,
        /// New score.
        score: i64,
    },
    /// Change an entry's label; never affects the order.
    Relabel {
        /// Entry name.
        name: String,
        /// New label.
        label: String,
    },
    /// Remove everything.
    Clear,
}

impl Step {
    /// The `op` tag as written in the file.
    pub fn op(&self) -> &'static str {
        match self {
            Step::Insert { .. } => "insert",
            Step::Remove { .. } => "remove",
            Step::RemoveAt { .. } => "remove_at",
            Step::ReplaceAt { .. } => "replace_at",
            Step::Set { .. } => "set",
            Step::Relabel { .. } => "relabel",
            Step::Clear => "clear",
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Scenario {
    /// Load and validate a scenario file.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Parse and validate scenario text.
    pub fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents).context("Malformed TOML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check settings and that every step names an entry that was inserted
    /// by an earlier step.
    pub fn validate(&self) -> Result<()> {
        if let Some(attr) = &self.collection.watch_attribute {
            if attr.trim().is_empty() {
                anyhow::bail!("collection.watch_attribute must not be empty");
            }
        }
        if self.collection.lock_timeout_ms == Some(0) {
            anyhow::bail!("collection.lock_timeout_ms must be greater than zero");
        }

        let mut known: HashSet<&str> = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Insert { name, .. } | Step::ReplaceAt { name, .. } => {
                    if !known.insert(name.as_str()) {
                        anyhow::bail!("step {} ({}): name '{}' is already used", i + 1, step.op(), name);
                    }
                }
                Step::Remove { name } | Step::Set { name, .. } | Step::Relabel { name, .. } => {
                    if !known.contains(name.as_str()) {
                        anyhow::bail!("step {} ({}): unknown entry '{}'", i + 1, step.op(), name);
                    }
                }
                Step::RemoveAt { .. } | Step::Clear => {}
            }
        }
        Ok(())
    }

    /// The configured lock wait bound.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.collection.lock_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[log]
level = "debug"

[collection]
watch_attribute = "score"
lock_timeout_ms = 250

[[steps]]
op = "insert"
name = "a"
score = 5

[[steps]]
op = "set"
name = "a"
score = 1

[[steps]]
op = "remove_at"
index = 0

[[steps]]
op = "clear"
"#;

    #[test]
    fn parses_full_scenario() {
        let scenario = Scenario::parse(SAMPLE).unwrap();
        assert_eq!(scenario.log.level, "debug");
        assert_eq!(scenario.collection.watch_attribute.as_deref(), Some("score"));
        assert_eq!(scenario.lock_timeout(), Some(Duration::from_millis(250)));
        assert!(!scenario.collection.descending);
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[0],
            Step::Insert {
                name: "a".into(),
                score: 5
            }
        );
        assert_eq!(scenario.steps[3], Step::Clear);
    }

    #[test]
    fn defaults_apply_to_empty_file() {
        let scenario = Scenario::parse("").unwrap();
        assert_eq!(scenario.log.level, "info");
        assert!(scenario.collection.watch_attribute.is_none());
        assert!(scenario.lock_timeout().is_none());
        assert!(scenario.steps.is_empty());
    }

    #[test]
    fn rejects_unknown_entry() {
        let err = Scenario::parse("[[steps]]\nop = \"set\"\nname = \"ghost\"\nscore = 1\n").unwrap_err();
        assert!(err.to_string().contains("unknown entry 'ghost'"));
    }

    #[test]
    fn rejects_duplicate_name() {
        let text = "[[steps]]\nop = \"insert\"\nname = \"a\"\nscore = 1\n\n[[steps]]\nop = \"insert\"\nname = \"a\"\nscore = 2\n";
        let err = Scenario::parse(text).unwrap_err();
        assert!(err.to_string().contains("already used"));
    }

    #[test]
    fn rejects_empty_watch_attribute() {
        let err = Scenario::parse("[collection]\nwatch_attribute = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("watch_attribute"));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Scenario::parse("[collection]\nlock_timeout_ms = 0\n").is_err());
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(Scenario::parse("[[steps]]\nop = \"shuffle\"\n").is_err());
    }

    #[test]
    fn step_serializes_with_op_tag() {
        let text = toml::to_string(&Scenario {
            steps: vec![Step::RemoveAt { index: 2 }],
            ..Scenario::default()
        })
        .unwrap();
        assert!(text.contains("op = \"remove_at\""));
        assert!(Scenario::parse(&text).is_ok());
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let scenario = Scenario::load(&path).await.unwrap();
        assert_eq!(scenario.steps.len(), 4);
    }

    #[tokio::test]
    async fn load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Scenario::load(&dir.path().join("nope.toml")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read scenario"));
    }
}
