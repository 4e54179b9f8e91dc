use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::merge::{CommentMatch, PlaceholderPrefixes};

/// Tunables for an import run.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Placeholder symbol prefixes an imported name may replace.
    pub placeholder_prefixes: PlaceholderPrefixes,
    /// Category attached to created bookmarks.
    pub bookmark_category: String,
    /// Bookmark description; the source file path is appended.
    pub bookmark_description_prefix: String,
    pub comment_match: CommentMatch,
    /// Compare module names ignoring ASCII case.
    pub ignore_module_case: bool,
    pub import_comments: bool,
    pub import_bookmarks: bool,
    pub import_symbols: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            placeholder_prefixes: PlaceholderPrefixes::default(),
            bookmark_category: "x64dbg".to_string(),
            bookmark_description_prefix: "Imported: ".to_string(),
            comment_match: CommentMatch::Substring,
            ignore_module_case: false,
            import_comments: true,
            import_bookmarks: true,
            import_symbols: true,
        }
    }
}

impl ImportConfig {
    /// Whether a record's module name refers to the program `program`.
    pub fn module_matches(&self, module: &str, program: &str) -> bool {
        if self.ignore_module_case {
            module.eq_ignore_ascii_case(program)
        } else {
            module == program
        }
    }

    pub fn bookmark_description(&self, source: &str) -> String {
        format!("{}{}", self.bookmark_description_prefix, source)
    }
}

/// Load an import config from JSON, or YAML for `.yaml`/`.yml` files.
pub fn load_import_config(path: &Path) -> Result<ImportConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import config at {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let config = if is_yaml {
        serde_yaml::from_str(&body).context("Failed to parse import config YAML")?
    } else {
        serde_json::from_str(&body).context("Failed to parse import config JSON")?
    };
    Ok(config)
}
