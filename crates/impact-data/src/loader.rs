//! Format detection, file discovery and the loading pipeline.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use impact_core::config::{BlockRegistry, ConfigError, ReactorBlockConfig, RegistryBuilder, Rules};

/// Base name of the block list file.
pub const REACTORS_FILE: &str = "reactors";

/// Base name of the rules file.
pub const RULES_FILE: &str = "rules";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The data parsed but a value is out of range or a name repeats.
    #[error("invalid data in {file}: {source}")]
    Invalid {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists and `ConflictingFormats` if more than
/// one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so there the list is
/// read from `toml_key`; RON and JSON files are the list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything a world needs from the data directory.
#[derive(Debug, Clone)]
pub struct ReactorData {
    pub registry: BlockRegistry,
    pub rules: Rules,
}

/// Load and validate block types and rules from `dir`.
pub fn load_reactor_data(dir: &Path) -> Result<ReactorData, DataLoadError> {
    let blocks_path = require_data_file(dir, REACTORS_FILE)?;
    let blocks: Vec<ReactorBlockConfig> = deserialize_list(&blocks_path, REACTORS_FILE)?;

    let mut builder = RegistryBuilder::new();
    for block in blocks {
        builder
            .register(block)
            .map_err(|source| DataLoadError::Invalid {
                file: blocks_path.clone(),
                source,
            })?;
    }
    let registry = builder.build();

    let rules = match find_data_file(dir, RULES_FILE)? {
        Some(path) => {
            let rules: Rules = deserialize_file(&path)?;
            rules
                .validate()
                .map_err(|source| DataLoadError::Invalid { file: path, source })?;
            rules
        }
        None => Rules::default(),
    };

    tracing::info!(
        dir = %dir.display(),
        blocks = registry.len(),
        explosions = rules.explosions_enabled,
        time_scale = rules.time_scale,
        "loaded reactor data"
    );
    Ok(ReactorData { registry, rules })
}

// ===========================================================================
// Tests
// ===========================================================================
