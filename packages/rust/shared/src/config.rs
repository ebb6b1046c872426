//! Application configuration for Clausemap.
//!
//! User config lives at `~/.clausemap/clausemap.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClausemapError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "clausemap.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".clausemap";

// ---------------------------------------------------------------------------
// Config structs (matching clausemap.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Alternate taxonomy / pattern library sources.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Sheet name written into frameworks that lack one.
    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Whether `run` also recomputes concise observations.
    #[serde(default = "default_true")]
    pub summarize: bool,

    /// Whether the ledger stores every extracted obligation.
    #[serde(default)]
    pub persist_obligations: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            sheet: default_sheet(),
            summarize: true,
            persist_obligations: false,
        }
    }
}

fn default_sheet() -> String {
    "Data Protection Framework 1".into()
}
fn default_true() -> bool {
    true
}

/// `[sources]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// TOML file replacing the built-in keyword taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_path: Option<PathBuf>,

    /// TOML file replacing the built-in summarizer pattern library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Framework file to read.
    pub framework_path: PathBuf,
    /// Where the updated framework is written (may equal `framework_path`).
    pub output_path: PathBuf,
    /// Recompute concise observations after merging.
    pub summarize: bool,
    /// Re-extract documents the ledger already knows about.
    pub force: bool,
    /// Store every obligation in the ledger.
    pub persist_obligations: bool,
    /// Sheet name for frameworks that lack one.
    pub sheet: String,
}

impl RunConfig {
    /// Build from the loaded config; `output_path` defaults to the framework itself.
    pub fn new(config: &AppConfig, framework_path: PathBuf, output_path: Option<PathBuf>) -> Self {
        Self {
            output_path: output_path.unwrap_or_else(|| framework_path.clone()),
            framework_path,
            summarize: config.defaults.summarize,
            force: false,
            persist_obligations: config.defaults.persist_obligations,
            sheet: config.defaults.sheet.clone(),
        }
    }

    /// Ledger database location: `<output dir>/.clausemap/ledger.db`.
    pub fn ledger_path(&self) -> PathBuf {
        self.output_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_DIR_NAME)
            .join("ledger.db")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.clausemap/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClausemapError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.clausemap/clausemap.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClausemapError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ClausemapError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClausemapError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClausemapError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClausemapError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that configured source files exist before any document is read.
pub fn validate_sources(config: &AppConfig) -> Result<()> {
    let sources = [
        ("taxonomy_path", config.sources.taxonomy_path.as_ref()),
        ("patterns_path", config.sources.patterns_path.as_ref()),
    ];
    for (key, path) in sources {
        if let Some(path) = path
            && !path.is_file()
        {
            return Err(ClausemapError::config(format!(
                "{key} points to {}, which is not a file",
                path.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sheet"));
        assert!(toml_str.contains("Data Protection Framework 1"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.defaults.summarize);
        assert!(!parsed.defaults.persist_obligations);
        assert!(parsed.sources.taxonomy_path.is_none());
    }

    #[test]
    fn config_with_sources() {
        let toml_str = r#"
[defaults]
summarize = false

[sources]
taxonomy_path = "/etc/clausemap/taxonomy.toml"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(!config.defaults.summarize);
        assert_eq!(
            config.sources.taxonomy_path.as_deref(),
            Some(Path::new("/etc/clausemap/taxonomy.toml"))
        );
        assert!(config.sources.patterns_path.is_none());
    }

    #[test]
    fn run_config_defaults_output_to_framework() {
        let app = AppConfig::default();
        let run = RunConfig::new(&app, PathBuf::from("/data/framework.json"), None);
        assert_eq!(run.output_path, PathBuf::from("/data/framework.json"));
        assert!(run.summarize);
        assert!(!run.force);
        assert_eq!(run.ledger_path(), PathBuf::from("/data/.clausemap/ledger.db"));
    }

    #[test]
    fn missing_source_file_rejected() {
        let mut config = AppConfig::default();
        config.sources.patterns_path = Some(PathBuf::from("/nonexistent/clausemap/patterns.toml"));
        let result = validate_sources(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("patterns_path"));
    }
}
