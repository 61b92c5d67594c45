use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::DocumentFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub document: DocumentConfig,
    pub validation: ValidationConfig,
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub path: Option<PathBuf>,
    pub format: DocumentFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings (dangling references, shape mismatches) as failures
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Items owned by this user are listed first in selectors
    pub current_user: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // agent-config.toml / .yaml / .json, whichever exists
        config = config.add_source(config::File::with_name("agent-config").required(false));

        // AGENT_CONFIG_VALIDATION__STRICT=true, AGENT_CONFIG_DOCUMENT__PATH=...
        config = config.add_source(
            config::Environment::with_prefix("AGENT_CONFIG")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Document path from the command line, falling back to configuration
    pub fn document_path(&self, cli_path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        cli_path
            .or_else(|| self.document.path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no document given; pass a path or set AGENT_CONFIG_DOCUMENT__PATH"
                )
            })
    }
}
