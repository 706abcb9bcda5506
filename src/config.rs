use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::manifest::{PatchOptions, PathRewrite};
use crate::models::{Identifier, LogicalFile, PathStyle};
use crate::store::DEFAULT_BACKUP_SUFFIX;

const APP_NAME: &str = "pbxpatch";
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming the manifest when neither the command line nor
/// the config file does.
pub const MANIFEST_ENV: &str = "PBXPATCH_MANIFEST";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatchConfig {
    /// Path to `project.pbxproj`.
    pub manifest: Option<PathBuf>,
    /// Backup goes to `<manifest>.<backup_suffix>`.
    pub backup_suffix: String,
    pub path_style: PathStyle,
    pub register_groups: bool,
    /// Identifier of the sources build phase, for manifests with several.
    pub build_phase: Option<String>,
    /// Files to register.
    pub files: Vec<String>,
    /// Path rewrites for `pbxpatch rewrite`.
    pub rewrites: Vec<PathRewrite>,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            path_style: PathStyle::AsGiven,
            register_groups: false,
            build_phase: None,
            files: Vec::new(),
            rewrites: Vec::new(),
        }
    }
}

impl PatchConfig {
    /// Load configuration from the user's config directory.
    /// Returns default config if file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load an explicitly named config file. Unlike [`PatchConfig::load`],
    /// a missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save the current configuration to the user's config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// The manifest from the config, falling back to `PBXPATCH_MANIFEST`.
    pub fn manifest_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.manifest {
            return Ok(path.clone());
        }
        std::env::var_os(MANIFEST_ENV)
            .map(PathBuf::from)
            .ok_or_else(|| {
                anyhow::anyhow!("No manifest given: pass --manifest, set it in the config or set {MANIFEST_ENV}")
            })
    }

    pub fn patch_options(&self) -> Result<PatchOptions> {
        let build_phase = match &self.build_phase {
            Some(raw) => Some(
                Identifier::parse(raw)
                    .ok_or_else(|| anyhow::anyhow!("Invalid build phase identifier: {raw}"))?,
            ),
            None => None,
        };

        Ok(PatchOptions {
            path_style: self.path_style,
            register_groups: self.register_groups,
            build_phase,
        })
    }

    pub fn logical_files(&self) -> Result<Vec<LogicalFile>> {
        self.files
            .iter()
            .map(|path| LogicalFile::new(path.as_str()).map_err(anyhow::Error::from))
            .collect()
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
