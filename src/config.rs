use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Top-level configuration: a workspace root plus one record per account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_workspace")]
    pub workspace: PathBuf,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// One publishing account. `category`/`subtype` select the clip pool,
/// `language` selects the narration pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub language: String,
    pub category: String,
    pub subtype: String,
    #[serde(default = "AccountConfig::default_platforms")]
    pub platforms: Vec<String>,
    /// Voice models for speech synthesis, chosen uniformly per script.
    #[serde(default)]
    pub voices: Vec<PathBuf>,
}

impl Config {
    fn default_workspace() -> PathBuf {
        PathBuf::from(".")
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.accounts.is_empty() {
            return Err(PipelineError::Config("no accounts configured".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            for (field, value) in [
                ("name", &account.name),
                ("language", &account.language),
                ("category", &account.category),
                ("subtype", &account.subtype),
            ] {
                if value.trim().is_empty() {
                    return Err(PipelineError::Config(format!(
                        "account field '{field}' must not be empty"
                    )));
                }
            }
            if !seen.insert(account.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
        }
        Ok(())
    }

    /// Accounts to process, optionally narrowed to a single name.
    pub fn select_accounts(&self, name: Option<&str>) -> PipelineResult<Vec<&AccountConfig>> {
        match name {
            None => Ok(self.accounts.iter().collect()),
            Some(name) => {
                let account = self
                    .accounts
                    .iter()
                    .find(|a| a.name == name)
                    .ok_or_else(|| {
                        PipelineError::Config(format!("no account named '{name}' in config"))
                    })?;
                Ok(vec![account])
            }
        }
    }
}

impl AccountConfig {
    fn default_platforms() -> Vec<String> {
        vec!["tiktok".to_string(), "youtube".to_string()]
    }

    /// Ledger category for downloaded narration audio.
    pub fn audio_category(&self) -> String {
        format!("audio_{}", self.language)
    }

    /// Ledger category for downloaded background clips.
    pub fn clip_category(&self) -> String {
        format!("{}_{}", self.category, self.subtype)
    }
}

/// Filesystem layout for one account, derived from the workspace root.
/// Every path template of the pipeline lives here.
pub struct AccountPaths {
    ledger_dir: PathBuf,
    audio_links: PathBuf,
    clip_links: PathBuf,
    audio_dir: PathBuf,
    clips_dir: PathBuf,
    captions_dir: PathBuf,
    scripts_dir: PathBuf,
    output_dir: PathBuf,
}

impl AccountPaths {
    pub fn new(workspace: &Path, account: &AccountConfig) -> Self {
        let links_dir = workspace.join("links");
        let media_dir = workspace.join("media");
        Self {
            ledger_dir: workspace.join("ledger"),
            audio_links: links_dir.join(format!("{}.csv", account.audio_category())),
            clip_links: links_dir.join(format!("{}.csv", account.clip_category())),
            audio_dir: media_dir.join("audio").join(&account.language),
            clips_dir: media_dir
                .join("clips")
                .join(&account.category)
                .join(&account.subtype),
            captions_dir: media_dir.join("captions").join(&account.language),
            scripts_dir: media_dir.join("scripts").join(&account.language),
            output_dir: workspace.join("output"),
        }
    }

    pub fn ledger_dir(&self) -> &Path {
        &self.ledger_dir
    }

    pub fn audio_links(&self) -> &Path {
        &self.audio_links
    }

    pub fn clip_links(&self) -> &Path {
        &self.clip_links
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    pub fn captions_dir(&self) -> &Path {
        &self.captions_dir
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the full directory tree for this account.
    pub fn ensure_directories(&self) -> PipelineResult<()> {
        for dir in [
            &self.ledger_dir,
            &self.audio_dir,
            &self.clips_dir,
            &self.captions_dir,
            &self.scripts_dir,
            &self.output_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        }
        for links in [&self.audio_links, &self.clip_links] {
            if let Some(parent) = links.parent() {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
            }
        }
        Ok(())
    }
}
