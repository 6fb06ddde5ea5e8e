//! Uploader configuration.
//!
//! Stored as JSON at `~/.config/polar-migrate/config.json`. A missing file
//! yields defaults; `POLAR_ACCESS_TOKEN` and command-line flags override
//! what the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use polar_migrate_protocol::Server;
use polar_migrate_transfer::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides [`UploaderConfig::access_token`].
pub const ACCESS_TOKEN_ENV: &str = "POLAR_ACCESS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Polar environment to upload to.
    pub server: Server,

    /// Organization access token (`polar_oat_...`).
    pub access_token: String,

    /// Organization that owns the uploaded files.
    pub organization_id: String,

    /// Part size in bytes; 0 selects the library default.
    pub chunk_size: usize,

    /// Per-request timeout in seconds; 0 disables it.
    pub request_timeout_secs: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            server: Server::default(),
            access_token: String::new(),
            organization_id: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: 300,
        }
    }
}

impl UploaderConfig {
    /// Loads the config at `path`, falling back to defaults when the file
    /// is missing or unparsable.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes the config to `path`, readable by the owner only.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, &json)?;
        set_permissions_0600(path);

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies an access token taken from the environment, if non-empty.
    pub fn apply_env_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = token.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Checks that everything needed to talk to the API is present.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_token.is_empty() {
            anyhow::bail!("no access token: set {ACCESS_TOKEN_ENV} or access_token in the config");
        }
        if self.organization_id.is_empty() {
            anyhow::bail!("no organization id: pass --organization or set organization_id");
        }
        Ok(())
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Default config location: `<config dir>/polar-migrate/config.json`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("polar-migrate").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| anyhow::anyhow!("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
