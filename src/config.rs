//! User configuration for the `stacked` application.

use crate::{
    constants::{
        CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BRANCH_PREFIX, DEFAULT_HOST, DEFAULT_REMOTE,
    },
    errors::{StError, StResult},
};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// The user configuration, read from `<config dir>/stacked/config.toml`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StConfig {
    /// Prefix for the names of new stack branches.
    pub branch_prefix: Option<String>,
    /// The GitLab host, e.g. `gitlab.com`.
    pub host: Option<String>,
    /// A GitLab personal access token.
    pub token: Option<String>,
    /// The default remote to push to.
    pub remote: Option<String>,
}

impl StConfig {
    /// Returns the path of the configuration file.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration, falling back to the defaults if no configuration file exists.
    pub fn load() -> StResult<Self> {
        match Self::path() {
            Some(path) if path.is_file() => Self::parse(&fs::read_to_string(path)?),
            _ => Ok(Self::default()),
        }
    }

    /// Parses a configuration from its TOML representation.
    pub fn parse(contents: &str) -> StResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Returns the GitLab host. `GITLAB_HOST` takes precedence over the file.
    pub fn host(&self) -> String {
        env::var("GITLAB_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .or_else(|| self.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// Returns the GitLab token. `GITLAB_TOKEN` takes precedence over the file.
    pub fn token(&self) -> StResult<String> {
        env::var("GITLAB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
            .ok_or_else(|| {
                StError::ConfigNotInitialized(
                    Self::path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| CONFIG_FILE_NAME.to_string()),
                )
            })
    }

    /// Returns the default remote.
    pub fn remote(&self) -> &str {
        self.remote.as_deref().unwrap_or(DEFAULT_REMOTE)
    }

    /// Returns the prefix for new stack branches.
    pub fn branch_prefix(&self) -> String {
        resolve_branch_prefix(self.branch_prefix.as_deref(), env::var("USER").ok().as_deref())
    }
}

/// Picks the branch prefix: the configured value, else the user name, else `glab-stack`.
pub fn resolve_branch_prefix(configured: Option<&str>, user: Option<&str>) -> String {
    [configured, user]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or(DEFAULT_BRANCH_PREFIX)
        .to_string()
}

#[cfg(test)]
mod test {
    use super::{resolve_branch_prefix, StConfig};

    #[test]
    fn branch_prefix_precedence() {
        assert_eq!(resolve_branch_prefix(Some("team"), Some("alice")), "team");
        assert_eq!(resolve_branch_prefix(Some(""), Some("alice")), "alice");
        assert_eq!(resolve_branch_prefix(None, None), "glab-stack");
    }

    #[test]
    fn parses_partial_config() {
        let config = StConfig::parse("branch_prefix = \"me\"\nremote = \"fork\"\n").unwrap();
        assert_eq!(config.branch_prefix.as_deref(), Some("me"));
        assert_eq!(config.remote(), "fork");
        assert_eq!(config.token, None);
    }

    #[test]
    fn defaults_without_file_contents() {
        let config = StConfig::parse("").unwrap();
        assert_eq!(config, StConfig::default());
        assert_eq!(config.remote(), "origin");
    }
}
