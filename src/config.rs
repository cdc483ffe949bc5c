//! Process configuration and credential resolution.
//!
//! All values are read once at startup and collapsed into an immutable
//! `Config` handed to the components that need it.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// Environment variable holding the ambient runtime token.
const AMBIENT_TOKEN_VAR: &str = "AGENT_API_TOKEN";

/// Runtime environment, selecting how credentials are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeEnv {
    /// Ambient token from the process environment.
    Cloud,
    /// Profile entry in the local credentials file.
    Local,
}

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Agent runtime region.
    pub region: String,
    /// Agent identifier.
    pub agent_id: String,
    /// Agent alias identifier.
    pub agent_alias_id: String,
    /// Model used by the direct completion endpoint.
    pub model_id: String,
    /// Agent runtime base URL.
    pub endpoint: String,
    /// Credential resolution mode.
    pub runtime_env: RuntimeEnv,
    /// Credential profile name (local mode).
    pub profile: String,
    /// Directory of static assets.
    pub public_dir: PathBuf,
}

impl Config {
    /// Regional default endpoint for the agent runtime.
    pub fn default_endpoint(region: &str) -> String {
        format!("https://agent-runtime.{region}.amazonaws.com")
    }
}

/// Resolved credentials for the agent runtime.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bearer token presented to the runtime.
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    profiles: HashMap<String, ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    token: String,
}

impl Credentials {
    /// Resolve credentials for the configured runtime environment.
    pub fn resolve(config: &Config) -> Result<Self> {
        match config.runtime_env {
            RuntimeEnv::Cloud => {
                let token = std::env::var(AMBIENT_TOKEN_VAR).with_context(|| {
                    format!("{AMBIENT_TOKEN_VAR} is not set (required in the cloud environment)")
                })?;
                Ok(Self { token })
            }
            RuntimeEnv::Local => {
                let path = credentials_path().context("locating the credentials file")?;
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_toml(&contents, &config.profile)
            }
        }
    }

    /// Parse a credentials file and select one profile.
    pub fn from_toml(contents: &str, profile: &str) -> Result<Self> {
        let file: CredentialsFile =
            toml::from_str(contents).context("parsing the credentials file")?;
        let entry = file
            .profiles
            .get(profile)
            .with_context(|| format!("credential profile '{profile}' not found"))?;
        Ok(Self {
            token: entry.token.clone(),
        })
    }
}

fn credentials_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("agent-relay").join("credentials.toml"))
}
