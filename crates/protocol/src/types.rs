use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Polar environment a migration runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    #[default]
    Sandbox,
    Production,
}

impl Server {
    /// Base URL of the REST API for this environment (no trailing slash).
    pub fn api_base_url(self) -> &'static str {
        match self {
            Server::Sandbox => "https://sandbox-api.polar.sh",
            Server::Production => "https://api.polar.sh",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Server::Sandbox => f.write_str("sandbox"),
            Server::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Server {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Server::Sandbox),
            "production" => Ok(Server::Production),
            other => Err(format!("unknown server: {other}")),
        }
    }
}

/// What a stored file is used for on the destination side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileService {
    /// Attached to a downloadables benefit.
    #[default]
    Downloadable,
    ProductMedia,
    OrganizationAvatar,
}
