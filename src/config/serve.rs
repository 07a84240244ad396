//! `[serve]`: development server settings.

use super::{ConfigError, defaults};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # reachable from the LAN
/// port = 3000            # first port tried; taken ports move upward
/// watch = false          # serve only, no rebuilds
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Rebuild on changes to content, templates, assets and the config file.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}

impl ServeConfig {
    /// Parsed `interface`.
    pub fn ip(&self) -> Result<IpAddr, ConfigError> {
        self.interface.trim().parse().map_err(|_| {
            ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.interface
            ))
        })
    }
}
