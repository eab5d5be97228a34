//! Scenario configuration.
//!
//! A scenario is described by a small JSON document, parsed in place with
//! `serde-json-core` so string fields borrow from the input:
//!
//! ```rust
//! use callgate::config::ScenarioConfig;
//!
//! let json = r#"{"host":"example.com","port":443,"path":"/index.html","timeout_ms":4000}"#;
//! let config = ScenarioConfig::from_json(json).unwrap();
//! let options = config.connect_options().unwrap();
//! assert_eq!(options.port, 443);
//! assert!(options.security.is_some());
//! ```

use core::time::Duration;
use serde::Deserialize;

use crate::network::error::Error;
use crate::network::request::{ConnectOptions, Request, SecurityOptions};

/// Bound applied to every wait when a scenario does not choose its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

const DEFAULT_TIMEOUT_MS: u32 = 4_000;

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

fn enabled() -> bool {
    true
}

/// One connect-and-fetch scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig<'a> {
    /// Remote host name.
    #[serde(borrow)]
    pub host: &'a str,
    /// Remote port.
    pub port: u16,
    /// Path to fetch; a scenario without one only connects and disconnects.
    #[serde(borrow, default)]
    pub path: Option<&'a str>,
    /// Negotiate a security layer on the connection.
    #[serde(default = "enabled")]
    pub tls: bool,
    /// Server name indication; omitted when absent.
    #[serde(borrow, default)]
    pub server_name: Option<&'a str>,
    /// Validate the peer's certificate chain.
    #[serde(default = "enabled")]
    pub verify_peer: bool,
    /// Bound on each of the harness's waits, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
    /// Socket connect timeout handed to the collaborator, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u32,
}

impl<'a> ScenarioConfig<'a> {
    /// Parses and validates a JSON scenario description.
    pub fn from_json(json: &'a str) -> Result<Self, Error> {
        let (config, _) =
            serde_json_core::from_str::<Self>(json).map_err(|_| Error::InvalidConfig)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() || self.port == 0 {
            return Err(Error::InvalidConfig);
        }
        if self.timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(Error::InvalidConfig);
        }
        if self.path.is_some_and(|path| !path.starts_with('/')) {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }

    /// Bound on each wait.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Options for the connect attempt.
    pub fn connect_options(&self) -> Result<ConnectOptions, Error> {
        let options = ConnectOptions::new(
            self.host,
            self.port,
            Duration::from_millis(u64::from(self.connect_timeout_ms)),
        )?;
        if !self.tls {
            return Ok(options);
        }
        let server_name = self
            .server_name
            .map(heapless::String::try_from)
            .transpose()
            .map_err(|_| Error::InvalidConfig)?;
        Ok(options.with_security(SecurityOptions {
            server_name,
            verify_peer: self.verify_peer,
        }))
    }

    /// The GET to issue, if the scenario fetches anything.
    pub fn request(&self) -> Result<Option<Request<'a>>, Error> {
        self.path
            .map(|path| Request::get(path, self.host))
            .transpose()
    }
}
