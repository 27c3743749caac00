//! # Connection Configuration
//!
//! Server list, credentials and client intelligence for the remote cache
//! manager. Built programmatically with [`ConnectionConfigBuilder`] or read
//! from the environment with [`ConnectionConfig::from_env`].

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, Result};

/// Default port of the remote cache protocol (Hot Rod and REST share it)
pub const DEFAULT_PORT: u16 = 11222;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default credentials of a development server
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "pass";

/// How much of the cluster topology the client tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientIntelligence {
    /// No topology tracking; requests go through the fixed server list
    #[default]
    Basic,
    /// Tracks cluster membership
    TopologyAware,
    /// Tracks membership and key ownership
    HashDistributionAware,
}

impl ClientIntelligence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::TopologyAware => "TOPOLOGY_AWARE",
            Self::HashDistributionAware => "HASH_DISTRIBUTION_AWARE",
        }
    }
}

impl fmt::Display for ClientIntelligence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(port: &str, address: &str) -> Result<u16> {
    port.parse::<u16>().map_err(|_| {
        CacheError::InvalidConfig(format!("invalid port in server address '{address}'"))
    })
}

impl FromStr for ServerAddress {
    type Err = CacheError;

    /// Parses `host`, `host:port`, `[ipv6]` or `[ipv6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                CacheError::InvalidConfig(format!("unclosed '[' in server address '{s}'"))
            })?;
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port, s)?,
                    None => {
                        return Err(CacheError::InvalidConfig(format!(
                            "unexpected '{tail}' after host in server address '{s}'"
                        )));
                    }
                },
            };
            (host, port)
        } else {
            match s.split_once(':') {
                Some((host, port)) => {
                    if port.contains(':') {
                        return Err(CacheError::InvalidConfig(format!(
                            "IPv6 server address '{s}' must be written as [host]:port"
                        )));
                    }
                    (host, parse_port(port, s)?)
                }
                None => (s, DEFAULT_PORT),
            }
        };
        if host.is_empty() {
            return Err(CacheError::InvalidConfig(format!(
                "missing host in server address '{s}'"
            )));
        }
        Ok(Self::new(host, port))
    }
}

/// Remote cache connection configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub servers: Vec<ServerAddress>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_intelligence: ClientIntelligence,
}

impl ConnectionConfig {
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Load configuration from environment variables
    ///
    /// - `CACHE_SERVERS`: comma-separated `host[:port]` list
    /// - `CACHE_USERNAME`, `CACHE_PASSWORD`: credentials
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = ConnectionConfigBuilder::new();

        match lookup("CACHE_SERVERS") {
            Some(servers) => {
                for server in servers.split(',').filter(|s| !s.trim().is_empty()) {
                    let address: ServerAddress = server.parse()?;
                    builder = builder.add_server(address.host, address.port);
                }
            }
            None => builder = builder.add_server(DEFAULT_HOST, DEFAULT_PORT),
        }

        let username = lookup("CACHE_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        let password = lookup("CACHE_PASSWORD").unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

        builder.authentication(username, password).build()
    }

    /// Whether credentials are configured
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            servers: vec![ServerAddress::new(DEFAULT_HOST, DEFAULT_PORT)],
            username: Some(DEFAULT_USERNAME.to_string()),
            password: Some(DEFAULT_PASSWORD.to_string()),
            client_intelligence: ClientIntelligence::Basic,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("servers", &self.servers)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("client_intelligence", &self.client_intelligence)
            .finish()
    }
}

/// Builder for [`ConnectionConfig`]
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    servers: Vec<ServerAddress>,
    username: Option<String>,
    password: Option<String>,
    client_intelligence: ClientIntelligence,
}

impl ConnectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.servers.push(ServerAddress::new(host, port));
        self
    }

    pub fn authentication(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub const fn client_intelligence(mut self, intelligence: ClientIntelligence) -> Self {
        self.client_intelligence = intelligence;
        self
    }

    pub fn build(self) -> Result<ConnectionConfig> {
        if self.servers.is_empty() {
            return Err(CacheError::InvalidConfig(
                "at least one server must be configured".to_string(),
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(CacheError::InvalidConfig(
                "username and password must be set together".to_string(),
            ));
        }
        Ok(ConnectionConfig {
            servers: self.servers,
            username: self.username,
            password: self.password,
            client_intelligence: self.client_intelligence,
        })
    }
}
