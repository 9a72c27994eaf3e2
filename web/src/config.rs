//! Startup configuration, read from the environment (and an optional
//! `.env` file). Missing or malformed values stop the process before it
//! serves anything.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;
use url::Url;

pub const SERVER_URL: &str = "SERVER_URL";
pub const WEB_PORT: &str = "WEB_PORT";
pub const WEB_ADDR: &str = "WEB_ADDR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the todo backend.
    pub server_url: String,
    /// Port the todo page is served on.
    pub web_port: u16,
    pub web_addr: IpAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let server_url = get(SERVER_URL).ok_or(ConfigError::Missing(SERVER_URL))?;
        check_url(&server_url)?;

        let web_port = get(WEB_PORT).ok_or(ConfigError::Missing(WEB_PORT))?;
        let web_port = parse_port(&web_port)?;

        let web_addr = match get(WEB_ADDR) {
            Some(addr) => addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: WEB_ADDR,
                reason: e.to_string(),
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        Ok(Self {
            server_url,
            web_port,
            web_addr,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.web_addr, self.web_port)
    }
}

fn check_url(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: SERVER_URL,
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: WEB_PORT,
        reason,
    };
    match value.parse::<u16>() {
        Ok(0) => Err(invalid("must be a positive integer".to_string())),
        Ok(port) => Ok(port),
        Err(e) => Err(invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn loads_required_values() {
        let config = load(&[(SERVER_URL, "http://localhost:3000"), (WEB_PORT, "3001")]).unwrap();
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.socket_addr(), "127.0.0.1:3001".parse().unwrap());
    }

    #[test]
    fn missing_and_empty_values_fail() {
        assert_eq!(load(&[(WEB_PORT, "3001")]), Err(ConfigError::Missing(SERVER_URL)));
        assert_eq!(
            load(&[(SERVER_URL, "http://localhost:3000"), (WEB_PORT, "  ")]),
            Err(ConfigError::Missing(WEB_PORT))
        );
    }

    #[test]
    fn rejects_malformed_values() {
        for url in [
            "localhost:3000",
            "ftp://example.com",
            "http://",
            "http://:80/x",
            "http://[::1",
            "http://a b:x",
        ] {
            let err = load(&[(SERVER_URL, url), (WEB_PORT, "3001")]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: SERVER_URL, .. }), "{url}");
        }
        for port in ["0", "-1", "65536", "web"] {
            let err = load(&[(SERVER_URL, "https://api.example.com"), (WEB_PORT, port)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: WEB_PORT, .. }), "{port}");
        }
    }

    #[test]
    fn scheme_is_case_insensitive() {
        for url in ["HTTP://localhost:3000", "Https://api.example.com/v1", "http://[::1]:3000"] {
            let config = load(&[(SERVER_URL, url), (WEB_PORT, "3001")]).unwrap();
            assert_eq!(config.server_url, url);
        }
    }

    #[test]
    fn bind_address_is_optional() {
        let config = load(&[
            (SERVER_URL, "https://api.example.com"),
            (WEB_PORT, "8080"),
            (WEB_ADDR, "0.0.0.0"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
    }
}
