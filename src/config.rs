use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};
use crate::target::AllowList;

pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["investing.com", "dailyforex.com"];

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub allowed_domains: AllowList,
    pub max_attempts: u32,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000),
            allowed_domains: AllowList::new(DEFAULT_ALLOWED_DOMAINS.iter().copied()),
            max_attempts: 3,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source, falling
    /// back to defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let allowed_domains = match lookup("SCRAPE_ALLOWED_DOMAINS") {
            Some(raw) => {
                let list = AllowList::new(raw.split(','));
                if list.is_empty() {
                    return Err(AppError::ConfigError("SCRAPE_ALLOWED_DOMAINS is empty".to_string()));
                }
                list
            }
            None => defaults.allowed_domains,
        };

        let max_attempts = match lookup("SCRAPE_MAX_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => return Err(AppError::ConfigError("SCRAPE_MAX_ATTEMPTS must be at least 1".to_string())),
                Ok(n) => n,
                Err(e) => return Err(AppError::ConfigError(format!("Invalid SCRAPE_MAX_ATTEMPTS: {}", e))),
            },
            None => defaults.max_attempts,
        };

        let request_timeout = parse_secs(&lookup, "SCRAPE_REQUEST_TIMEOUT_SECS")?.unwrap_or(defaults.request_timeout);
        let connect_timeout = parse_secs(&lookup, "SCRAPE_CONNECT_TIMEOUT_SECS")?.unwrap_or(defaults.connect_timeout);

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            allowed_domains,
            max_attempts,
            request_timeout,
            connect_timeout,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
        })
        .transpose()
}
