// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::Duration;

const DEFAULT_DB_URL: &str = "sqlite://database/taskfocus.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;
const DEFAULT_RESET_TOKEN_TTL_HOURS: i64 = 24;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Lifetime of a login session cookie.
    pub session_ttl: Duration,
    /// Lifetime of a password reset link.
    pub reset_token_ttl: Duration,
    /// Accounts promoted to staff when the server starts.
    pub admin_usernames: Vec<String>,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            reset_token_ttl: Duration::hours(DEFAULT_RESET_TOKEN_TTL_HOURS),
            admin_usernames: Vec::new(),
            secure_cookies: false,
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR '{}'", addr))?;
        }
        if let Some(hours) = lookup("SESSION_TTL_HOURS") {
            config.session_ttl = Duration::hours(parse_positive_hours("SESSION_TTL_HOURS", &hours)?);
        }
        if let Some(hours) = lookup("RESET_TOKEN_TTL_HOURS") {
            config.reset_token_ttl =
                Duration::hours(parse_positive_hours("RESET_TOKEN_TTL_HOURS", &hours)?);
        }
        if let Some(names) = lookup("ADMIN_USERNAMES") {
            config.admin_usernames = names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(flag) = lookup("SECURE_COOKIES") {
            config.secure_cookies = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => anyhow::bail!("Invalid SECURE_COOKIES '{}'", other),
            };
        }

        Ok(config)
    }
}

fn parse_positive_hours(key: &str, value: &str) -> Result<i64> {
    let hours: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} '{}'", key, value))?;
    if hours <= 0 {
        anyhow::bail!("{} must be positive, got {}", key, hours);
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, DEFAULT_DB_URL);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.session_ttl, Duration::hours(336));
        assert!(config.admin_usernames.is_empty());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_values_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SESSION_TTL_HOURS", "2"),
            ("ADMIN_USERNAMES", "root, ops ,,"),
            ("SECURE_COOKIES", "true"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.session_ttl, Duration::hours(2));
        assert_eq!(config.admin_usernames, vec!["root", "ops"]);
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[("BIND_ADDR", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SESSION_TTL_HOURS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SECURE_COOKIES", "maybe")])).is_err());
    }
}
