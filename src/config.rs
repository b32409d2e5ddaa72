//! Runtime configuration for the RPG server.

use anyhow::bail;
use once_cell::sync::Lazy;
use std::env;

/// Secret used when no `TOKEN_SECRET_KEY` is configured and the server runs
/// on the in-memory store. A Postgres deployment must configure its own.
const DEV_TOKEN_SECRET: &str = "rpg-server-dev-secret";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub server_addr: String,
    /// HMAC secret for session tokens.
    pub token_secret: String,
    /// Session-token lifetime in days.
    pub token_ttl_days: i64,
    /// Balance a freshly created character starts with.
    pub starting_money: i64,
    /// External ids granted the admin flag at sign-up.
    pub admin_ids: Vec<String>,
    pub db_max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3018".into());

        let token_secret = resolve_token_secret(
            env::var("TOKEN_SECRET_KEY").ok(),
            database_url.is_some(),
        )?;

        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(7);

        let starting_money = env::var("STARTING_MONEY")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m >= 0)
            .unwrap_or(10_000);

        let admin_ids = env::var("ADMIN_IDS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        Ok(Settings {
            database_url,
            server_addr,
            token_secret,
            token_ttl_days,
            starting_money,
            admin_ids,
            db_max_connections,
        })
    }

    /// Whether the given external id is configured as an administrator.
    pub fn is_admin_id(&self, external_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == external_id)
    }

    /// Mainly for tests: a fixed configuration that never touches the
    /// environment.
    pub fn for_tests(token_secret: &str) -> Self {
        Settings {
            database_url: None,
            server_addr: "127.0.0.1:0".into(),
            token_secret: token_secret.into(),
            token_ttl_days: 7,
            starting_money: 10_000,
            admin_ids: vec!["admin".into()],
            db_max_connections: 1,
        }
    }
}

/// The development secret is only acceptable without a database.
fn resolve_token_secret(configured: Option<String>, has_database: bool) -> anyhow::Result<String> {
    match configured.filter(|s| !s.trim().is_empty()) {
        Some(secret) => Ok(secret),
        None if has_database => bail!("TOKEN_SECRET_KEY must be set when DATABASE_URL is"),
        None => {
            log::warn!("TOKEN_SECRET_KEY not set, using the development secret");
            Ok(DEV_TOKEN_SECRET.into())
        }
    }
}

static SETTINGS: Lazy<anyhow::Result<Settings>> = Lazy::new(Settings::from_env);

pub fn settings() -> anyhow::Result<&'static Settings> {
    SETTINGS.as_ref().map_err(|e| anyhow::anyhow!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_secret_wins() {
        let secret = resolve_token_secret(Some("s3cret".into()), true).unwrap();
        assert_eq!(secret, "s3cret");
    }

    #[test]
    fn dev_secret_only_without_database() {
        assert_eq!(resolve_token_secret(None, false).unwrap(), DEV_TOKEN_SECRET);
        assert!(resolve_token_secret(None, true).is_err());
        assert!(resolve_token_secret(Some("  ".into()), true).is_err());
    }
}
