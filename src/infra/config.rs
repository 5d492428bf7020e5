use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::{infra::error::InfraError, use_cases::subscription_lifecycle::MAX_PAGE_SIZE};

/// How admin requests are authenticated. Exactly one mode is active.
#[derive(Debug)]
pub enum AdminAuth {
    /// `Authorization: Bearer <token>` must match the configured secret.
    Token(SecretString),
    /// Every request is treated as the local operator. Development only.
    Disabled,
}

impl AdminAuth {
    pub fn from_settings(mode: &str, token: Option<String>) -> Result<Self, InfraError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "token" => {
                let token = token
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(InfraError::ConfigMissing {
                        var: "ADMIN_API_TOKEN",
                    })?;
                Ok(AdminAuth::Token(SecretString::from(token)))
            }
            "disabled" => Ok(AdminAuth::Disabled),
            other => Err(InfraError::ConfigInvalid {
                var: "ADMIN_AUTH_MODE",
                reason: format!("expected `token` or `disabled`, got `{}`", other),
            }),
        }
    }
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Base URL of the marketplace API that owns user notifications.
    pub messaging_base_url: Url,
    pub messaging_api_token: Option<SecretString>,
    pub admin_auth: AdminAuth,
    pub default_page_size: u32,
    pub reconcile_page_size: u32,
    /// Zero disables the background reconcile loop.
    pub reconcile_interval_secs: u64,
}

fn page_size_setting(var: &'static str, value: u32) -> Result<u32, InfraError> {
    if value == 0 || value > MAX_PAGE_SIZE {
        return Err(InfraError::ConfigInvalid {
            var,
            reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
        });
    }
    Ok(value)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: "not a valid header value".into(),
                })?;

        let database_url: String = get_env("DATABASE_URL");
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);

        let messaging_base_url: Url = get_env("MESSAGING_BASE_URL");
        let messaging_api_token = std::env::var("MESSAGING_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let admin_auth = AdminAuth::from_settings(
            &get_env_default("ADMIN_AUTH_MODE", String::from("token")),
            std::env::var("ADMIN_API_TOKEN").ok(),
        )?;

        let default_page_size =
            page_size_setting("DEFAULT_PAGE_SIZE", get_env_default("DEFAULT_PAGE_SIZE", 20))?;
        let reconcile_page_size = page_size_setting(
            "RECONCILE_PAGE_SIZE",
            get_env_default("RECONCILE_PAGE_SIZE", MAX_PAGE_SIZE),
        )?;
        let reconcile_interval_secs: u64 = get_env_default("RECONCILE_INTERVAL_SECS", 0);

        Ok(Self {
            bind_addr,
            cors_origin,
            database_url,
            db_max_connections,
            messaging_base_url,
            messaging_api_token,
            admin_auth,
            default_page_size,
            reconcile_page_size,
            reconcile_interval_secs,
        })
    }
}
