use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub smtp: SmtpConfig,
    pub alerts: AlertConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PHARMA_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PHARMA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            smtp: SmtpConfig::from_env_profiled(p),
            alerts: AlertConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        if self.postgres.is_configured() {
            tracing::info!("  postgres:    host={}, db={}", self.postgres.host, self.postgres.database);
        } else {
            tracing::info!("  postgres:    (not configured, in-memory store)");
        }
        tracing::info!(
            "  smtp:        host={}, configured={}",
            self.smtp.host.as_deref().unwrap_or("(none)"),
            self.smtp.is_configured()
        );
        tracing::info!(
            "  alerts:      enabled={}, interval={}s, send_timeout={}s",
            self.alerts.enabled,
            self.alerts.interval_secs,
            self.alerts.send_timeout_secs
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "postgres": {
                "host": self.postgres.host,
                "database": self.postgres.database,
                "configured": self.postgres.is_configured(),
            },
            "smtp": {
                "host": self.smtp.host,
                "from": self.smtp.from_email,
                "configured": self.smtp.is_configured(),
            },
            "alerts": {
                "enabled": self.alerts.enabled,
                "interval_secs": self.alerts.interval_secs,
                "send_timeout_secs": self.alerts.send_timeout_secs,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub session_ttl_secs: u64,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 5000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            session_ttl_secs: profiled_env_u64(p, "SESSION_TTL_SECS", 86_400),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL; overrides the individual fields when set.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "DATABASE_URL"),
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_u16(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "pharmatrack"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_u32(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.username.is_some()
    }
}

// ── SMTP ──────────────────────────────────────────────────────

pub const DEFAULT_FROM_EMAIL: &str = "notifications@drugmanager.com";
pub const DEFAULT_FROM_NAME: &str = "Drug Expiry Manager";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: String,
    /// STARTTLS on non-465 ports. Port 465 always uses implicit TLS.
    pub tls: bool,
}

impl SmtpConfig {
    fn from_env_profiled(p: &str) -> Self {
        let username = profiled_env_opt(p, "SMTP_USER");
        let from_email = profiled_env_opt(p, "SMTP_FROM")
            .or_else(|| username.clone())
            .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string());
        Self {
            host: profiled_env_opt(p, "SMTP_HOST"),
            port: profiled_env_opt(p, "SMTP_PORT").and_then(|v| v.parse().ok()),
            username,
            password: profiled_env_opt(p, "SMTP_PASS"),
            from_email,
            from_name: profiled_env_or(p, "SMTP_FROM_NAME", DEFAULT_FROM_NAME),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
        }
    }

    /// Host, port, user and password must all be present.
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.port.is_some() && self.username.is_some() && self.password.is_some()
    }

    /// `"Name" <address>` form used as the sender mailbox.
    pub fn from_mailbox(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.from_email)
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            from_name: DEFAULT_FROM_NAME.to_string(),
            tls: true,
        }
    }
}

// ── Alerts ────────────────────────────────────────────────────

/// Longest accepted alert interval or send timeout (one year).
pub const MAX_ALERT_PERIOD_SECS: u64 = 365 * 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub send_timeout_secs: u64,
}

impl AlertConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "ALERTS_ENABLED", true),
            interval_secs: profiled_env_u64(p, "ALERT_INTERVAL_SECS", 86_400),
            send_timeout_secs: profiled_env_u64(p, "ALERT_SEND_TIMEOUT_SECS", 30),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.clamp(1, MAX_ALERT_PERIOD_SECS))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs.clamp(1, MAX_ALERT_PERIOD_SECS))
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 86_400,
            send_timeout_secs: 30,
        }
    }
}
