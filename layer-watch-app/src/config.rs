//! Settings loaded once at startup from a `KEY=VALUE` file and the
//! environment.
//!
//! Values in the process environment win over values in the file. Every
//! rule is checked before giving up so the user sees all problems at once.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use layer_watch::ChatId;
use thiserror::Error;

pub const DEFAULT_SESSION_NAME: &str = "layer-watch";
pub const DEFAULT_LOG_DIR:      &str = "logs";
pub const DEFAULT_DC_ID:        i32  = 2;
pub const DEFAULT_DC_PORT:      u16  = 443;

const KEYS: &[&str] = &[
    "API_ID", "API_HASH", "PHONE_NUMBER", "TG_PASSWORD", "SESSION_NAME",
    "LOG_DIR", "DC_ID", "DC_IP", "DC_PORT", "ALLOWED_CHAT_IDS",
];

// ─── ConfigError ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: dotenvy::Error },

    #[error(
        "configuration validation failed:{}",
        .0.iter().map(|p| format!("\n  - {p}")).collect::<String>()
    )]
    Invalid(Vec<String>),
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// An explicitly pinned Telegram data center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcPin {
    pub id:   i32,
    pub ip:   Ipv4Addr,
    pub port: u16,
}

impl DcPin {
    /// `ip:port` as the client library expects it.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_id:           i32,
    pub api_hash:         String,
    pub phone:            String,
    pub password:         Option<String>,
    pub session_name:     String,
    pub log_dir:          PathBuf,
    pub dc:               Option<DcPin>,
    /// Empty means every chat is logged.
    pub allowed_chat_ids: Vec<ChatId>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone", &self.phone)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("session_name", &self.session_name)
            .field("log_dir", &self.log_dir)
            .field("dc", &self.dc)
            .field("allowed_chat_ids", &self.allowed_chat_ids)
            .finish()
    }
}

impl Settings {
    /// Read `path` (if it exists, or unconditionally when `required`), then
    /// overlay the process environment.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        if required || path.exists() {
            let entries = dotenvy::from_path_iter(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            for entry in entries {
                let (key, value) = entry
                    .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
                values.insert(key, value);
            }
            log::info!("[watch] read settings from {}", path.display());
        }

        for key in KEYS {
            if let Ok(value) = std::env::var(key) {
                values.insert((*key).to_string(), value);
            }
        }

        Self::from_map(&values)
    }

    /// Build and validate settings from raw key/value pairs.
    ///
    /// Empty values count as unset.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            values.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        let api_id = match get("API_ID") {
            None => { problems.push("API_ID is not set".to_string()); 0 }
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) if id > 0 => id,
                Ok(_) => { problems.push("API_ID must be a positive integer".into()); 0 }
                Err(_) => { problems.push("API_ID must be a valid integer".into()); 0 }
            },
        };

        let api_hash = match get("API_HASH") {
            None => { problems.push("API_HASH is not set or is empty".into()); String::new() }
            Some(h) if h.len() != 32 => {
                problems.push("API_HASH must be 32 characters long".into());
                String::new()
            }
            Some(h) => h.to_string(),
        };

        let phone = match get("PHONE_NUMBER") {
            None => { problems.push("PHONE_NUMBER is not set or is empty".into()); String::new() }
            Some(p) => {
                if let Some(problem) = phone_problem(p) {
                    problems.push(problem.into());
                }
                p.to_string()
            }
        };

        let dc_id = match get("DC_ID") {
            None => DEFAULT_DC_ID,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) if (1..=5).contains(&id) => id,
                Ok(_) => { problems.push("DC_ID must be between 1 and 5".into()); DEFAULT_DC_ID }
                Err(_) => { problems.push("DC_ID must be a valid integer".into()); DEFAULT_DC_ID }
            },
        };

        let dc_port = match get("DC_PORT") {
            None => DEFAULT_DC_PORT,
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                problems.push("DC_PORT must be a valid port number".into());
                DEFAULT_DC_PORT
            }),
        };

        let dc = match get("DC_IP") {
            None => None,
            Some(raw) => match raw.parse::<Ipv4Addr>() {
                Ok(ip) => Some(DcPin { id: dc_id, ip, port: dc_port }),
                Err(_) => { problems.push("DC_IP must be a valid IPv4 address".into()); None }
            },
        };

        let mut allowed_chat_ids = Vec::new();
        for part in get("ALLOWED_CHAT_IDS").unwrap_or_default().split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.parse::<ChatId>() {
                Ok(id) => allowed_chat_ids.push(id),
                Err(_) => problems.push(format!(
                    "ALLOWED_CHAT_IDS contains invalid value: {part} (must be integer)"
                )),
            }
        }

        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }

        Ok(Self {
            api_id,
            api_hash,
            phone,
            password:     get("TG_PASSWORD").map(str::to_string),
            session_name: get("SESSION_NAME").unwrap_or(DEFAULT_SESSION_NAME).to_string(),
            log_dir:      PathBuf::from(get("LOG_DIR").unwrap_or(DEFAULT_LOG_DIR)),
            dc,
            allowed_chat_ids,
        })
    }

    /// Where the client library keeps its session token.
    pub fn session_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.session", self.session_name))
    }
}

fn phone_problem(phone: &str) -> Option<&'static str> {
    let Some(digits) = phone.strip_prefix('+') else {
        return Some("PHONE_NUMBER must start with '+' (e.g., +1234567890)");
    };
    if phone.len() < 9 {
        return Some("PHONE_NUMBER is too short");
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Some("PHONE_NUMBER must contain only digits after '+'");
    }
    None
}
