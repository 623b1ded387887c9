use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use bolt_app_state::{UnknownAffordance, UserAffordance};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5173";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "text";
const DEFAULT_STATIC_DIR: &str = "apps/bolt.new/service/static";
const DEFAULT_APP_TITLE: &str = "Bolt";
const DEFAULT_AUTH_PROVIDER_MODE: &str = "mock";
const DEFAULT_AUTH_MOCK_SESSIONS: &str = "";
const DEFAULT_AUTH_SESSION_COOKIE: &str = "__session";
const DEFAULT_USER_AFFORDANCE: &str = "custom";
const DEFAULT_SCRIPT_BUNDLES: &str = "/assets/bolt_web_shell.js";
const DEFAULT_STYLESHEETS: &str = "/assets/index.css";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProviderMode {
    /// In-memory sessions from `BOLT_AUTH_MOCK_SESSIONS`.
    Mock,
    /// No auth collaborator; every request is anonymous.
    Disabled,
}

impl AuthProviderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSession {
    pub token: String,
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub static_dir: PathBuf,
    pub app_title: String,
    pub auth_provider_mode: AuthProviderMode,
    pub auth_mock_sessions: Vec<MockSession>,
    pub auth_session_cookie: String,
    pub user_affordance: UserAffordance,
    pub script_bundles: Vec<String>,
    pub stylesheets: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BOLT_BIND_ADDR value '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid BOLT_LOG_FORMAT value '{value}' (expected text or json)")]
    InvalidLogFormat { value: String },
    #[error("invalid BOLT_AUTH_PROVIDER_MODE value '{value}' (expected mock or disabled)")]
    InvalidAuthProviderMode { value: String },
    #[error("invalid BOLT_AUTH_MOCK_SESSIONS entry '{entry}' (expected token:session_id:user_id)")]
    InvalidMockSession { entry: String },
    #[error("invalid BOLT_USER_AFFORDANCE value: {source}")]
    InvalidUserAffordance {
        #[from]
        source: UnknownAffordance,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr_raw = read("BOLT_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr_raw
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_addr_raw.clone(),
                source,
            })?;

        let log_filter = read("BOLT_LOG_FILTER", DEFAULT_LOG_FILTER);

        let log_format_raw = read("BOLT_LOG_FORMAT", DEFAULT_LOG_FORMAT);
        let log_format = match log_format_raw.trim().to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::InvalidLogFormat {
                    value: log_format_raw,
                });
            }
        };

        let static_dir = PathBuf::from(read("BOLT_STATIC_DIR", DEFAULT_STATIC_DIR));
        let app_title = read("BOLT_APP_TITLE", DEFAULT_APP_TITLE);

        let mode_raw = read("BOLT_AUTH_PROVIDER_MODE", DEFAULT_AUTH_PROVIDER_MODE);
        let auth_provider_mode = match mode_raw.trim().to_ascii_lowercase().as_str() {
            "mock" => AuthProviderMode::Mock,
            "disabled" => AuthProviderMode::Disabled,
            _ => return Err(ConfigError::InvalidAuthProviderMode { value: mode_raw }),
        };

        let auth_mock_sessions = parse_csv(read("BOLT_AUTH_MOCK_SESSIONS", DEFAULT_AUTH_MOCK_SESSIONS))
            .into_iter()
            .map(parse_mock_session)
            .collect::<Result<Vec<_>, _>>()?;

        let auth_session_cookie = read("BOLT_AUTH_SESSION_COOKIE", DEFAULT_AUTH_SESSION_COOKIE)
            .trim()
            .to_string();
        let user_affordance = read("BOLT_USER_AFFORDANCE", DEFAULT_USER_AFFORDANCE).parse()?;
        let script_bundles = parse_csv(read("BOLT_SCRIPT_BUNDLES", DEFAULT_SCRIPT_BUNDLES));
        let stylesheets = parse_csv(read("BOLT_STYLESHEETS", DEFAULT_STYLESHEETS));

        Ok(Self {
            bind_addr,
            log_filter,
            log_format,
            static_dir,
            app_title,
            auth_provider_mode,
            auth_mock_sessions,
            auth_session_cookie,
            user_affordance,
            script_bundles,
            stylesheets,
        })
    }

    #[cfg(test)]
    pub fn for_tests(static_dir: PathBuf) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_filter: "debug".to_string(),
            log_format: LogFormat::Text,
            static_dir,
            app_title: DEFAULT_APP_TITLE.to_string(),
            auth_provider_mode: AuthProviderMode::Mock,
            auth_mock_sessions: vec![MockSession {
                token: "token-s1".to_string(),
                session_id: "s1".to_string(),
                user_id: "u1".to_string(),
            }],
            auth_session_cookie: DEFAULT_AUTH_SESSION_COOKIE.to_string(),
            user_affordance: UserAffordance::CustomMenu,
            script_bundles: vec![DEFAULT_SCRIPT_BUNDLES.to_string()],
            stylesheets: vec![DEFAULT_STYLESHEETS.to_string()],
        }
    }
}

fn parse_mock_session(entry: String) -> Result<MockSession, ConfigError> {
    let mut parts = entry.split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(token), Some(session_id), Some(user_id), None)
            if !token.is_empty() && !session_id.is_empty() && !user_id.is_empty() =>
        {
            Ok(MockSession {
                token: token.to_string(),
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            })
        }
        _ => Err(ConfigError::InvalidMockSession { entry }),
    }
}

fn parse_csv(value: String) -> Vec<String> {
    value
        .split(',')
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}
