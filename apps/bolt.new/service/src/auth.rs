//! Server-side session resolution.
//!
//! [`SessionLoader`] turns an inbound request into the [`SessionIdentity`]
//! handed to the client. It never fails: missing credentials, unknown tokens
//! and provider outages all resolve to the anonymous identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use bolt_app_state::SessionIdentity;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AuthProviderMode, Config, MockSession};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    Provider { message: String },
}

/// Server-only handle to the credential that authenticated the request.
/// Not serializable, and redacted from debug output.
#[derive(Clone)]
pub struct TokenAccessor {
    token: String,
}

impl TokenAccessor {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn get_token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for TokenAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenAccessor(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: String,
    pub user_id: String,
    pub token: TokenAccessor,
}

impl ResolvedSession {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::authenticated(self.session_id.clone(), self.user_id.clone())
    }
}

#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<ResolvedSession, AuthError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default)]
pub struct MockSessionResolver {
    sessions: HashMap<String, (String, String)>,
}

impl MockSessionResolver {
    pub fn new(sessions: &[MockSession]) -> Self {
        Self {
            sessions: sessions
                .iter()
                .map(|session| {
                    (
                        session.token.clone(),
                        (session.session_id.clone(), session.user_id.clone()),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SessionResolver for MockSessionResolver {
    async fn resolve(&self, token: &str) -> Result<ResolvedSession, AuthError> {
        let (session_id, user_id) =
            self.sessions
                .get(token)
                .ok_or_else(|| AuthError::Unauthorized {
                    message: "session token is not recognized".to_string(),
                })?;
        Ok(ResolvedSession {
            session_id: session_id.clone(),
            user_id: user_id.clone(),
            token: TokenAccessor::new(token),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Clone)]
pub struct UnavailableSessionResolver {
    message: String,
}

impl UnavailableSessionResolver {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl SessionResolver for UnavailableSessionResolver {
    async fn resolve(&self, _token: &str) -> Result<ResolvedSession, AuthError> {
        Err(AuthError::Provider {
            message: self.message.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Clone)]
pub struct SessionLoader {
    resolver: Arc<dyn SessionResolver>,
    cookie_name: String,
}

impl SessionLoader {
    pub fn new(resolver: Arc<dyn SessionResolver>, cookie_name: impl Into<String>) -> Self {
        Self {
            resolver,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let resolver: Arc<dyn SessionResolver> = match config.auth_provider_mode {
            AuthProviderMode::Mock => Arc::new(MockSessionResolver::new(&config.auth_mock_sessions)),
            AuthProviderMode::Disabled => Arc::new(UnavailableSessionResolver::new(
                "auth provider is disabled",
            )),
        };
        Self::new(resolver, config.auth_session_cookie.clone())
    }

    pub fn provider_name(&self) -> &'static str {
        self.resolver.name()
    }

    /// Full resolution, token accessor included. `None` means anonymous.
    ///
    /// The bearer header is tried first. A bearer token the provider rejects
    /// does not hide a valid session cookie on the same request.
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<ResolvedSession> {
        let candidates = [
            bearer_token(headers),
            extract_cookie_value(headers, &self.cookie_name),
        ];
        if candidates.iter().all(Option::is_none) {
            debug!("no session credentials on request");
            return None;
        }

        for token in candidates.into_iter().flatten() {
            match self.resolver.resolve(&token).await {
                Ok(session) => return Some(session),
                Err(AuthError::Unauthorized { message }) => {
                    debug!(provider = self.resolver.name(), reason = %message, "session credential rejected");
                }
                Err(AuthError::Provider { message }) => {
                    warn!(provider = self.resolver.name(), reason = %message, "session resolution failed; rendering anonymous");
                    return None;
                }
            }
        }

        debug!(provider = self.resolver.name(), "no accepted session credentials; rendering anonymous");
        None
    }

    /// The client-visible subset of [`SessionLoader::resolve`].
    pub async fn load(&self, headers: &HeaderMap) -> SessionIdentity {
        self.resolve(headers)
            .await
            .map_or_else(SessionIdentity::anonymous, |session| session.identity())
    }

}

impl fmt::Debug for SessionLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLoader")
            .field("provider", &self.resolver.name())
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

fn extract_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let mut pieces = part.trim().splitn(2, '=');
        let Some(key) = pieces.next() else {
            continue;
        };
        let Some(value) = pieces.next() else {
            continue;
        };

        if key.trim() == cookie_name {
            return non_empty(value.to_string());
        }
    }

    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let authorization = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = authorization.strip_prefix("Bearer ")?.trim();
    non_empty(token.to_string())
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn loader() -> SessionLoader {
        SessionLoader::new(
            Arc::new(MockSessionResolver::new(&[MockSession {
                token: "token-s1".to_string(),
                session_id: "s1".to_string(),
                user_id: "u1".to_string(),
            }])),
            "__session",
        )
    }

    fn headers(name: axum::http::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[tokio::test]
    async fn no_credentials_resolve_to_anonymous() {
        assert_eq!(
            loader().load(&HeaderMap::new()).await,
            SessionIdentity::anonymous()
        );
    }

    #[tokio::test]
    async fn session_cookie_resolves_identity() {
        let headers = headers(COOKIE, "theme=dark; __session=token-s1");
        assert_eq!(
            loader().load(&headers).await,
            SessionIdentity::authenticated("s1", "u1")
        );
    }

    #[tokio::test]
    async fn bearer_header_resolves_identity_and_keeps_token_server_side() -> anyhow::Result<()> {
        let headers = headers(AUTHORIZATION, "Bearer token-s1");
        let session = loader()
            .resolve(&headers)
            .await
            .ok_or_else(|| anyhow::anyhow!("expected a resolved session"))?;
        assert_eq!(session.token.get_token(), "token-s1");
        assert!(!format!("{session:?}").contains("token-s1"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_is_anonymous() {
        let headers = headers(COOKIE, "__session=forged");
        assert!(!loader().load(&headers).await.is_authenticated());
    }

    #[tokio::test]
    async fn rejected_bearer_falls_back_to_session_cookie() {
        let mut headers = headers(AUTHORIZATION, "Bearer stale-token");
        headers.insert(COOKIE, HeaderValue::from_static("__session=token-s1"));
        assert_eq!(
            loader().load(&headers).await,
            SessionIdentity::authenticated("s1", "u1")
        );
    }

    #[tokio::test]
    async fn rejected_bearer_and_cookie_are_anonymous() {
        let mut headers = headers(AUTHORIZATION, "Bearer stale-token");
        headers.insert(COOKIE, HeaderValue::from_static("__session=forged"));
        assert_eq!(loader().load(&headers).await, SessionIdentity::anonymous());
    }

    #[tokio::test]
    async fn provider_outage_is_anonymous() {
        let loader = SessionLoader::new(
            Arc::new(UnavailableSessionResolver::new("provider down")),
            "__session",
        );
        let headers = headers(COOKIE, "__session=token-s1");
        assert_eq!(loader.load(&headers).await, SessionIdentity::anonymous());
        assert_eq!(loader.provider_name(), "disabled");
    }

    #[test]
    fn cookie_parsing_ignores_empty_and_malformed_parts() {
        let headers = headers(COOKIE, "flag; __session= ; other=1");
        assert_eq!(extract_cookie_value(&headers, "__session"), None);
        assert_eq!(extract_cookie_value(&headers, "other"), Some("1".to_string()));
    }
}
