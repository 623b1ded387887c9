use serde::{Deserialize, Serialize};

/// Server-resolved identity handed to the client as initial render data.
///
/// Both fields are present for an authenticated request and both absent for
/// an anonymous one. The auth collaborator guarantees that pairing; this type
/// does not re-check it. Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SessionIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            user_id: Some(user_id.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_id.is_some() && self.user_id.is_some()
    }

    pub fn presence(&self) -> AuthPresence {
        AuthPresence::from(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPresence {
    SignedIn,
    SignedOut,
}

impl AuthPresence {
    pub fn from_signed_in(signed_in: bool) -> Self {
        if signed_in {
            Self::SignedIn
        } else {
            Self::SignedOut
        }
    }

    pub fn is_signed_in(self) -> bool {
        matches!(self, Self::SignedIn)
    }
}

impl From<&SessionIdentity> for AuthPresence {
    fn from(identity: &SessionIdentity) -> Self {
        Self::from_signed_in(identity.is_authenticated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_identity_serializes_nulls() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(SessionIdentity::anonymous())?;
        assert_eq!(
            json,
            serde_json::json!({ "sessionId": null, "userId": null })
        );
        Ok(())
    }

    #[test]
    fn authenticated_identity_uses_camel_case_keys() -> Result<(), serde_json::Error> {
        let identity = SessionIdentity::authenticated("s1", "u1");
        let json = serde_json::to_string(&identity)?;
        assert_eq!(json, r#"{"sessionId":"s1","userId":"u1"}"#);

        let parsed: SessionIdentity = serde_json::from_str(&json)?;
        assert_eq!(parsed, identity);
        assert_eq!(parsed.presence(), AuthPresence::SignedIn);
        Ok(())
    }

    #[test]
    fn missing_fields_parse_as_anonymous() -> Result<(), serde_json::Error> {
        let parsed: SessionIdentity = serde_json::from_str("{}")?;
        assert!(!parsed.is_authenticated());
        assert_eq!(AuthPresence::from(&parsed), AuthPresence::SignedOut);
        Ok(())
    }
}
