use bolt_app_state::SessionIdentity;

#[derive(Debug, thiserror::Error)]
pub(crate) enum HydrationError {
    #[error("hydration data element is missing")]
    Missing,
    #[error("hydration data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parses the server's `{sessionId, userId}` payload.
pub(crate) fn parse_loader_data(raw: Option<&str>) -> Result<SessionIdentity, HydrationError> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(HydrationError::Missing)?;
    Ok(serde_json::from_str(raw)?)
}
