//! Client identity sent with every request.
//!
//! The comic site rejects empty or library-default identities, so requests go
//! out with a realistic mobile browser User-Agent unless configured otherwise.

/// Default User-Agent: Chrome on an Android handset.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Mobile Safari/537.36";

/// Resolves the User-Agent to send, falling back to [`DEFAULT_USER_AGENT`]
/// when the configured value is missing or blank.
#[must_use]
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT)
        .to_string()
}
