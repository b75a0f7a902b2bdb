//! Shared User-Agent string for catalog and download traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/pole-surfaces-planetaires/planetary_fetch";

/// Default User-Agent for every request the tool sends.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("planetary-fetch/{version} (+{PROJECT_UA_URL})")
}
