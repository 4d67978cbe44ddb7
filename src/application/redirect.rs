use crate::domain::request::PendingRequest;
use url::Url;

/// Whether a re-entry URL belonged to the pending checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentryMatch {
    Claimed,
    /// Let other handlers in the host app look at it.
    NotMine,
}

impl ReentryMatch {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ReentryMatch::Claimed)
    }
}

/// Extracts the scheme from a re-entry URL such as `com.shop.payments://callback`.
pub fn scheme_of(url: &str) -> Option<String> {
    Url::parse(url.trim()).ok().map(|url| url.scheme().to_string())
}

/// Matches a re-entry URL against the scheme registered when the pending
/// attempt began.
///
/// Holds no state: after a process restart there is no pending request and
/// every signal is `NotMine`.
pub fn match_reentry(pending: Option<&PendingRequest>, url: &str) -> (ReentryMatch, Option<String>) {
    let Some(scheme) = scheme_of(url) else {
        return (ReentryMatch::NotMine, None);
    };
    match pending {
        Some(request) if request.matches_scheme(&scheme) => (ReentryMatch::Claimed, Some(scheme)),
        _ => (ReentryMatch::NotMine, Some(scheme)),
    }
}
