//! Network-first fetch policy.
//!
//! ### Interception
//! - Only GET requests over http(s) are intercepted.
//! - Browser-extension origins and every other scheme pass through untouched.
//!
//! ### Network-first
//! - Status 200 responses are delivered and, unless excluded, persisted.
//! - Any other status is delivered as-is.
//!
//! ### Fallback on network failure
//! - Cached entry for the request identity.
//! - Offline page for navigations.
//! - Synthesized 503 otherwise.

mod exclusion;

use serde::Serialize;

pub use exclusion::{ExclusionMatch, ExclusionSet};

use crate::http::Request;

/// Schemes used by browser extensions for their internal resources.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-web-extension", "ms-browser-extension"];

/// Why a request is left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    NonGetMethod,
    ExtensionOrigin,
    UnsupportedScheme,
    /// The worker instance has not claimed its clients.
    NotControlling,
}

/// Decision taken for an intercepted request before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    Bypass(BypassReason),
    NetworkFirst {
        /// False when the URL matches the exclusion set.
        store_on_success: bool,
    },
}

/// Plan how to handle `request`.
pub fn plan_fetch(request: &Request, exclusions: &ExclusionSet) -> FetchPlan {
    if !request.is_get() {
        return FetchPlan::Bypass(BypassReason::NonGetMethod);
    }

    let scheme = request.url.scheme();
    if EXTENSION_SCHEMES.contains(&scheme) {
        return FetchPlan::Bypass(BypassReason::ExtensionOrigin);
    }
    if scheme != "http" && scheme != "https" {
        return FetchPlan::Bypass(BypassReason::UnsupportedScheme);
    }

    FetchPlan::NetworkFirst { store_on_success: !exclusions.matches(&request.url) }
}

/// What to serve once the network failed and the cache had no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    OfflinePage,
    Unavailable,
}

pub fn fallback_for(request: &Request) -> Fallback {
    if request.mode.is_navigation() { Fallback::OfflinePage } else { Fallback::Unavailable }
}
