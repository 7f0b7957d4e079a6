//! Video duration parsing and the long/short classification boundary.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Category;

/// Videos at or under this many seconds are filed as short-form.
pub const SHORT_FORM_MAX_SECONDS: u64 = 65;

// Unanchored on purpose: the first `PT…` run anywhere in the token is used.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("valid duration regex")
});

/// Parses an ISO-8601 duration token such as `PT1H2M3S` into whole seconds.
///
/// Missing components count as zero. Tokens without a `PT` section (including
/// day-bearing forms like `P1DT2H`) parse as `0`.
#[must_use]
pub fn parse_iso8601_duration(token: &str) -> u64 {
    let Some(caps) = DURATION_RE.captures(token) else {
        return 0;
    };
    let component = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3))
}

#[must_use]
pub fn classify_duration(seconds: u64) -> Category {
    if seconds <= SHORT_FORM_MAX_SECONDS {
        Category::ShortForm
    } else {
        Category::LongForm
    }
}
