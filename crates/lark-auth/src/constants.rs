//! Wire constants shared by the token exchange and the request dispatcher

/// Content type for every JSON body sent to the platform
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Upper bound on a reported token lifetime (30 days). The platform issues
/// two-hour tokens; anything beyond this is treated as this long.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 3600;
