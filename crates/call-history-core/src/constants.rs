//! Loader-wide constants
//!
//! Tunables that are not exposed through `LoaderConfig` because the
//! coalescing rules depend on them staying fixed.

/// Two calls may share a row only if the older one began less than this long
/// before the row's anchor (its newest call).
pub const COALESCING_WINDOW_MS: u64 = 4 * 60 * 60 * 1000;

// Config defaults
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_GROUP_SIZE: usize = 50;
pub const DEFAULT_UPCOMING_CALL_LINK_LIMIT: usize = 100;

/// Pages kept warm on each side of the page being viewed.
pub const HOT_WINDOW_SLACK_PAGES: usize = 2;
