use std::time::Duration;

/// Maximum concurrent active-or-pending-return loans per member (Gold plan default).
pub const MAX_CONCURRENT_LOANS: usize = 2;

/// Number of records shown in the unfiltered transaction view.
pub const RECENT_TRANSACTIONS_LIMIT: usize = 10;

/// A completed return within this window still triggers the rating prompt on load.
pub const RATING_PROMPT_WINDOW_SECS: i64 = 5 * 60;

/// Renewal is allowed when the due date is within this many whole days, inclusive.
pub const RENEWAL_WINDOW_MIN_DAYS: i64 = 1;
pub const RENEWAL_WINDOW_MAX_DAYS: i64 = 2;

/// Days added to the due date on a successful renewal.
pub const RENEWAL_EXTENSION_DAYS: i64 = 14;

/// Lending period for a fresh borrow.
pub const LENDING_PERIOD_DAYS: i64 = 30;

/// Unread-count polling interval while the tab is visible.
pub const NOTIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Durable key-value storage key for the bearer token.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Minimum review body length accepted client-side.
pub const MIN_REVIEW_LENGTH: usize = 10;

/// Error code the backend uses for an account whose profile record is gone.
pub const PROFILE_NOT_FOUND_CODE: &str = "PROFILE_NOT_FOUND";
