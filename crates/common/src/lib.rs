mod crypto;
mod env;

pub use crypto::{decrypt, encrypt, hash_password, verify_password};
pub use env::{load_or_default, EnvVars};

pub const SECONDS_PER_HOUR: i64 = 60 * 60;

/// Current wall clock as Unix seconds. Every stored timestamp uses this unit.
pub fn get_current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `timestamp` shifted by a whole number of days.
pub fn days_after(timestamp: i64, days: i64) -> i64 {
    timestamp + chrono::Duration::days(days).num_seconds()
}
