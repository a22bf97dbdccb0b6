use std::{env, fmt::Display, str::FromStr};

pub trait EnvVars {
    fn load() -> Self;
    fn get_env_var(&self, key: &str) -> String;
}

/// Reads `key` from the environment, falling back to `default` when unset or unparsable.
pub fn load_or_default<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {key} value ({e}), using default");
            default
        }),
        Err(_) => default,
    }
}
