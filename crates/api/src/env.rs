use machi_common::{load_or_default, EnvVars};

const DEV_SECRET_SALT: &str = "machi-mouchkil-dev-salt";

pub struct ApiServerEnv {
    pub port: u16,
    pub secret_salt: String,
    pub frontend_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        let secret_salt = std::env::var("SECRET_SALT").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            tracing::warn!("SECRET_SALT is not set, using the development salt. Do not run like this in production.");
            DEV_SECRET_SALT.to_string()
        });

        Self {
            port: load_or_default("PORT", 3000),
            secret_salt,
            frontend_url: std::env::var("FRONTEND_URL").ok().filter(|url| !url.is_empty()),
            request_timeout_secs: load_or_default("REQUEST_TIMEOUT_SECS", 30),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.to_string(),
            "SECRET_SALT" => self.secret_salt.clone(),
            "FRONTEND_URL" => self.frontend_url.clone().unwrap_or_default(),
            "REQUEST_TIMEOUT_SECS" => self.request_timeout_secs.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}

impl ApiServerEnv {
    /// Fixed settings for tests and local tooling.
    pub fn with_secret(secret_salt: &str) -> Self {
        Self {
            port: 0,
            secret_salt: secret_salt.to_string(),
            frontend_url: None,
            request_timeout_secs: 30,
        }
    }
}
