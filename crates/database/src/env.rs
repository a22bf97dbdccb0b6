use std::env;

use machi_common::{load_or_default, EnvVars};

pub struct DatabaseEnv {
    pub database_url: Option<String>,
    pub sqlite_path: String,
    pub vercel: bool,
}

impl DatabaseEnv {
    pub fn sqlite_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.sqlite_path)
    }
}

impl EnvVars for DatabaseEnv {
    fn load() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            sqlite_path: load_or_default("SQLITE_PATH", "machi.db".to_string()),
            vercel: env::var("VERCEL").map(|v| v == "1").unwrap_or(false),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "DATABASE_URL" => self.database_url.clone().unwrap_or_default(),
            "SQLITE_PATH" => self.sqlite_path.clone(),
            "VERCEL" => if self.vercel { "1".into() } else { "0".into() },
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
