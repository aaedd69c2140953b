use clap::Parser;
use shared::RetryPolicy;
use std::time::Duration;

/// Runtime configuration, read once at startup from flags and environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "inventory-service")]
pub struct Config {
    /// Full connection string; takes precedence over the DB_* parts.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    #[arg(long, env = "DB_PASS", default_value = "", hide_env_values = true)]
    pub db_pass: String,

    #[arg(long, env = "DB_NAME", default_value = "inventory")]
    pub db_name: String,

    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 10)]
    pub db_pool_size: u32,

    #[arg(long, env = "DB_CONNECT_ATTEMPTS", default_value_t = 5)]
    pub connect_attempts: u32,

    #[arg(long, env = "DB_CONNECT_DELAY_MS", default_value_t = 500)]
    pub connect_delay_ms: u64,

    #[arg(long, env = "DB_CONNECT_MAX_DELAY_MS", default_value_t = 8000)]
    pub connect_max_delay_ms: u64,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Keep all data in process memory instead of Postgres.
    #[arg(long)]
    pub in_memory: bool,
}

impl Config {
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.db_user, self.db_pass, self.db_host, self.db_port, self.db_name
            ),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_millis(self.connect_delay_ms),
            Duration::from_millis(self.connect_max_delay_ms),
        )
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
