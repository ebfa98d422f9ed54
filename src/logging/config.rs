/// Settings for the tracing subscriber
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub production: bool,
    /// Default directive for this crate when `RUST_LOG` is unset.
    pub level: String,
    pub directory: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT").is_ok_and(|env| env == "production");
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if production {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });
        Self {
            production,
            level,
            directory: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }

    pub fn default_directives(&self) -> String {
        format!(
            "site_backend={},tower_http=debug,axum=info,sqlx=warn",
            self.level
        )
    }
}
