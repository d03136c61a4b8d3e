use anyhow::{anyhow, Context};

const DEFAULT_DATABASE_NAME: &str = "cinema-axum";
const DEFAULT_JWT_EXPIRES_IN_SECS: i64 = 3600;

/// Runtime settings, read from the deployment's secret store.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub app_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("secret {key} was not found"))
        };

        let jwt_ttl_secs = match lookup("JWT_EXPIRES_IN_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("JWT_EXPIRES_IN_SECS is not a number: {raw}"))?,
            None => DEFAULT_JWT_EXPIRES_IN_SECS,
        };

        Ok(AppConfig {
            mongodb_uri: required("MONGODB_URI")?,
            app_url: required("APP_URL")?,
            jwt_secret: required("JWT_SECRET_KEY")?,
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            jwt_ttl_secs,
        })
    }
}
