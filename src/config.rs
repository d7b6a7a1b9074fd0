use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub bcrypt_cost: u32,
    /// Unactivated accounts older than this are removed by the cleanup sweep.
    pub stale_account_days: i64,
    pub cors_allowed_origin: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                .parse()?,
            stale_account_days: env::var("STALE_ACCOUNT_DAYS")
                .unwrap_or_else(|_| "3".into())
                .parse()?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:4200".into()),
        })
    }
}

pub fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_names_the_key() {
        let err = required("SEMEAR_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("SEMEAR_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn token_lifetime_is_not_read_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/semear");
        env::set_var("JWT_SECRET", "segredo");
        env::set_var("JWT_EXPIRY_SECONDS", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(config.jwt_secret, "segredo");
    }
}
