use serde::{Deserialize, Serialize};
use std::env;
use std::ops::RangeInclusive;
use tracing::warn;

/// bcrypt costs accepted outside the test environment.
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 10..=31;
const TEST_BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
const JWT_EXPIRY_HOURS_RANGE: RangeInclusive<u64> = 1..=24 * 365;
const COOKIE_EXPIRY_DAYS_RANGE: RangeInclusive<i64> = 1..=365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL used when building links sent to users (password reset).
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://...` or `memory://`
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cookie_expiry_days: i64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
            Environment::Test => Self::test_profile(),
        }
        .with_env_overrides()
        .with_bounds()
    }

    /// `APP_ENV=test`: the test defaults without the fixed secret, so a
    /// server still refuses to start unless `JWT_SECRET` is set.
    fn test_profile() -> Self {
        let mut config = Self::test();
        config.security.jwt_secret = String::new();
        config
    }

    /// Pulls overridden security values back into their supported ranges.
    fn with_bounds(mut self) -> Self {
        let cost_range = if self.environment == Environment::Test {
            TEST_BCRYPT_COST_RANGE
        } else {
            BCRYPT_COST_RANGE
        };
        let security = &mut self.security;

        let cost = clamp_to(&cost_range, security.bcrypt_cost);
        if cost != security.bcrypt_cost {
            warn!("BCRYPT_COST={} is out of range, using {}", security.bcrypt_cost, cost);
            security.bcrypt_cost = cost;
        }
        let hours = clamp_to(&JWT_EXPIRY_HOURS_RANGE, security.jwt_expiry_hours);
        if hours != security.jwt_expiry_hours {
            warn!("JWT_EXPIRY_HOURS={} is out of range, using {}", security.jwt_expiry_hours, hours);
            security.jwt_expiry_hours = hours;
        }
        let days = clamp_to(&COOKIE_EXPIRY_DAYS_RANGE, security.cookie_expiry_days);
        if days != security.cookie_expiry_days {
            warn!("JWT_COOKIE_EXPIRE_DAYS={} is out of range, using {}", security.cookie_expiry_days, days);
            security.cookie_expiry_days = days;
        }
        self
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PUBLIC_URL") {
            self.server.public_url = v.trim_end_matches('/').to_string();
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().unwrap_or(self.filter.max_limit);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("JWT_COOKIE_EXPIRE_DAYS") {
            self.security.cookie_expiry_days = v.parse().unwrap_or(self.security.cookie_expiry_days);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                public_url: "http://localhost:5000".to_string(),
            },
            filter: FilterConfig {
                default_limit: 10,
                max_limit: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/bootcamps".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 30,
                cookie_expiry_days: 30,
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 5000,
                public_url: "https://staging.example.com".to_string(),
            },
            filter: FilterConfig {
                default_limit: 10,
                max_limit: 500,
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                secure_cookies: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                cookie_expiry_days: 7,
                bcrypt_cost: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 5000,
                public_url: "https://app.example.com".to_string(),
            },
            filter: FilterConfig {
                default_limit: 10,
                max_limit: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                secure_cookies: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cookie_expiry_days: 1,
                bcrypt_cost: 12,
            },
        }
    }

    /// In-memory store, a fixed secret and a cheap bcrypt cost for the test
    /// suites. `APP_ENV=test` starts from this without the secret.
    pub fn test() -> Self {
        Self {
            environment: Environment::Test,
            server: ServerConfig {
                port: 0,
                public_url: "http://localhost".to_string(),
            },
            filter: FilterConfig {
                default_limit: 10,
                max_limit: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: "memory://".to_string(),
                max_connections: 1,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec![],
                secure_cookies: false,
                jwt_secret: "test-secret-do-not-use".to_string(),
                jwt_expiry_hours: 1,
                cookie_expiry_days: 1,
                bcrypt_cost: 4,
            },
        }
    }
}

fn clamp_to<T: PartialOrd + Copy>(range: &RangeInclusive<T>, value: T) -> T {
    if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        value
    }
}
