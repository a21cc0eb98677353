use std::env;

/// AppConfig
///
/// The whole configuration of the service, loaded once at startup and shared read-only
/// through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string, or "memory" for the in-process store.
    pub db_url: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // S3-compatible storage for post images (MinIO locally).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    // External identity provider used for registration.
    pub auth_url: String,
    pub auth_key: String,
    // Secret used to validate bearer tokens.
    pub jwt_secret: String,
    // Origins allowed to send state-changing requests, e.g. "https://blogicum.example".
    pub csrf_trusted_origins: Vec<String>,
    pub env: Env,
}

/// Env
///
/// Local enables development conveniences (header auth bypass, bucket provisioning).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

impl Default for AppConfig {
    /// Safe values for tests; no environment access.
    fn default() -> Self {
        Self {
            db_url: "memory".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "blogicum-test".to_string(),
            auth_url: "http://localhost:9999".to_string(),
            auth_key: "local-anon-key".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            csrf_trusted_origins: vec!["http://localhost:3000".to_string()],
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// Panics when a variable required for the current environment is missing, so a
    /// production instance never starts half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let csrf_trusted_origins = env::var("CSRF_TRUSTED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                db_url: env::var("DATABASE_URL").unwrap_or_else(|_| "memory".to_string()),
                bind_addr,
                s3_endpoint: "http://localhost:9000".to_string(),
                s3_region: "us-east-1".to_string(),
                s3_key: "admin".to_string(),
                s3_secret: "password".to_string(),
                s3_bucket: "blogicum-uploads".to_string(),
                auth_url: env::var("AUTH_URL").unwrap_or_else(|_| "http://localhost:9999".to_string()),
                auth_key: env::var("AUTH_KEY").unwrap_or_else(|_| "local-anon-key".to_string()),
                jwt_secret: env::var("AUTH_JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                csrf_trusted_origins,
                env: Env::Local,
            },
            Env::Production => Self {
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                bind_addr,
                s3_endpoint: env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod"),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_key: env::var("S3_ACCESS_KEY").expect("FATAL: S3_ACCESS_KEY required in prod"),
                s3_secret: env::var("S3_SECRET_KEY")
                    .expect("FATAL: S3_SECRET_KEY required in prod"),
                s3_bucket: env::var("S3_BUCKET_NAME")
                    .unwrap_or_else(|_| "blogicum-uploads".to_string()),
                auth_url: env::var("AUTH_URL").expect("FATAL: AUTH_URL required in prod"),
                auth_key: env::var("AUTH_KEY").expect("FATAL: AUTH_KEY required in prod"),
                jwt_secret: env::var("AUTH_JWT_SECRET")
                    .expect("FATAL: AUTH_JWT_SECRET must be set in production."),
                csrf_trusted_origins,
                env: Env::Production,
            },
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.db_url == "memory"
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" https://a.example/ ,,http://b.example:8080"),
            vec!["https://a.example", "http://b.example:8080"]
        );
    }
}
