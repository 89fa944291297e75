// src/config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub redis_db: u8,
    pub redis_enabled: bool,
    pub upload_dir: String,
    pub page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let host = env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("BACKEND_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .expect("BACKEND_PORT must be a valid u16");
        let redis_host = env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string());
        let redis_port = env::var("REDIS_PORT")
            .unwrap_or_else(|_| "6379".to_string())
            .parse()
            .expect("REDIS_PORT must be a valid u16");
        let redis_password = env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty());
        let redis_db = env::var("REDIS_DB")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .expect("REDIS_DB must be a valid db index");
        let redis_enabled = env::var("REDIS_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(true);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let page_size = env::var("RECOMMENDATION_PAGE_SIZE")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .expect("RECOMMENDATION_PAGE_SIZE must be a positive integer");

        Self {
            host,
            port,
            redis_host,
            redis_port,
            redis_password,
            redis_db,
            redis_enabled,
            upload_dir,
            page_size,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn redis_url(&self) -> String {
        match &self.redis_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis_host, self.redis_port, self.redis_db
            ),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_includes_password_when_set() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            redis_host: "cache.internal".to_string(),
            redis_port: 6380,
            redis_password: Some("s3cret".to_string()),
            redis_db: 2,
            redis_enabled: true,
            upload_dir: "./uploads".to_string(),
            page_size: 5,
        };
        assert_eq!(config.redis_url(), "redis://:s3cret@cache.internal:6380/2");
    }

    #[test]
    fn redis_url_without_password() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_db: 0,
            redis_enabled: true,
            upload_dir: "./uploads".to_string(),
            page_size: 5,
        };
        assert_eq!(config.redis_url(), "redis://localhost:6379/0");
    }
}
