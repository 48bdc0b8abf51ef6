//! Configuration module for the certificate backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::certificate::DEFAULT_FONT_PATHS;
use crate::errors::AppError;
use crate::verify::DEFAULT_SCHOOL_KEYWORDS;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes (required in production)
    pub admin_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Ordered list of TrueType fonts to try for certificates
    pub font_paths: Vec<PathBuf>,
    /// Keywords a school name must contain to pass verification
    pub school_keywords: Vec<String>,
    /// Public base URL used in sign-in links sent by email
    pub public_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let admin_key = env::var("CERT_ADMIN_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("CERT_DB_PATH")
            .unwrap_or_else(|_| "./data/certificates.sqlite".to_string())
            .into();

        let bind_addr = env::var("CERT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid CERT_BIND_ADDR format: {}", e)))?;

        let log_level = env::var("CERT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let font_paths = match env::var("CERT_FONT_PATHS") {
            Ok(paths) => env::split_paths(&paths).collect(),
            Err(_) => DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
        };

        let school_keywords = match env::var("CERT_SCHOOL_KEYWORDS") {
            Ok(keywords) => split_list(&keywords),
            Err(_) => DEFAULT_SCHOOL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        };

        let mut public_url =
            env::var("CERT_PUBLIC_URL").unwrap_or_else(|_| "http://127.0.0.1:8080/".to_string());
        if !public_url.ends_with('/') {
            public_url.push('/');
        }

        Ok(Self {
            admin_key,
            db_path,
            bind_addr,
            log_level,
            font_paths,
            school_keywords,
            public_url,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("CERT_ADMIN_KEY");
        env::remove_var("CERT_DB_PATH");
        env::remove_var("CERT_BIND_ADDR");
        env::remove_var("CERT_LOG_LEVEL");
        env::remove_var("CERT_FONT_PATHS");
        env::remove_var("CERT_SCHOOL_KEYWORDS");
        env::remove_var("CERT_PUBLIC_URL");

        let config = Config::from_env().unwrap();

        assert!(config.admin_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/certificates.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.font_paths.len(), DEFAULT_FONT_PATHS.len());
        assert!(config.school_keywords.contains(&"academy".to_string()));
        assert_eq!(config.public_url, "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" School, ACADEMY ,,lyceum"),
            vec!["school", "academy", "lyceum"]
        );
    }
}
