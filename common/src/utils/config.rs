use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub eye_level_api_key: String,
    pub openai_api_key: String,
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    pub redis_password: String,
    #[serde(default = "default_cache_expiration")]
    pub cache_expiration: u64,
    #[serde(default = "default_eye_level_base_url")]
    pub eye_level_base_url: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_max_checks")]
    pub poll_max_checks: u32,
    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: usize,
}

fn default_redis_port() -> u16 {
    13600
}

fn default_cache_expiration() -> u64 {
    3600
}

fn default_eye_level_base_url() -> String {
    "https://api.eyelevel.ai/v1".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_max_checks() -> u32 {
    120
}

fn default_upload_max_bytes() -> usize {
    10_000_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            eye_level_api_key: String::new(),
            openai_api_key: String::new(),
            redis_host: String::new(),
            redis_port: default_redis_port(),
            redis_password: String::new(),
            cache_expiration: default_cache_expiration(),
            eye_level_base_url: default_eye_level_base_url(),
            openai_base_url: default_openai_base_url(),
            http_port: default_http_port(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_max_checks: default_poll_max_checks(),
            upload_max_bytes: default_upload_max_bytes(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        Config::builder()
            .add_source(Environment::default().source(Some(map)))
            .build()?
            .try_deserialize()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("EYE_LEVEL_API_KEY", "el-key"),
        ("OPENAI_API_KEY", "oa-key"),
        ("REDIS_HOST", "redis.internal"),
        ("REDIS_PASSWORD", "hunter2"),
    ];

    #[test]
    fn applies_defaults_when_only_required_keys_are_set() {
        let config = config_from(&REQUIRED).unwrap();

        assert_eq!(config.redis_port, 13600);
        assert_eq!(config.cache_expiration, 3600);
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.poll_max_checks, 120);
        assert_eq!(config.upload_max_bytes, 10_000_000);
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn reports_the_missing_key_by_name() {
        let error = config_from(&[
            ("OPENAI_API_KEY", "oa-key"),
            ("REDIS_HOST", "redis.internal"),
            ("REDIS_PASSWORD", "hunter2"),
        ])
        .unwrap_err();

        assert!(error.to_string().contains("eye_level_api_key"));
    }

    #[test]
    fn parses_numeric_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("REDIS_PORT", "6379"));
        vars.push(("CACHE_EXPIRATION", "60"));
        vars.push(("POLL_MAX_CHECKS", "3"));

        let config = config_from(&vars).unwrap();

        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.cache_expiration, 60);
        assert_eq!(config.poll_max_checks, 3);
    }
}
