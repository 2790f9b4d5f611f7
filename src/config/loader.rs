use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 内置开发环境默认值
    /// 2. ./config.toml 或 VPATIENT_CONFIG 指定的文件
    /// 3. VPATIENT_ 前缀的环境变量（`__` 分隔层级）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var("VPATIENT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(&path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> Result<AppConfig, figment::Error> {
        let mut config: AppConfig = Self::figment(path).extract()?;
        if config.completion.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                config.completion.api_key = key.trim().to_string();
            }
        }
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VPATIENT_").split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.completion.backend == "openai" && config.completion.model.trim().is_empty() {
            return Err(ConfigValidationError::MissingModel);
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigValidationError::InvalidDimension);
        }

        if config.knowledge.result_limit == 0 {
            return Err(ConfigValidationError::InvalidResultLimit);
        }

        if config.knowledge.status_ttl_secs == 0 {
            return Err(ConfigValidationError::InvalidStatusTtl);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("补全模型名称未配置")]
    MissingModel,

    #[error("向量维度无效，必须大于 0")]
    InvalidDimension,

    #[error("检索数量无效，必须大于 0")]
    InvalidResultLimit,

    #[error("上传状态保留时间无效，必须大于 0")]
    InvalidStatusTtl,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_development_config_is_valid() {
        let config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.knowledge.result_limit, 3);
        assert_eq!(config.completion.max_tokens, 500);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_result_limit() {
        let mut config = AppConfig::development();
        config.knowledge.result_limit = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidResultLimit)
        ));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[completion]\nbackend = \"offline\"\ntemperature = 0.8"
        )
        .unwrap();

        let config = ConfigLoader::figment(file.path()).extract::<AppConfig>().unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.completion.backend, "offline");
        assert!((config.completion.temperature - 0.8).abs() < f32::EPSILON);
        // 未覆盖的字段保持默认值
        assert_eq!(config.knowledge.status_ttl_secs, 3600);
    }

    #[test]
    fn test_is_online_requires_key() {
        let mut config = AppConfig::development();
        config.completion.api_key = String::new();
        assert!(!config.completion.is_online());

        config.completion.api_key = "sk-test".into();
        assert!(config.completion.is_online());

        config.completion.backend = "offline".into();
        assert!(!config.completion.is_online());
    }
}
