use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索顺序：
    /// 1. ./config.toml
    /// 2. 环境变量（CURATOR_ 前缀）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("CURATOR_").split("_").global());

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("CURATOR_").split("_").global());

        figment.extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.backend != "memory" && config.database.backend != "redb" {
            return Err(ConfigValidationError::InvalidBackend(
                config.database.backend.clone(),
            ));
        }

        if config.database.backend == "redb" && config.database.path.is_empty() {
            return Err(ConfigValidationError::MissingDatabasePath);
        }

        if config.agent.base_url.is_empty() {
            return Err(ConfigValidationError::MissingAgentUrl);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("未知的存储后端: {0}")]
    InvalidBackend(String),

    #[error("redb 数据文件路径未配置")]
    MissingDatabasePath,

    #[error("助手服务地址未配置")]
    MissingAgentUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AppConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let mut config = AppConfig::default();
        config.database.backend = "postgres".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidBackend(_))
        ));
    }
}
