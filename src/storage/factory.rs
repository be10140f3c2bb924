//! 仓储工厂
//!
//! 根据配置选择存储后端，返回统一的 trait 对象。

use std::path::Path;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::memstore::InMemoryRepository;
use crate::storage::redb_store::RedbRepository;
use crate::storage::repository::ChatRepository;

/// 创建仓储实例
///
/// - `memory`: 进程内存储，重启即失，用于测试与本地开发
/// - `redb`: 嵌入式单文件数据库
pub fn create_repository(config: &DatabaseConfig) -> Result<Arc<dyn ChatRepository>> {
    match config.backend.as_str() {
        "memory" => {
            tracing::info!("使用内存仓储后端");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        "redb" => {
            let path = Path::new(&config.path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            tracing::info!(path = %config.path, "使用 redb 仓储后端");
            let repo = RedbRepository::open(path)?;
            Ok(Arc::new(repo))
        }
        other => Err(AppError::Config(format!(
            "未知的存储后端: {other}（可选: memory / redb）"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_rejected() {
        let config = DatabaseConfig {
            backend: "surreal".into(),
            path: String::new(),
        };
        assert!(create_repository(&config).is_err());
    }

    #[test]
    fn test_memory_backend() {
        let config = DatabaseConfig {
            backend: "memory".into(),
            path: String::new(),
        };
        assert!(create_repository(&config).is_ok());
    }
}
