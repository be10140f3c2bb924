//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。
//! 标记解析相关的问题不属于错误：不可信的模型输出在解析层被就地恢复，
//! 只有协作方调用（模型、持久化）失败才会升级为 AppError。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 模型调用错误
    #[error("模型调用失败: {0}")]
    Agent(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Agent(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        // 模型调用失败对外只暴露一个粗粒度的"请重试"消息，不泄露内部细节
        let message = match &self {
            AppError::Agent(_) => "助手暂时不可用，请稍后重试".to_string(),
            other => other.to_string(),
        };
        let body = Json(ErrorResponse::new(&code, &message));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Agent(_) => (502, "AGENT_UNAVAILABLE".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let (status, code): (u16, String) = (&AppError::NotFound("x".into())).into();
        assert_eq!(status, 404);
        assert_eq!(code, "NOT_FOUND");

        let (status, code): (u16, String) = (&AppError::Agent("boom".into())).into();
        assert_eq!(status, 502);
        assert_eq!(code, "AGENT_UNAVAILABLE");
    }

    #[test]
    fn test_error_response_details() {
        let resp = ErrorResponse::new("INTERNAL_ERROR", "内部错误").with_details("trace-1");
        assert_eq!(resp.details.as_deref(), Some("trace-1"));
    }
}
