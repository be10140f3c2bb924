//! 模型运行时
//!
//! 对话流水线只依赖 `AgentRuntime` trait，生产环境走 OpenAI 兼容的
//! chat completions 接口（Ollama、vLLM 等都支持），测试用内置的假实现。

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AgentConfig;
use crate::error::{AppError, Result};

/// 助手运行时抽象
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// 发起一轮对话，返回模型原始文本（可能包含标记与组件块）
    async fn invoke(&self, system_prompt: &str, message: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI 兼容接口客户端
pub struct OpenAiCompatAgent {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatAgent {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| AppError::Config(format!("API 密钥不是合法的头部值: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl AgentRuntime for OpenAiCompatAgent {
    async fn invoke(&self, system_prompt: &str, message: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Agent(format!(
                "模型服务返回 {status}: {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Agent("模型响应没有 choices".to_string()))?;

        Ok(content)
    }
}

/// 创建助手运行时
pub fn create_agent(config: &AgentConfig) -> Result<std::sync::Arc<dyn AgentRuntime>> {
    let agent = OpenAiCompatAgent::new(config)?;
    Ok(std::sync::Arc::new(agent))
}
