//! # Chat Completion 客户端
//!
//! 对上游 chat-completion API 的一层薄封装：
//! 给定模型 ID、按顺序排列的角色消息和输出 token 上限，返回首个候选回复的文本。
//!
//! ## 接口抽象
//! `ChatClient` trait 隔离了 HTTP 传输细节，提交流程只依赖该 trait，
//! 测试中替换为脚本化的假实现即可，无需真实 API。
//!
//! ## 线路格式（OpenAI 兼容）
//! ```text
//! POST {API_URL}/chat/completions
//! Authorization: Bearer {API_KEY}
//! { "model": "...", "messages": [{ "role": "...", "content": "..." }], "max_tokens": 3000 }
//! → { "choices": [{ "message": { "content": "..." } }] }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::chat::ChatTurn;

/// 单次请求的总超时
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// 建立连接的超时
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 错误信息中保留的响应体最大字符数
const ERROR_BODY_MAX_CHARS: usize = 512;

/// 一次生成请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    /// 模型 ID；空字符串表示服务商默认模型
    pub model: String,
    /// 按顺序排列的消息，第一条为系统提示词
    pub messages: Vec<ChatTurn>,
    /// 回复长度上限（token 数）
    pub max_tokens: u32,
}

/// 生成调用的错误
#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    /// 网络层失败（连接、超时、读取响应体）
    #[error("请求发送失败: {0}")]
    Transport(String),

    /// API 返回非 2xx 状态码
    #[error("API 返回错误状态 {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应体不是预期的 JSON 结构
    #[error("解析 API 响应失败: {0}")]
    Malformed(String),

    /// 响应中没有候选回复，或回复内容为 null
    #[error("API 响应中没有可用的回复")]
    EmptyReply,
}

/// chat-completion 调用接口
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// 发送一次生成请求并返回回复文本
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatClientError>;
}

/// OpenAI 兼容 API 的 HTTP 客户端
pub struct OpenAiChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiChatClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - `api_url` - API 基础地址，末尾斜杠可有可无
    /// - `api_key` - Bearer token
    ///
    /// # 错误
    /// 底层 HTTP 客户端构建失败（如 TLS 初始化失败）时返回错误
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("创建 HTTP 客户端失败: {}", e))?;

        Ok(Self {
            http,
            endpoint: completions_endpoint(api_url),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatClientError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_MAX_CHARS),
            });
        }

        parse_completion(&body)
    }
}

/// 拼接 chat/completions 端点地址
pub fn completions_endpoint(api_url: &str) -> String {
    format!("{}/chat/completions", api_url.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 从响应体中取出首个候选回复的文本
pub fn parse_completion(body: &str) -> Result<String, ChatClientError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| ChatClientError::Malformed(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ChatClientError::EmptyReply)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
