//! # 凭据和服务配置数据模型
//!
//! 定义了从 `.secrets.toml` 读取的配置结构体（ApiSettings）。
//!
//! 文件格式示例：
//! ```toml
//! API_KEY = "sk-..."
//! API_URL = "http://localhost:8000/v1"
//! API_MODEL = "jamela-adapter"
//! # 可选项
//! PERSONA = "Jamela"
//! BIND_ADDR = "127.0.0.1:8501"
//! ```

use serde::Deserialize;

/// 未配置 `PERSONA` 时使用的人设名称
pub const DEFAULT_PERSONA: &str = "Jamela";

/// 未配置 `BIND_ADDR` 时的监听地址
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// 应用配置
///
/// 三个必填项（`API_KEY`、`API_URL`、`API_MODEL`）缺失或为空时视为致命配置错误，
/// 由 `services::settings::load_settings` 负责校验。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ApiSettings {
    /// chat-completion API 的密钥，以 Bearer token 方式发送
    pub api_key: String,

    /// API 基础地址（如 `https://api.openai.com/v1`），请求发送到 `{api_url}/chat/completions`
    pub api_url: String,

    /// adapter 轨道使用的微调模型 ID
    pub api_model: String,

    /// 系统提示词使用的人设名称
    #[serde(default = "default_persona")]
    pub persona: String,

    /// HTTP 服务监听地址
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
