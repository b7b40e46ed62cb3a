//! # 页面接口数据模型
//!
//! 定义了页面与服务端之间通过 JSON 传输的请求/响应结构体。
//! 所有字段以 camelCase 序列化，页面脚本直接读取。
//!
//! ## 数据流
//! ```text
//! 页面 → POST /api/submit { prompt }
//!      → orchestrator::submit → (adapter 回复, base 回复)
//!      → SubmitResponse { accepted, adapterReply, baseReply, adapter, base }
//!      → 页面用两条轨道整体重绘两个对话面板
//! ```

use serde::{Deserialize, Serialize};

use crate::models::chat::{ChatTrack, TrackName};

/// 会话快照：两条轨道的完整内容
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// 会话 ID（同时写入 cookie）
    pub session_id: String,
    pub adapter: ChatTrack,
    pub base: ChatTrack,
}

/// 提交请求体
#[derive(Deserialize, Clone, Debug)]
pub struct SubmitRequest {
    /// 用户输入；缺省等同于空字符串
    #[serde(default)]
    pub prompt: String,
}

/// 提交结果
///
/// 空输入时 `accepted` 为 false，两个回复字段省略，轨道保持原样。
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_reply: Option<String>,
    pub adapter: ChatTrack,
    pub base: ChatTrack,
}

/// 错误响应体
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    /// 生成失败的轨道（仅生成错误时非空）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_tracks: Vec<TrackName>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            failed_tracks: Vec::new(),
        }
    }
}
