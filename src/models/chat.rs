//! # 对话数据模型
//!
//! 定义了对话轮次（ChatTurn）、轨道名称（TrackName）和对话轨道（ChatTrack）等 Rust 结构体。
//!
//! 每个用户会话包含两条独立的轨道：
//! - `adapter` 轨道：使用配置的微调模型 ID 生成回复
//! - `base` 轨道：使用空模型 ID，由服务商选择默认模型
//!
//! 轨道中轮次的插入顺序即对话历史，会原样回传给模型。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 对话角色
///
/// 序列化为小写字符串（`"system"` / `"user"` / `"assistant"`），
/// 与 chat-completion API 的 `role` 字段取值一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// 单个对话轮次
///
/// 创建后不可修改：字段只通过构造函数写入，只读访问器读取。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: ChatRole,
    content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// 轨道名称
///
/// 一个会话固定包含这两条轨道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackName {
    Adapter,
    Base,
}

impl TrackName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackName::Adapter => "adapter",
            TrackName::Base => "base",
        }
    }
}

impl fmt::Display for TrackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对话轨道：按插入顺序排列的轮次序列
///
/// 只允许追加，不提供删除或修改接口。
/// 序列化为轮次数组，页面直接按顺序渲染。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatTrack {
    turns: Vec<ChatTurn>,
}

impl ChatTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// 模型配置
///
/// `model_identifier` 为空字符串时表示"使用服务商默认模型"，空串会原样发送给 API。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub model_identifier: String,
}

impl ModelConfig {
    /// 使用指定模型 ID（adapter 轨道）
    pub fn named(model_identifier: impl Into<String>) -> Self {
        Self {
            model_identifier: model_identifier.into(),
        }
    }

    /// 服务商默认模型（base 轨道）
    pub fn provider_default() -> Self {
        Self::default()
    }
}
