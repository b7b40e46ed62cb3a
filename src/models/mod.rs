//! # 数据模型模块
//!
//! 定义了对话状态和页面接口所需的 Rust 数据结构：
//! - `chat` - 对话角色、轮次、轨道和模型配置
//! - `display` - 页面 JSON 接口的请求/响应结构
//! - `settings` - `.secrets.toml` 凭据和服务配置

pub mod chat;
pub mod display;
pub mod settings;
