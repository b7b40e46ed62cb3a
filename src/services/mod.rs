//! # 业务逻辑服务模块
//!
//! 包含核心业务逻辑的实现，与 HTTP 路由层解耦：
//! - `session` - 会话状态：单会话的两条对话轨道 + 会话注册表
//! - `orchestrator` - 回复编排：一次输入并发生成两路回复并写回轨道
//! - `chat_client` - chat-completion API 客户端及其 trait 抽象
//! - `persona` - 人设文本库和系统提示词构造
//! - `settings` - `.secrets.toml` 凭据加载与校验

pub mod chat_client;
pub mod orchestrator;
pub mod persona;
pub mod session;
pub mod settings;
