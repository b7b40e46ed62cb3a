//! # 页面 Command 处理模块
//!
//! 本模块包含页面 JSON 接口背后的 command 处理函数，与 HTTP 路由解耦：
//! - `chat` - 读取会话、提交输入、结束会话

pub mod chat;

/// command 的返回值：结果本身 + 本次使用的会话 ID
///
/// 路由层根据 `session_created` 决定是否下发新的会话 cookie。
#[derive(Debug)]
pub struct CommandOutput<T> {
    pub session_id: String,
    pub session_created: bool,
    pub body: T,
}
