//! # 应用全局状态
//!
//! 在启动时创建一次，以 `Arc<AppState>` 的形式在所有连接任务间共享，
//! 所有 command 函数通过 `&AppState` 参数访问。

use crate::services::orchestrator::ResponseOrchestrator;
use crate::services::session::SessionStore;

pub struct AppState {
    /// 会话注册表
    pub sessions: SessionStore,
    /// 回复编排器（无会话状态，所有会话共用）
    pub orchestrator: ResponseOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: ResponseOrchestrator) -> Self {
        Self {
            sessions: SessionStore::new(),
            orchestrator,
        }
    }
}
