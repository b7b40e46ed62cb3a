//! # 会话状态管理服务
//!
//! 提供两层会话状态：
//! - **ChatSession**：单个用户会话的对话上下文，包含 adapter 和 base 两条独立轨道
//! - **SessionStore**：会话注册表，按会话 ID 管理 ChatSession 的生命周期
//!
//! ## 生命周期
//! - 会话在首次访问时创建，两条轨道均为空
//! - 已存在的会话再次访问时原样返回，历史不会被清空
//! - 会话在以下情况结束（状态随之丢弃，不做持久化）：
//!   - 用户显式结束会话
//!   - 空闲超过 TTL，下次访问时视为已结束
//!   - 注册表已满，最久未访问的会话被 LRU 淘汰
//!
//! ## 线程安全
//! 注册表本身使用 `std::sync::Mutex` 保护，临界区只包含查找和插入。
//! 每个会话另有一把 `tokio::sync::Mutex`，一次提交期间持有，
//! 保证同一会话内的提交串行执行；不同会话之间互不共享任何状态。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::models::chat::{ChatTrack, ChatTurn, TrackName};

/// 会话空闲超时（秒）
///
/// 超过此时间未访问的会话在下次访问时被丢弃并重新创建。
const SESSION_IDLE_TTL_SECS: u64 = 60 * 60;

/// 同时存活的最大会话数
const MAX_SESSIONS: usize = 256;

/// 单个用户会话的对话上下文
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    adapter: ChatTrack,
    base: ChatTrack,
}

impl ChatSession {
    /// 创建两条空轨道
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定轨道
    pub fn track(&self, name: TrackName) -> &ChatTrack {
        match name {
            TrackName::Adapter => &self.adapter,
            TrackName::Base => &self.base,
        }
    }

    /// 向指定轨道追加一个轮次，不影响另一条轨道
    pub fn append_turn(&mut self, name: TrackName, turn: ChatTurn) {
        match name {
            TrackName::Adapter => self.adapter.push(turn),
            TrackName::Base => self.base.push(turn),
        }
    }
}

/// 会话共享句柄
pub type SharedSession = Arc<tokio::sync::Mutex<ChatSession>>;

/// `get_or_create` 的返回值
pub struct SessionHandle {
    /// 会话 ID（新建时为新生成的 ID）
    pub id: String,
    pub session: SharedSession,
    /// 是否为本次调用新建的会话
    pub created: bool,
}

/// 注册表中的单个条目
struct SessionEntry {
    session: SharedSession,
    /// 最后访问时间（用于空闲超时判断）
    last_accessed: Instant,
}

/// 会话注册表
pub struct SessionStore {
    sessions: Mutex<LruCache<String, SessionEntry>>,
    idle_ttl: Duration,
}

impl SessionStore {
    /// 使用默认容量和空闲超时创建注册表
    pub fn new() -> Self {
        Self::with_limits(MAX_SESSIONS, Duration::from_secs(SESSION_IDLE_TTL_SECS))
    }

    /// 使用自定义容量和空闲超时创建注册表
    ///
    /// 容量为 0 时按 1 处理。
    pub fn with_limits(max_sessions: usize, idle_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            idle_ttl,
        }
    }

    /// 获取已存在的会话，不存在或已过期时新建
    ///
    /// 对同一个存活会话重复调用是幂等的：不会清空其历史。
    ///
    /// # 参数
    /// - `id` - 客户端携带的会话 ID（如 cookie 中的值）；为 None 时直接新建
    pub fn get_or_create(&self, id: Option<&str>) -> SessionHandle {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(id) = id {
            let expired = match sessions.get_mut(id) {
                Some(entry) if entry.last_accessed.elapsed() <= self.idle_ttl => {
                    entry.last_accessed = Instant::now();
                    return SessionHandle {
                        id: id.to_string(),
                        session: entry.session.clone(),
                        created: false,
                    };
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                sessions.pop(id);
                log::info!("会话空闲超时，已丢弃: {}", id);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session: SharedSession = Arc::new(tokio::sync::Mutex::new(ChatSession::new()));
        let evicted = sessions.push(
            id.clone(),
            SessionEntry {
                session: session.clone(),
                last_accessed: Instant::now(),
            },
        );
        if let Some((evicted_id, _)) = evicted {
            log::info!("会话数量已达上限，淘汰最久未访问的会话: {}", evicted_id);
        }
        log::debug!("已创建会话: {}", id);

        SessionHandle {
            id,
            session,
            created: true,
        }
    }

    /// 结束会话并丢弃其状态
    ///
    /// # 返回值
    /// 会话存在时返回 true
    pub fn end(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = sessions.pop(id).is_some();
        if removed {
            log::info!("会话已结束: {}", id);
        }
        removed
    }

    /// 当前存活的会话数量
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 是否没有存活的会话
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
