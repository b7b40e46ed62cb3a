//! # 对话 Commands
//!
//! 提供页面使用的三个 command：
//! - `read_session` - 读取（必要时创建）当前会话的两条轨道
//! - `submit_prompt` - 把一次输入同时发送给两种模型配置
//! - `end_session` - 结束当前会话
//!
//! 会话在首次调用任一读写 command 时创建，之后通过会话 ID 定位。

use crate::commands::CommandOutput;
use crate::models::chat::TrackName;
use crate::models::display::{ErrorBody, SessionView, SubmitRequest, SubmitResponse};
use crate::state::AppState;

/// 读取当前会话的两条轨道
///
/// # 参数
/// - `state` - 应用全局状态
/// - `session_id` - 客户端携带的会话 ID；无效或缺失时新建会话
pub async fn read_session(state: &AppState, session_id: Option<&str>) -> CommandOutput<SessionView> {
    let handle = state.sessions.get_or_create(session_id);
    let session = handle.session.lock().await;

    let view = SessionView {
        session_id: handle.id.clone(),
        adapter: session.track(TrackName::Adapter).clone(),
        base: session.track(TrackName::Base).clone(),
    };

    CommandOutput {
        session_id: handle.id,
        session_created: handle.created,
        body: view,
    }
}

/// 提交一次用户输入
///
/// 会话锁在整个提交期间持有，同一会话的并发提交按顺序执行。
///
/// # 返回值
/// - `Ok(SubmitResponse)` - 成功或空输入（`accepted = false`），附带两条轨道的最新内容
/// - `Err(ErrorBody)` - 生成失败，`failed_tracks` 标明失败的轨道；会话状态未修改
pub async fn submit_prompt(
    state: &AppState,
    session_id: Option<&str>,
    request: SubmitRequest,
) -> CommandOutput<Result<SubmitResponse, ErrorBody>> {
    let handle = state.sessions.get_or_create(session_id);
    let mut session = handle.session.lock().await;

    let body = match state
        .orchestrator
        .submit(&mut session, &request.prompt)
        .await
    {
        Ok(outcome) => {
            let (adapter_reply, base_reply) = match outcome {
                Some(outcome) => (Some(outcome.adapter_reply), Some(outcome.base_reply)),
                None => (None, None),
            };
            Ok(SubmitResponse {
                accepted: adapter_reply.is_some(),
                adapter_reply,
                base_reply,
                adapter: session.track(TrackName::Adapter).clone(),
                base: session.track(TrackName::Base).clone(),
            })
        }
        Err(err) => Err(ErrorBody {
            error: err.to_string(),
            failed_tracks: err.failed_tracks(),
        }),
    };

    CommandOutput {
        session_id: handle.id,
        session_created: handle.created,
        body,
    }
}

/// 结束当前会话
///
/// # 返回值
/// 会话存在并被丢弃时返回 true；未携带会话 ID 或会话已不存在时返回 false
pub fn end_session(state: &AppState, session_id: Option<&str>) -> bool {
    session_id.map(|id| state.sessions.end(id)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::models::chat::ChatRole;
    use crate::services::orchestrator::tests::{ScriptedClient, orchestrator};

    fn app_state(client: Arc<ScriptedClient>) -> AppState {
        AppState::new(orchestrator(client))
    }

    #[tokio::test]
    async fn test_read_session_creates_once() {
        let state = app_state(Arc::new(ScriptedClient::default()));
        let first = read_session(&state, None).await;
        assert!(first.session_created);
        assert!(first.body.adapter.is_empty());

        let again = read_session(&state, Some(&first.session_id)).await;
        assert!(!again.session_created);
        assert_eq!(again.session_id, first.session_id);
    }

    #[tokio::test]
    async fn test_submit_then_read_returns_history() {
        let state = app_state(Arc::new(ScriptedClient::default()));
        let submitted = submit_prompt(
            &state,
            None,
            SubmitRequest {
                prompt: "Hello".into(),
            },
        )
        .await;
        let response = submitted.body.unwrap();
        assert!(response.accepted);
        assert_eq!(response.adapter_reply.as_deref(), Some("A1"));
        assert_eq!(response.base.len(), 2);

        let view = read_session(&state, Some(&submitted.session_id)).await.body;
        assert_eq!(view.adapter.len(), 2);
        assert_eq!(view.base.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_submit_not_accepted() {
        let client = Arc::new(ScriptedClient::default());
        let state = app_state(client.clone());
        let output = submit_prompt(&state, None, SubmitRequest { prompt: " ".into() }).await;
        let response = output.body.unwrap();
        assert!(!response.accepted);
        assert!(response.adapter_reply.is_none());
        assert!(response.adapter.is_empty());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_reports_tracks() {
        let client = Arc::new(ScriptedClient::failing(
            crate::services::orchestrator::tests::ADAPTER_ID,
        ));
        let state = app_state(client);
        let output = submit_prompt(
            &state,
            None,
            SubmitRequest {
                prompt: "Hello".into(),
            },
        )
        .await;
        let err = output.body.unwrap_err();
        assert_eq!(err.failed_tracks, vec![TrackName::Adapter]);

        let view = read_session(&state, Some(&output.session_id)).await.body;
        assert!(view.adapter.is_empty());
        assert!(view.base.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submits_in_one_session_are_serialized() {
        const SUBMITS: usize = 16;
        let state = Arc::new(app_state(Arc::new(ScriptedClient::default())));
        let id = read_session(&state, None).await.session_id;

        let tasks: Vec<_> = (0..SUBMITS)
            .map(|i| {
                let state = state.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let request = SubmitRequest {
                        prompt: format!("msg {}", i),
                    };
                    submit_prompt(&state, Some(&id), request).await
                })
            })
            .collect();
        for task in tasks {
            let output = task.await.unwrap();
            assert!(!output.session_created);
            assert!(output.body.unwrap().accepted);
        }

        let view = read_session(&state, Some(&id)).await.body;
        assert_eq!(view.adapter.len(), 2 * SUBMITS);
        assert_eq!(view.base.len(), 2 * SUBMITS);

        // 每个用户轮次之后紧跟它自己的回复；第 k 次提交拿到第 k 次调用的回复
        let mut prompts = Vec::new();
        for k in 0..SUBMITS {
            let (adapter, base) = (view.adapter.turns(), view.base.turns());
            assert_eq!(adapter[2 * k].role(), ChatRole::User);
            assert_eq!(adapter[2 * k + 1].role(), ChatRole::Assistant);
            assert_eq!(adapter[2 * k + 1].content(), format!("A{}", k + 1));
            assert_eq!(base[2 * k], adapter[2 * k]);
            assert_eq!(base[2 * k + 1].role(), ChatRole::Assistant);
            assert_eq!(base[2 * k + 1].content(), format!("B{}", k + 1));
            prompts.push(adapter[2 * k].content().to_string());
        }
        prompts.sort();
        let mut expected: Vec<String> = (0..SUBMITS).map(|i| format!("msg {}", i)).collect();
        expected.sort();
        assert_eq!(prompts, expected);
    }

    #[tokio::test]
    async fn test_end_session() {
        let state = app_state(Arc::new(ScriptedClient::default()));
        let created = read_session(&state, None).await;
        assert!(!end_session(&state, None));
        assert!(end_session(&state, Some(&created.session_id)));
        assert!(read_session(&state, Some(&created.session_id)).await.session_created);
    }
}
