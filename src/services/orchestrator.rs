//! # 回复编排服务
//!
//! 将一次用户输入同时发送给 adapter 和 base 两种模型配置，并把结果写回会话的两条轨道。
//!
//! ## 提交流程
//! 1. 空白输入直接忽略：不调用 API，不修改状态
//! 2. 为每条轨道构造请求：`[系统提示词] + 该轨道历史 + [本次用户输入]`
//! 3. 两路请求并发发起，全部返回后才进入提交阶段
//! 4. 两路都成功：每条轨道依次追加 user 轮次和 assistant 轮次
//! 5. 任一路失败：两条轨道都不修改（用户输入不入历史），返回标明失败轨道的错误
//!
//! 失败时整体回滚，保证两条轨道在任何一次提交之后长度相等。

use std::sync::Arc;

use crate::models::chat::{ChatTurn, ModelConfig, TrackName};
use crate::services::chat_client::{ChatClient, ChatClientError, CompletionRequest};
use crate::services::session::ChatSession;

/// 每次生成的输出 token 上限
pub const MAX_OUTPUT_TOKENS: u32 = 3000;

/// 一次成功提交的两路回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub adapter_reply: String,
    pub base_reply: String,
}

/// 单条轨道的生成失败
#[derive(Debug)]
pub struct TrackFailure {
    pub track: TrackName,
    pub error: ChatClientError,
}

/// 提交失败：至少一条轨道生成失败，会话状态未被修改
#[derive(Debug, thiserror::Error)]
#[error("生成回复失败: {}", describe_failures(.failures))]
pub struct SubmitError {
    pub failures: Vec<TrackFailure>,
}

impl SubmitError {
    /// 失败的轨道列表
    pub fn failed_tracks(&self) -> Vec<TrackName> {
        self.failures.iter().map(|f| f.track).collect()
    }
}

fn describe_failures(failures: &[TrackFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.track, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 回复编排器
///
/// 持有 chat client、两种模型配置和启动时构造好的系统提示词。
/// 自身不持有会话状态，会话由调用方传入。
pub struct ResponseOrchestrator {
    client: Arc<dyn ChatClient>,
    adapter_model: ModelConfig,
    base_model: ModelConfig,
    system_prompt: String,
    max_output_tokens: u32,
}

impl ResponseOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - `client` - chat-completion 客户端
    /// - `adapter_model` - adapter 轨道的模型配置
    /// - `system_prompt` - 由 `persona::build_system_prompt` 构造的系统提示词
    ///
    /// base 轨道固定使用服务商默认模型（空模型 ID）。
    pub fn new(
        client: Arc<dyn ChatClient>,
        adapter_model: ModelConfig,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            adapter_model,
            base_model: ModelConfig::provider_default(),
            system_prompt: system_prompt.into(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    /// 指定轨道使用的模型配置
    pub fn model_for(&self, track: TrackName) -> &ModelConfig {
        match track {
            TrackName::Adapter => &self.adapter_model,
            TrackName::Base => &self.base_model,
        }
    }

    /// 构造某条轨道的生成请求
    ///
    /// 消息顺序：系统提示词在前，随后是轨道历史（按追加顺序），最后是本次用户输入。
    pub fn build_request(
        &self,
        session: &ChatSession,
        track: TrackName,
        user_turn: &ChatTurn,
    ) -> CompletionRequest {
        let history = session.track(track).turns();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn::system(self.system_prompt.as_str()));
        messages.extend(history.iter().cloned());
        messages.push(user_turn.clone());

        CompletionRequest {
            model: self.model_for(track).model_identifier.clone(),
            messages,
            max_tokens: self.max_output_tokens,
        }
    }

    /// 提交一次用户输入
    ///
    /// # 返回值
    /// - `Ok(None)` - 输入为空或只含空白字符，未做任何事
    /// - `Ok(Some(outcome))` - 两路均成功，两条轨道各增加 2 个轮次
    ///
    /// # 错误
    /// 任一路生成失败时返回 `SubmitError`，此时两条轨道均未被修改
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        prompt: &str,
    ) -> Result<Option<SubmitOutcome>, SubmitError> {
        if prompt.trim().is_empty() {
            log::debug!("忽略空白输入");
            return Ok(None);
        }

        let user_turn = ChatTurn::user(prompt);
        let adapter_request = self.build_request(session, TrackName::Adapter, &user_turn);
        let base_request = self.build_request(session, TrackName::Base, &user_turn);

        log::info!(
            "提交输入: {} 字符, 历史 {} 轮, adapter 模型 {:?}",
            prompt.chars().count(),
            session.track(TrackName::Adapter).len(),
            self.adapter_model.model_identifier
        );

        let (adapter_result, base_result) = tokio::join!(
            self.client.complete(&adapter_request),
            self.client.complete(&base_request)
        );

        let (adapter_reply, base_reply) = match (adapter_result, base_result) {
            (Ok(adapter), Ok(base)) => (adapter, base),
            (adapter, base) => {
                let failures: Vec<TrackFailure> = [(TrackName::Adapter, adapter), (TrackName::Base, base)]
                    .into_iter()
                    .filter_map(|(track, result)| {
                        result.err().map(|error| TrackFailure { track, error })
                    })
                    .collect();
                let err = SubmitError { failures };
                log::warn!("{}，会话状态未修改", err);
                return Err(err);
            }
        };

        for (track, reply) in [
            (TrackName::Adapter, &adapter_reply),
            (TrackName::Base, &base_reply),
        ] {
            session.append_turn(track, user_turn.clone());
            session.append_turn(track, ChatTurn::assistant(reply.as_str()));
        }

        Ok(Some(SubmitOutcome {
            adapter_reply,
            base_reply,
        }))
    }
}
