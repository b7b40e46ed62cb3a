//! # Model Compare - 应用核心初始化模块
//!
//! 本模块负责应用的完整初始化流程，包括：
//! - 加载 `.secrets.toml` 凭据（缺失即以状态码 1 退出）
//! - 构造系统提示词和 chat-completion 客户端
//! - 初始化应用全局状态（会话注册表 + 回复编排器）
//! - 启动 HTTP 页面服务
//!
//! ## 模块结构
//! - `commands/` - 页面 command 处理函数（JSON 接口层）
//! - `models/` - 数据模型
//! - `server/` - HTTP 服务与路由
//! - `services/` - 核心业务逻辑（会话、编排、chat client、人设、配置）
//! - `utils/` - 通用工具函数

mod commands;
pub mod models;
mod server;
pub mod services;
mod state;
mod utils;

use std::sync::Arc;

use models::chat::ModelConfig;
use models::settings::ApiSettings;
use services::chat_client::OpenAiChatClient;
use services::orchestrator::ResponseOrchestrator;
use services::{persona, settings};
use state::AppState;

/// 应用启动函数
///
/// 创建 tokio 多线程运行时并在其中运行页面服务，直到进程被终止。
/// 启动期的任何配置错误都会输出诊断信息并以状态码 1 退出进程。
pub fn run() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => fail_startup(format!("创建异步运行时失败: {}", e)),
    };

    if let Err(e) = runtime.block_on(start()) {
        fail_startup(e);
    }
}

async fn start() -> Result<(), String> {
    let settings = settings::load_settings().await?;
    let state = Arc::new(build_state(&settings)?);
    let listener = server::bind(&settings.bind_addr).await?;
    server::serve(listener, state).await;
    Ok(())
}

/// 根据配置构造应用全局状态
fn build_state(settings: &ApiSettings) -> Result<AppState, String> {
    let system_prompt = persona::build_system_prompt(&settings.persona)?;
    let client = OpenAiChatClient::new(&settings.api_url, &settings.api_key)?;
    log::info!(
        "chat-completion 端点: {}, adapter 模型: {}, 人设: {}",
        client.endpoint(),
        settings.api_model,
        settings.persona
    );

    let orchestrator = ResponseOrchestrator::new(
        Arc::new(client),
        ModelConfig::named(settings.api_model.as_str()),
        system_prompt,
    );
    Ok(AppState::new(orchestrator))
}

fn fail_startup(message: String) -> ! {
    log::error!("启动失败: {}", message);
    eprintln!("Error loading configuration: {}", message);
    std::process::exit(1);
}
