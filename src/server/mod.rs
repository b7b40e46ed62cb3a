//! # 页面服务
//!
//! 基于 hyper 1.x 的 HTTP/1.1 服务器：每个 TCP 连接一个 tokio 任务，
//! 请求交给 `router::handle` 处理。

pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::state::AppState;

/// accept 失败后的重试间隔
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// 绑定监听地址
///
/// # 错误
/// 地址格式无效或端口被占用时返回错误
pub async fn bind(addr: &str) -> Result<TcpListener, String> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| format!("监听地址无效 ({}): {}", addr, e))?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| format!("绑定监听地址失败 ({}): {}", addr, e))
}

/// 在已绑定的监听器上持续接受连接
///
/// 单个连接的错误只记录日志，不影响其他连接；accept 失败（如文件描述符耗尽）时短暂等待后重试。
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    if let Ok(addr) = listener.local_addr() {
        log::info!("页面服务已启动: http://{}", addr);
    }

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("接受连接失败: {}", e);
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move { router::handle(req, &state).await }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                log::warn!("连接处理失败 ({}): {}", peer, e);
            }
        });
    }
}
