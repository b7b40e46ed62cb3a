//! # Model Compare - 程序入口点
//!
//! 初始化日志后调用 `app_lib::run()`，核心逻辑位于 `lib.rs` 中。
//! 日志级别默认为 info，可通过 `RUST_LOG` 环境变量调整。

/// 应用程序主入口函数
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    app_lib::run();
}
