//! # 路径工具函数
//!
//! 提供凭据文件的定位逻辑：
//! - 环境变量 `COMPARE_SECRETS_PATH` 显式指定的路径
//! - 当前工作目录下的 `.secrets.toml`
//! - 用户配置目录下的 `model-compare/secrets.toml`

use std::path::{Path, PathBuf};

/// 显式指定凭据文件路径的环境变量
pub const SECRETS_PATH_ENV: &str = "COMPARE_SECRETS_PATH";

/// 当前目录下的默认凭据文件名
pub const LOCAL_SECRETS_FILE: &str = ".secrets.toml";

/// 获取用户配置目录下的凭据文件路径
///
/// 使用 `dirs` crate 获取跨平台的配置目录。
///
/// # 示例
/// - Linux: `/home/username/.config/model-compare/secrets.toml`
/// - macOS: `/Users/username/Library/Application Support/model-compare/secrets.toml`
///
/// # 错误
/// 无法确定配置目录时返回错误信息
pub fn get_user_secrets_path() -> Result<PathBuf, String> {
    let config = dirs::config_dir().ok_or_else(|| "无法获取用户配置目录".to_string())?;
    Ok(config.join("model-compare").join("secrets.toml"))
}

/// 列出未显式指定路径时的候选凭据文件，按优先级排列
///
/// # 参数
/// - `cwd` - 当前工作目录
pub fn secrets_candidates(cwd: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(LOCAL_SECRETS_FILE)];
    if let Ok(user) = get_user_secrets_path() {
        candidates.push(user);
    }
    candidates
}

/// 定位凭据文件
///
/// 从环境变量和当前工作目录读取输入，实际查找逻辑见 `resolve_secrets_file`。
pub fn locate_secrets_file() -> Result<PathBuf, String> {
    let explicit = std::env::var(SECRETS_PATH_ENV).ok();
    let cwd = std::env::current_dir().map_err(|e| format!("无法获取当前工作目录: {}", e))?;
    resolve_secrets_file(explicit.as_deref(), &cwd)
}

/// 按优先级查找凭据文件
///
/// 显式指定的路径不存在时直接报错，不再回退，以免误读其他位置的凭据。
///
/// # 参数
/// - `explicit` - `COMPARE_SECRETS_PATH` 的值（空白视为未设置）
/// - `cwd` - 当前工作目录
///
/// # 错误
/// 显式路径不存在，或所有候选路径都不存在时返回错误信息
pub fn resolve_secrets_file(explicit: Option<&str>, cwd: &Path) -> Result<PathBuf, String> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(format!(
                "{} 指定的凭据文件不存在: {}",
                SECRETS_PATH_ENV,
                path.display()
            ))
        };
    }

    let candidates = secrets_candidates(cwd);
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| {
            let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            format!("未找到凭据文件，已尝试: {}", tried.join(", "))
        })
}
