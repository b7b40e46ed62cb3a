//! # 凭据加载服务
//!
//! 读取 `.secrets.toml` 并校验必填项。
//! 任何错误都属于启动期致命错误，由 `lib::run` 输出诊断信息后以状态码 1 退出。

use std::path::Path;

use crate::models::settings::ApiSettings;
use crate::utils::path;

/// 定位并加载凭据文件
///
/// # 错误
/// 文件不存在、读取失败、TOML 解析失败或必填项为空时返回错误
pub async fn load_settings() -> Result<ApiSettings, String> {
    let secrets_path = path::locate_secrets_file()?;
    load_settings_from(&secrets_path).await
}

/// 从指定路径加载凭据文件
pub async fn load_settings_from(secrets_path: &Path) -> Result<ApiSettings, String> {
    let content = tokio::fs::read_to_string(secrets_path)
        .await
        .map_err(|e| format!("读取凭据文件失败 ({}): {}", secrets_path.display(), e))?;

    let settings = parse_settings(&content)?;
    log::info!("已加载凭据文件: {}", secrets_path.display());
    Ok(settings)
}

/// 解析并校验凭据文件内容
///
/// 必填字段缺失时 TOML 反序列化即失败；字段存在但为空白字符串时同样视为缺失。
pub fn parse_settings(content: &str) -> Result<ApiSettings, String> {
    let settings: ApiSettings =
        toml::from_str(content).map_err(|e| format!("解析凭据文件失败: {}", e))?;

    let required = [
        ("API_KEY", &settings.api_key),
        ("API_URL", &settings.api_url),
        ("API_MODEL", &settings.api_model),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(format!("凭据文件缺少必填项: {}", missing.join(", ")));
    }

    Ok(settings)
}
