//! # 人设文本库
//!
//! 按名称返回固定的叙事人设文本，用于构造系统提示词。
//! 人设文本在编译期从 `vignettes/` 目录嵌入二进制。

/// 系统提示词的固定后缀
pub const ROLE_INSTRUCTION: &str = "Take on the role of the main character in the above narrative.";

/// 内置人设表：名称 → 叙事文本
const VIGNETTES: &[(&str, &str)] = &[("Jamela", include_str!("../../vignettes/jamela.md"))];

/// 按名称查找人设文本
///
/// 名称区分大小写。
pub fn get(name: &str) -> Option<&'static str> {
    VIGNETTES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| text.trim_end())
}

/// 所有内置人设名称
pub fn names() -> Vec<&'static str> {
    VIGNETTES.iter().map(|(key, _)| *key).collect()
}

/// 构造系统提示词：人设文本 + 空行 + 角色扮演指令
///
/// 与会话状态无关的纯函数，启动时调用一次。
///
/// # 错误
/// 人设名称不存在时返回错误（启动期致命错误）
pub fn build_system_prompt(persona_key: &str) -> Result<String, String> {
    let persona = get(persona_key).ok_or_else(|| {
        format!(
            "未知的人设名称: {}（可用: {}）",
            persona_key,
            names().join(", ")
        )
    })?;
    Ok(format!("{}\n\n{}", persona, ROLE_INSTRUCTION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_prompt_appends_instruction() {
        let prompt = build_system_prompt("Jamela").unwrap();
        let persona = get("Jamela").unwrap();
        assert!(prompt.starts_with(persona));
        assert!(prompt.ends_with("\n\nTake on the role of the main character in the above narrative."));
    }

    #[test]
    fn test_build_system_prompt_is_deterministic() {
        assert_eq!(
            build_system_prompt("Jamela").unwrap(),
            build_system_prompt("Jamela").unwrap()
        );
    }

    #[test]
    fn test_unknown_persona() {
        assert!(get("jamela").is_none());
        let err = build_system_prompt("Nobody").unwrap_err();
        assert!(err.contains("Jamela"));
    }
}
