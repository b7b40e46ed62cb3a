//! # 工具函数模块
//!
//! - `path` - 凭据文件定位

pub mod path;
