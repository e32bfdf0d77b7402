//! 核心层：通用能力
//!
//! 包含时钟、配置管理和存储抽象

pub mod clock;
pub mod config;
pub mod store;
