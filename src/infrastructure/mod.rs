//! 基础设施层：外部系统交互
//!
//! 提供日志、台账存储后端和 HTTP 服务

pub mod logger;
pub mod store;
pub mod web;
