//! # Infrastructure Common
//!
//! 这个 crate 提供了 VenueHub 平台基础设施层的公共错误类型和工具。
//!
//! ## 核心组件
//!
//! - [`ConfigError`] - 配置错误类型
//! - [`ValidationError`] - 验证错误类型
//! - [`FormSection`] - 动态表单配置节
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 损坏的持久化配置永远不会阻塞编辑界面
//! - 约定优于配置

pub mod errors;
pub mod section;

pub use errors::*;
pub use section::*;
