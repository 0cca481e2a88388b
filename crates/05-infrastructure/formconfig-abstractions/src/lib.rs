//! # FormConfig Abstractions
//!
//! 表单配置管理抽象层，定义配置源、变更事件与验证的核心接口和约定。
//!
//! ## 核心接口
//!
//! - [`ConfigSource`] - 配置源接口
//! - [`FormChangeListener`] - 变更事件监听接口
//! - [`TemplateWatcher`] - 模板文件监控接口
//! - [`FormValidator`] - 配置验证接口

pub mod events;
pub mod source;
pub mod validator;
pub mod watcher;

pub use events::*;
pub use source::*;
pub use validator::*;
pub use watcher::*;
