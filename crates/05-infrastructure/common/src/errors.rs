//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("模板文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("模板文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("未知的字段路径: {path}")]
    UnknownPath { path: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("配置源重载失败: {message}")]
    ReloadError { message: String },

    #[error("模板文件监控失败: {message}")]
    WatchError { message: String },

    #[error("变更事件分发失败: {message}")]
    DispatchError { message: String },
}

impl ConfigError {
    /// 创建未知路径错误
    pub fn unknown_path(path: impl Into<String>) -> Self {
        Self::UnknownPath { path: path.into() }
    }

    /// 创建类型转换错误
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversionError {
            message: message.into(),
        }
    }
}

/// 验证错误类型
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("验证失败: {message}")]
    ValidationFailed { message: String },

    #[error("必需字段缺失: {field_name}")]
    RequiredFieldMissing { field_name: String },

    #[error("字段值无效: {field_name}, 值: {value}, 原因: {reason}")]
    InvalidFieldValue {
        field_name: String,
        value: String,
        reason: String,
    },

    #[error("选项不在候选列表中: {field_name}, 值: {value}, 候选: {candidates}")]
    OptionNotInCandidates {
        field_name: String,
        value: String,
        candidates: String,
    },

    #[error("格式错误: {field_name}, 期望格式: {expected_format}")]
    FormatError {
        field_name: String,
        expected_format: String,
    },
}

impl ValidationError {
    /// 创建新的验证错误
    pub fn new(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// 创建必需字段缺失错误
    pub fn required_field_missing(field_name: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field_name: field_name.into(),
        }
    }

    /// 创建字段值无效错误
    pub fn invalid_field_value(
        field_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field_name: field_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 创建候选列表外选项错误
    pub fn option_not_in_candidates(
        field_name: impl Into<String>,
        value: impl Into<String>,
        candidates: &[&str],
    ) -> Self {
        Self::OptionNotInCandidates {
            field_name: field_name.into(),
            value: value.into(),
            candidates: candidates.join(", "),
        }
    }

    /// 创建格式错误
    pub fn format_error(field_name: impl Into<String>, expected_format: impl Into<String>) -> Self {
        Self::FormatError {
            field_name: field_name.into(),
            expected_format: expected_format.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("验证错误: {source}")]
    ValidationError {
        #[from]
        source: ValidationError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
