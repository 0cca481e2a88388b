//! 表单配置验证抽象接口

use formconfig_types::FormConfiguration;
use infrastructure_common::ValidationError;

/// 表单配置验证器 trait
///
/// 验证是同步的纯内存检查：合并结果永远可渲染，验证只负责把可疑之处
/// 整理成结构化报告，绝不中断编辑流程。
pub trait FormValidator: Send + Sync {
    /// 验证配置
    fn validate(&self, config: &FormConfiguration) -> ValidationReport;

    /// 获取验证器名称
    fn name(&self) -> &str;

    /// 获取验证器版本
    fn version(&self) -> &str {
        "1.0.0"
    }

    /// 获取验证器描述
    fn description(&self) -> Option<&str> {
        None
    }
}

/// 验证报告
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// 是否验证通过
    pub is_valid: bool,
    /// 验证错误列表
    pub errors: Vec<ValidationError>,
    /// 验证警告列表
    pub warnings: Vec<ValidationWarning>,
    /// 验证的叶子数量
    pub validated_count: usize,
    /// 验证时间
    pub validated_at: chrono::DateTime<chrono::Utc>,
}

impl ValidationReport {
    /// 创建成功的验证报告
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            validated_count: 0,
            validated_at: chrono::Utc::now(),
        }
    }

    /// 添加错误
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.is_valid = false;
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 合并验证报告
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.validated_count += other.validated_count;

        if !other.is_valid {
            self.is_valid = false;
        }
    }
}

/// 验证警告
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 警告字段
    pub field: String,
    /// 警告消息
    pub message: String,
    /// 建议修复方法
    pub suggestion: Option<String>,
}

impl ValidationWarning {
    /// 创建新的验证警告
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// 添加建议
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// 叶子验证规则
#[derive(Debug, Clone, Default)]
pub struct ValidationRule {
    /// 是否必须非空
    pub required: bool,
    /// 允许的候选值（列表叶子的成员必须是其子集）
    pub candidates: Option<Vec<String>>,
    /// 最小长度
    pub min_length: Option<usize>,
    /// 最大长度
    pub max_length: Option<usize>,
    /// 正则表达式模式
    pub pattern: Option<regex::Regex>,
}

impl ValidationRule {
    /// 创建新的验证规则
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置为必需
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 设置候选值列表
    pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
        self.candidates = Some(candidates.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// 设置长度范围
    pub fn with_length_range(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// 设置正则表达式模式
    pub fn with_pattern(mut self, pattern: regex::Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// 验证单个字符串值
    pub fn validate_str(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        if self.required && value.trim().is_empty() {
            return Err(ValidationError::required_field_missing(field));
        }

        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ValidationError::invalid_field_value(
                    field,
                    value,
                    format!("长度不能小于 {}", min_len),
                ));
            }
        }

        if let Some(max_len) = self.max_length {
            if value.len() > max_len {
                return Err(ValidationError::invalid_field_value(
                    field,
                    value,
                    format!("长度不能大于 {}", max_len),
                ));
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Err(ValidationError::format_error(field, pattern.as_str()));
            }
        }

        if let Some(candidates) = &self.candidates {
            if !candidates.iter().any(|c| c == value) {
                return Err(ValidationError::invalid_field_value(
                    field,
                    value,
                    format!("必须是以下值之一: {:?}", candidates),
                ));
            }
        }

        Ok(())
    }

    /// 验证列表叶子的全部成员
    pub fn validate_list(&self, field: &str, values: &[String]) -> Vec<ValidationError> {
        values
            .iter()
            .filter_map(|value| self.validate_str(field, value).err())
            .collect()
    }
}
