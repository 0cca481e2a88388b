//! 表单配置验证实现

use formconfig_abstractions::{FormValidator, ValidationReport, ValidationRule, ValidationWarning};
use formconfig_types::{
    FormConfiguration, AMENITY_OPTIONS, DAYS_OF_WEEK, FOOD_OPTIONS, PRICE_TYPE_OPTIONS,
    TIME_SLOT_OPTIONS,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// 表单配置验证器
///
/// 检查合并结果中各候选列表叶子的成员是否越界、自定义选项是否空白。
/// 重复的自定义选项按既有行为保留，只以警告形式上报。
#[derive(Debug)]
pub struct FormConfigValidator {
    /// 自定义选项的文本规则
    custom_option_rule: ValidationRule,
}

impl FormConfigValidator {
    /// 创建新的表单配置验证器
    pub fn new() -> Self {
        Self {
            custom_option_rule: ValidationRule::new().required().with_length_range(1, 64),
        }
    }

    fn check_candidates(
        &self,
        report: &mut ValidationReport,
        field: &str,
        values: &[String],
        candidates: &[&str],
    ) {
        let rule = ValidationRule::new().with_candidates(candidates);
        for error in rule.validate_list(field, values) {
            report.add_error(error);
        }
        report.validated_count += 1;
    }
}

impl Default for FormConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FormValidator for FormConfigValidator {
    fn validate(&self, config: &FormConfiguration) -> ValidationReport {
        let mut report = ValidationReport::success();

        self.check_candidates(
            &mut report,
            "venue.priceType.types",
            &config.venue.price_type.types,
            &PRICE_TYPE_OPTIONS,
        );
        self.check_candidates(
            &mut report,
            "venue.openDays.days",
            &config.venue.open_days.days,
            &DAYS_OF_WEEK,
        );
        self.check_candidates(
            &mut report,
            "venue.food.options",
            &config.venue.food.options,
            &FOOD_OPTIONS,
        );
        self.check_candidates(
            &mut report,
            "venue.amenities.options",
            &config.venue.amenities.options,
            &AMENITY_OPTIONS,
        );
        self.check_candidates(
            &mut report,
            "booking.timeSlot.options",
            &config.booking.time_slot.options,
            &TIME_SLOT_OPTIONS,
        );

        // 自定义场地类型：文本规则 + 重复警告
        let mut seen = HashSet::new();
        for option in &config.venue.venue_type.options {
            if let Err(error) = self
                .custom_option_rule
                .validate_str("venue.type.options", option)
            {
                report.add_error(error);
            }

            if !seen.insert(option.as_str()) {
                report.add_warning(
                    ValidationWarning::new(
                        "venue.type.options",
                        format!("自定义选项重复: {}", option),
                    )
                    .with_suggestion("确认产品侧是否需要去重"),
                );
            }
        }
        report.validated_count += 1;

        if report.is_valid {
            debug!("表单配置验证通过，检查了 {} 个叶子", report.validated_count);
        } else {
            warn!(
                "表单配置验证失败，错误数: {}, 警告数: {}",
                report.errors.len(),
                report.warnings.len()
            );
        }

        report
    }

    fn name(&self) -> &str {
        "FormConfigValidator"
    }

    fn description(&self) -> Option<&str> {
        Some("候选列表子集与自定义选项文本检查")
    }
}

/// 表单验证管理器
///
/// 聚合多个验证器，对同一份配置依次执行并合并报告。
pub struct FormValidationManager {
    /// 已注册的验证器
    validators: Vec<Box<dyn FormValidator>>,
}

impl std::fmt::Debug for FormValidationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidationManager")
            .field("validators_count", &self.validators.len())
            .finish()
    }
}

impl FormValidationManager {
    /// 创建新的验证管理器
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// 注册验证器
    pub fn register_validator(&mut self, validator: Box<dyn FormValidator>) {
        info!("注册表单验证器: {}", validator.name());
        self.validators.push(validator);
    }

    /// 获取已注册的验证器数量
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// 对配置执行所有验证器
    pub fn validate_all(&self, config: &FormConfiguration) -> ValidationReport {
        let mut overall = ValidationReport::success();

        for validator in &self.validators {
            debug!("执行验证器: {}", validator.name());
            overall.merge(validator.validate(config));
        }

        overall
    }
}

impl Default for FormValidationManager {
    fn default() -> Self {
        Self::new()
    }
}
