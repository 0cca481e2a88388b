//! 表单配置模式定义
//!
//! `Default` 实现即规范默认模式：合并任何部分配置时都以它为底。
//! 序列化字段名与 REST 后端持久化的 `formConfig` JSON 保持 camelCase 一致。

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 价格类型候选列表
pub const PRICE_TYPE_OPTIONS: [&str; 4] =
    ["per_day", "per_hour", "per_person", "food_price_per_plate"];

/// 星期候选列表
pub const DAYS_OF_WEEK: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// 餐饮类型候选列表
pub const FOOD_OPTIONS: [&str; 3] = ["veg", "non_veg", "both"];

/// 时段候选列表
pub const TIME_SLOT_OPTIONS: [&str; 3] = ["morning", "evening", "full_day"];

/// 设施候选列表
pub const AMENITY_OPTIONS: [&str; 6] = ["parking", "wifi", "ac", "dj", "catering", "decoration"];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// 完整的表单配置树
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormConfiguration {
    /// 场地表单节
    pub venue: VenueSection,
    /// 预订表单节
    pub booking: BookingSection,
}

impl Default for FormConfiguration {
    fn default() -> Self {
        Self {
            venue: VenueSection::default(),
            booking: BookingSection::default(),
        }
    }
}

/// 场地表单节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueSection {
    /// 场地名称字段开关
    pub name: bool,
    /// 场地描述字段开关
    pub description: bool,
    /// 性别限制字段开关
    pub gender: bool,
    /// 容纳人数字段开关
    pub capacity: bool,
    /// 场地照片字段开关
    pub photos: bool,
    /// 位置字段组
    pub location: LocationGroup,
    /// 价格类型字段组
    pub price_type: PriceTypeGroup,
    /// 餐饮字段组
    pub food: FoodGroup,
    /// 场地类型字段组（选项列表允许自定义扩展）
    #[serde(rename = "type")]
    pub venue_type: VenueTypeGroup,
    /// 营业日字段组
    pub open_days: OpenDaysGroup,
    /// 设施字段组
    pub amenities: AmenitiesGroup,
}

impl Default for VenueSection {
    fn default() -> Self {
        Self {
            name: true,
            description: true,
            gender: false,
            capacity: true,
            photos: true,
            location: LocationGroup::default(),
            price_type: PriceTypeGroup::default(),
            food: FoodGroup::default(),
            venue_type: VenueTypeGroup::default(),
            open_days: OpenDaysGroup::default(),
            amenities: AmenitiesGroup::default(),
        }
    }
}

/// 位置字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationGroup {
    /// 组开关（只影响子树在界面上是否可达，不影响子字段值）
    pub enabled: bool,
    /// 城市字段开关
    pub city: bool,
    /// 省/州字段开关
    pub state: bool,
    /// 详细地址字段开关
    pub address: bool,
}

impl Default for LocationGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            city: true,
            state: true,
            address: true,
        }
    }
}

/// 价格类型字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceTypeGroup {
    /// 组开关
    pub enabled: bool,
    /// 已启用的价格类型（[`PRICE_TYPE_OPTIONS`] 的子集）
    pub types: Vec<String>,
}

impl Default for PriceTypeGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            types: to_strings(&["per_day", "food_price_per_plate"]),
        }
    }
}

/// 餐饮字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodGroup {
    /// 组开关
    pub enabled: bool,
    /// 已启用的餐饮类型（[`FOOD_OPTIONS`] 的子集）
    pub options: Vec<String>,
}

impl Default for FoodGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            options: to_strings(&FOOD_OPTIONS),
        }
    }
}

/// 场地类型字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueTypeGroup {
    /// 组开关
    pub enabled: bool,
    /// 是否允许自定义选项
    pub allow_custom: bool,
    /// 选项列表（自由文本，允许重复，见 DESIGN.md 的决定记录）
    pub options: Vec<String>,
}

impl Default for VenueTypeGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_custom: true,
            options: Vec::new(),
        }
    }
}

/// 营业日字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenDaysGroup {
    /// 组开关
    pub enabled: bool,
    /// 营业日（[`DAYS_OF_WEEK`] 的子集）
    pub days: Vec<String>,
}

impl Default for OpenDaysGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            days: to_strings(&DAYS_OF_WEEK),
        }
    }
}

/// 设施字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmenitiesGroup {
    /// 组开关
    pub enabled: bool,
    /// 已启用的设施（[`AMENITY_OPTIONS`] 的子集）
    pub options: Vec<String>,
}

impl Default for AmenitiesGroup {
    fn default() -> Self {
        Self {
            enabled: false,
            options: Vec::new(),
        }
    }
}

/// 预订表单节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingSection {
    /// 活动日期字段开关
    pub event_date: bool,
    /// 宾客人数字段开关
    pub guest_count: bool,
    /// 时段字段组
    pub time_slot: TimeSlotGroup,
    /// 接送字段组
    pub pickup_drop: PickupDropGroup,
    /// 预付款字段开关
    pub advance_payment: bool,
    /// 特殊要求字段开关
    pub special_requests: bool,
}

impl Default for BookingSection {
    fn default() -> Self {
        Self {
            event_date: true,
            guest_count: true,
            time_slot: TimeSlotGroup::default(),
            pickup_drop: PickupDropGroup::default(),
            advance_payment: false,
            special_requests: true,
        }
    }
}

/// 时段字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeSlotGroup {
    /// 组开关
    pub enabled: bool,
    /// 已启用的时段（[`TIME_SLOT_OPTIONS`] 的子集）
    pub options: Vec<String>,
}

impl Default for TimeSlotGroup {
    fn default() -> Self {
        Self {
            enabled: true,
            options: to_strings(&TIME_SLOT_OPTIONS),
        }
    }
}

/// 接送字段组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickupDropGroup {
    /// 组开关
    pub enabled: bool,
    /// 接客地点字段开关
    pub pickup_location: bool,
    /// 送客地点字段开关
    pub drop_location: bool,
}

impl Default for PickupDropGroup {
    fn default() -> Self {
        Self {
            enabled: false,
            pickup_location: true,
            drop_location: true,
        }
    }
}

/// 规范默认模式的 JSON 形式
///
/// 进程级不可变常量，作为合并底版使用时必须先 clone。
static DEFAULT_SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
    serde_json::to_value(FormConfiguration::default())
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
});

/// 获取规范默认模式的 JSON 形式
pub fn default_schema_json() -> &'static Value {
    &DEFAULT_SCHEMA_JSON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_values() {
        let config = FormConfiguration::default();

        assert!(config.venue.name);
        assert!(!config.venue.gender);
        assert_eq!(
            config.venue.price_type.types,
            vec!["per_day".to_string(), "food_price_per_plate".to_string()]
        );
        assert!(config.venue.venue_type.allow_custom);
        assert!(config.venue.venue_type.options.is_empty());
        assert!(config.venue.location.enabled);
        assert!(!config.booking.pickup_drop.enabled);
        assert_eq!(config.venue.open_days.days.len(), 7);
    }

    #[test]
    fn test_camel_case_wire_names() {
        let json = serde_json::to_value(FormConfiguration::default()).unwrap();

        assert!(json["venue"]["priceType"]["types"].is_array());
        assert!(json["venue"]["type"]["allowCustom"].as_bool().unwrap());
        assert!(json["venue"]["openDays"]["days"].is_array());
        assert!(!json["booking"]["pickupDrop"]["enabled"].as_bool().unwrap());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let partial = serde_json::json!({
            "venue": { "gender": true }
        });

        let config: FormConfiguration = serde_json::from_value(partial).unwrap();
        assert!(config.venue.gender);
        // 未提供的字段取默认值
        assert!(config.venue.name);
        assert_eq!(config.venue.food.options.len(), 3);
        assert!(config.booking.event_date);
    }

    #[test]
    fn test_default_schema_json_is_stable() {
        let first = default_schema_json().clone();
        let second = default_schema_json().clone();
        assert_eq!(first, second);
    }
}
