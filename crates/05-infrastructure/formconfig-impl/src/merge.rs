//! 部分配置与默认模式的深合并
//!
//! 合并以默认模式为底版，按底版的形状引导叠加：对象递归、数组整体替换、
//! `null` 与类型不匹配的值保留底版、底版之外的键丢弃。引导式叠加保证
//! 结果总能反序列化为类型化模型，损坏的持久化配置只会退化为默认值。

use formconfig_types::{default_schema_json, FormConfiguration};
use serde_json::Value;
use tracing::{debug, warn};

/// 将部分配置叠加到底版上
///
/// 叠加策略：
/// - 两侧都是对象时按键递归，只处理底版已有的键；
/// - 底版是数组且叠加值是字符串数组时整体替换（不做成员并集）；
/// - 叠加值为 `null` 或与底版类型不一致时保留底版值。
pub fn overlay(base: &mut Value, layer: &Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, base_value) in base_map.iter_mut() {
                if let Some(layer_value) = layer_map.get(key) {
                    overlay(base_value, layer_value);
                }
            }
        }
        (base @ Value::Array(_), Value::Array(items)) => {
            // 数组整体替换；混入非字符串成员的数组视为损坏，保留底版
            if items.iter().all(Value::is_string) {
                *base = Value::Array(items.clone());
            } else {
                warn!("数组叶子包含非字符串成员，保留默认值");
            }
        }
        (_, Value::Null) => {}
        (base, layer) => {
            if std::mem::discriminant(base) == std::mem::discriminant(layer) {
                *base = layer.clone();
            } else {
                debug!("叶子类型不匹配，保留默认值");
            }
        }
    }
}

/// 将部分配置与默认模式合并为完整配置
///
/// 接受任何输入（`None`、空对象、任意深度的部分对象、畸形值），
/// 永不失败，结果始终包含默认模式的每一个键。
pub fn merge_with_defaults(partial: Option<&Value>) -> FormConfiguration {
    let mut base = default_schema_json().clone();

    if let Some(layer) = partial {
        if layer.is_object() {
            overlay(&mut base, layer);
        } else if !layer.is_null() {
            warn!("外部配置不是对象，整体回落到默认模式");
        }
    }

    match serde_json::from_value(base) {
        Ok(config) => config,
        Err(e) => {
            // 引导式叠加保证形状完整，此分支只在模式定义自身出错时可达
            warn!("合并结果反序列化失败，回落到默认模式: {}", e);
            FormConfiguration::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_none_yields_defaults() {
        let config = merge_with_defaults(None);
        assert_eq!(config, FormConfiguration::default());

        assert!(config.venue.name);
        assert!(!config.venue.gender);
        assert_eq!(
            config.venue.price_type.types,
            vec!["per_day".to_string(), "food_price_per_plate".to_string()]
        );
        assert!(!config.booking.pickup_drop.enabled);
    }

    #[test]
    fn test_merge_empty_object_yields_defaults() {
        let config = merge_with_defaults(Some(&json!({})));
        assert_eq!(config, FormConfiguration::default());
    }

    #[test]
    fn test_array_replacement_not_union() {
        let partial = json!({ "venue": { "food": { "options": ["veg"] } } });
        let config = merge_with_defaults(Some(&partial));

        assert_eq!(config.venue.food.options, vec!["veg".to_string()]);
    }

    #[test]
    fn test_partial_venue_override_preserves_defaults() {
        let partial = json!({
            "venue": {
                "gender": true,
                "type": { "options": ["Farmhouse"] }
            }
        });
        let config = merge_with_defaults(Some(&partial));

        assert!(config.venue.gender);
        assert_eq!(config.venue.venue_type.options, vec!["Farmhouse".to_string()]);
        // 部分配置未触及的叶子取默认值
        assert!(config.venue.venue_type.allow_custom);
        assert!(config.venue.location.enabled);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let partial = json!({
            "venue": { "gender": true, "priceType": { "types": ["per_hour"] } },
            "booking": { "advancePayment": true }
        });

        let once = merge_with_defaults(Some(&partial));
        let once_json = serde_json::to_value(&once).unwrap();
        let twice = merge_with_defaults(Some(&once_json));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_type_mismatch_keeps_default() {
        let partial = json!({
            "venue": {
                "gender": "yes_please",
                "priceType": { "types": [1, 2, 3] }
            }
        });
        let config = merge_with_defaults(Some(&partial));

        assert!(!config.venue.gender);
        assert_eq!(
            config.venue.price_type.types,
            FormConfiguration::default().venue.price_type.types
        );
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let partial = json!({
            "venue": { "gender": true, "unknownField": true },
            "legacySection": { "anything": 1 }
        });
        let config = merge_with_defaults(Some(&partial));
        let json = serde_json::to_value(&config).unwrap();

        assert!(config.venue.gender);
        assert!(json["venue"].get("unknownField").is_none());
        assert!(json.get("legacySection").is_none());
    }

    #[test]
    fn test_non_object_input_yields_defaults() {
        assert_eq!(
            merge_with_defaults(Some(&json!("corrupted"))),
            FormConfiguration::default()
        );
        assert_eq!(
            merge_with_defaults(Some(&json!(null))),
            FormConfiguration::default()
        );
        assert_eq!(
            merge_with_defaults(Some(&json!([1, 2]))),
            FormConfiguration::default()
        );
    }

    #[test]
    fn test_defaults_constant_not_mutated() {
        let before = default_schema_json().clone();
        let partial = json!({ "venue": { "gender": true } });
        let _ = merge_with_defaults(Some(&partial));

        assert_eq!(default_schema_json(), &before);
    }
}
