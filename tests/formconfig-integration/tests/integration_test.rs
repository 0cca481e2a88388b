//! 表单配置引擎跨 crate 集成测试
//!
//! 覆盖完整生命周期：来源解析 -> 合并 -> 编辑会话 -> 定格上报 ->
//! 序列化持久化 -> 下一个会话重新打开。

use formconfig_abstractions::{ChangeOrigin, ConfigSource};
use formconfig_impl::{
    merge_with_defaults, CountingFormChangeListener, FormConfigSynchronizer, FormConfigValidator,
    FormTemplateManager, FormValidationManager, JsonPayloadSource, JsonTemplateSource,
};
use formconfig_types::{default_schema_json, FieldPath, FormConfiguration, LeafValue};
use infrastructure_common::ConfigError;
use mockall::mock;
use serde_json::{json, Value};
use std::sync::Arc;

mock! {
    PersistedSource {}

    #[async_trait::async_trait]
    impl ConfigSource for PersistedSource {
        async fn fetch(&self) -> Result<Option<Value>, ConfigError>;
        async fn reload(&mut self) -> Result<(), ConfigError>;
        fn name(&self) -> &str;
        fn priority(&self) -> i32;
        fn supports_watch(&self) -> bool;
    }
}

fn path(dotted: &str) -> FieldPath {
    dotted.parse().expect("测试路径必须合法")
}

/// 递归断言 expected 的每个键都出现在 actual 中
fn assert_schema_complete(expected: &Value, actual: &Value, prefix: &str) {
    if let (Value::Object(expected_map), Value::Object(actual_map)) = (expected, actual) {
        for (key, expected_child) in expected_map {
            let dotted = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            let actual_child = actual_map
                .get(key)
                .unwrap_or_else(|| panic!("合并结果缺少键: {}", dotted));
            assert_schema_complete(expected_child, actual_child, &dotted);
        }
    }
}

/// 任意输入下合并结果都包含默认模式的全部键
#[test]
fn test_merge_schema_completeness() {
    let inputs = [
        None,
        Some(json!({})),
        Some(json!({ "venue": { "location": { "city": false } } })),
        Some(json!({ "booking": "corrupted" })),
        Some(json!(42)),
    ];

    for input in inputs {
        let merged = merge_with_defaults(input.as_ref());
        let merged_json = serde_json::to_value(&merged).unwrap();
        assert_schema_complete(default_schema_json(), &merged_json, "");
    }
}

/// 完整生命周期：模板文件 -> 会话编辑 -> 定格 -> 持久化 -> 重新打开
#[tokio::test]
async fn test_full_session_lifecycle() {
    // 运维播种的类目模板
    let template_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        template_file.path(),
        r#"{ "venue": { "gender": true, "type": { "options": ["Farmhouse"] } } }"#,
    )
    .unwrap();

    let mut manager = FormTemplateManager::new();
    manager
        .register_source(Box::new(
            JsonTemplateSource::new(template_file.path()).unwrap(),
        ))
        .await;

    let mut session = manager.open_session().await.unwrap();
    let counter = Arc::new(CountingFormChangeListener::new());
    session.register_listener(counter.clone());

    // 模板值生效，默认值补全
    assert!(session.configuration().venue.gender);
    assert_eq!(
        session.configuration().venue.venue_type.options,
        vec!["Farmhouse".to_string()]
    );
    assert!(session.configuration().venue.venue_type.allow_custom);

    // 一轮编辑
    session
        .set_field(path("booking.advancePayment"), LeafValue::Bool(true))
        .unwrap();
    session.add_custom_option("Banquet Hall");
    assert!(session.settle());
    assert_eq!(counter.settled_count(), 1);

    // 所属方把定格结果序列化持久化（REST 的 formConfig 字段）
    let persisted = serde_json::to_string(session.configuration()).unwrap();

    // 下一个会话以持久化载荷重新打开，状态完整还原
    let mut next_manager = FormTemplateManager::new();
    next_manager
        .register_source(Box::new(JsonPayloadSource::new(persisted)))
        .await;
    let reopened = next_manager.open_session().await.unwrap();

    assert_eq!(reopened.configuration(), session.configuration());
    assert_eq!(
        reopened.configuration().venue.venue_type.options,
        vec!["Farmhouse".to_string(), "Banquet Hall".to_string()]
    );
}

/// 管理器按优先级解析，报错的来源被跳过
#[tokio::test]
async fn test_manager_falls_through_failing_source() {
    let mut failing = MockPersistedSource::new();
    failing
        .expect_name()
        .return_const("MockPersistedSource".to_string());
    failing.expect_priority().return_const(500i32);
    failing
        .expect_fetch()
        .returning(|| Err(ConfigError::ReloadError {
            message: "后端不可达".to_string(),
        }));

    let mut manager = FormTemplateManager::new();
    manager.set_cache_enabled(false);
    manager.register_source(Box::new(failing)).await;
    manager
        .register_source(Box::new(
            JsonPayloadSource::new(r#"{ "venue": { "gender": true } }"#).with_priority(10),
        ))
        .await;

    let config = manager.resolve_configuration().await.unwrap();
    assert!(config.venue.gender);
}

/// 空手而归的高优先级来源向低优先级回落
#[tokio::test]
async fn test_manager_priority_fallthrough_on_none() {
    let mut empty = MockPersistedSource::new();
    empty
        .expect_name()
        .return_const("MockPersistedSource".to_string());
    empty.expect_priority().return_const(500i32);
    empty.expect_fetch().returning(|| Ok(None));

    let mut manager = FormTemplateManager::new();
    manager.set_cache_enabled(false);
    manager.register_source(Box::new(empty)).await;
    manager
        .register_source(Box::new(
            JsonPayloadSource::new(r#"{ "booking": { "advancePayment": true } }"#)
                .with_priority(10),
        ))
        .await;

    let config = manager.resolve_configuration().await.unwrap();
    assert!(config.booking.advance_payment);
}

/// 双向深度相等闸门：回声不上报，外部变化采纳且抑制一次上报
#[tokio::test]
async fn test_echo_suppression_across_session() {
    let initial = json!({ "venue": { "gender": true } });
    let mut session = FormConfigSynchronizer::new(Some(initial.clone()));
    let counter = Arc::new(CountingFormChangeListener::new());
    session.register_listener(counter.clone());

    // 本地编辑并定格
    session
        .set_field(path("venue.capacity"), LeafValue::Bool(false))
        .unwrap();
    assert!(session.settle());
    assert_eq!(counter.settled_count(), 1);

    // 所属方把定格结果原样回写：结构相同 -> 不是变更
    let echoed = serde_json::to_value(session.configuration()).unwrap();
    assert!(session.apply_external(Some(&echoed)));
    // 采纳即抑制，定格不再上报
    assert!(!session.settle());
    assert_eq!(counter.settled_count(), 1);

    // 完全相同的载荷第二次下发：闸门直接拦截
    assert!(!session.apply_external(Some(&echoed)));
    assert_eq!(counter.settled_count(), 1);
}

/// 事件分发与定格上报各走各的通道，来源标签正确
#[tokio::test]
async fn test_event_origins_through_sink() {
    let (sender, mut receiver) = tokio::sync::mpsc::channel(16);

    let mut session = FormConfigSynchronizer::new(None);
    session.attach_event_sink(sender);

    session
        .set_field(path("venue.gender"), LeafValue::Bool(true))
        .unwrap();
    session
        .toggle_list_member(path("venue.openDays.days"), "sunday")
        .unwrap();
    session.apply_external(Some(&json!({ "venue": { "photos": false } })));

    let origins: Vec<ChangeOrigin> = [
        receiver.recv().await.unwrap(),
        receiver.recv().await.unwrap(),
        receiver.recv().await.unwrap(),
    ]
    .iter()
    .map(|e| e.origin)
    .collect();

    assert_eq!(
        origins,
        vec![
            ChangeOrigin::Local,
            ChangeOrigin::Local,
            ChangeOrigin::External
        ]
    );
}

/// 损坏载荷全程不阻塞：解析宽容、合并补全、验证上报问题
#[tokio::test]
async fn test_corrupt_payload_never_blocks_editing() {
    let mut manager = FormTemplateManager::new();
    manager
        .register_source(Box::new(JsonPayloadSource::new("{ definitely broken")))
        .await;

    // 损坏载荷 -> 默认模式，会话照常打开
    let session = manager.open_session().await.unwrap();
    assert_eq!(session.configuration(), &FormConfiguration::default());

    // 越界成员只在验证报告中出现，不影响合并
    let sneaky = merge_with_defaults(Some(&json!({
        "venue": { "openDays": { "days": ["funday"] } }
    })));
    let mut validation = FormValidationManager::new();
    validation.register_validator(Box::new(FormConfigValidator::new()));
    let report = validation.validate_all(&sneaky);

    assert!(!report.is_valid);
    assert_eq!(sneaky.venue.open_days.days, vec!["funday".to_string()]);
}

/// 合并幂等性：二次合并不再改变任何内容
#[test]
fn test_merge_idempotence_property() {
    let samples = [
        json!({ "venue": { "food": { "options": ["veg"] } } }),
        json!({ "booking": { "pickupDrop": { "enabled": true } } }),
        json!({ "venue": { "type": { "options": ["A", "A"] } } }),
    ];

    for sample in samples {
        let once = merge_with_defaults(Some(&sample));
        let twice = merge_with_defaults(Some(&serde_json::to_value(&once).unwrap()));
        assert_eq!(once, twice);
    }
}
