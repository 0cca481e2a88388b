//! 模板管理器实现

use crate::merge::merge_with_defaults;
use crate::synchronizer::FormConfigSynchronizer;
use formconfig_abstractions::ConfigSource;
use formconfig_types::FormConfiguration;
use infrastructure_common::{ConfigError, FormSection};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 表单模板管理器
///
/// 主管理器，协调多个配置源并为编辑会话解析初始配置：按优先级逐个
/// 询问来源，取第一个给出载荷的结果；所有来源都空手而归时回落到
/// 默认模式。
pub struct FormTemplateManager {
    /// 配置源列表（按优先级排序）
    sources: Vec<Box<dyn ConfigSource>>,
    /// 缓存的解析结果
    resolved_cache: Arc<RwLock<Option<Value>>>,
    /// 是否启用缓存
    cache_enabled: bool,
}

impl std::fmt::Debug for FormTemplateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormTemplateManager")
            .field("sources_count", &self.sources.len())
            .field("cache_enabled", &self.cache_enabled)
            .finish()
    }
}

impl FormTemplateManager {
    /// 创建新的模板管理器
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            resolved_cache: Arc::new(RwLock::new(None)),
            cache_enabled: true,
        }
    }

    /// 设置是否启用缓存
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// 清除解析缓存
    pub async fn clear_cache(&self) {
        if self.cache_enabled {
            let mut cache = self.resolved_cache.write().await;
            *cache = None;
            debug!("解析缓存已清除");
        }
    }

    /// 获取配置源数量
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 注册配置源
    pub async fn register_source(&mut self, source: Box<dyn ConfigSource>) {
        info!("注册配置源: {}", source.name());

        self.sources.push(source);

        // 按优先级排序（优先级高的在前）
        self.sources.sort_by(|a, b| b.priority().cmp(&a.priority()));

        self.clear_cache().await;
    }

    /// 移除配置源
    pub async fn unregister_source(&mut self, source_name: &str) -> Result<(), ConfigError> {
        let initial_count = self.sources.len();
        self.sources.retain(|s| s.name() != source_name);

        if self.sources.len() < initial_count {
            info!("移除配置源: {}", source_name);
            self.clear_cache().await;
            Ok(())
        } else {
            warn!("配置源不存在: {}", source_name);
            Err(ConfigError::KeyNotFound {
                key: source_name.to_string(),
            })
        }
    }

    /// 解析初始部分配置
    ///
    /// 按优先级逐个询问来源；来源报错时记录并跳过，继续向更低优先级
    /// 回落。返回 `Ok(None)` 表示没有任何来源提供载荷。
    pub async fn resolve_initial(&self) -> Result<Option<Value>, ConfigError> {
        if self.cache_enabled {
            let cache = self.resolved_cache.read().await;
            if let Some(value) = cache.as_ref() {
                debug!("从缓存获取解析结果");
                return Ok(Some(value.clone()));
            }
        }

        for source in &self.sources {
            match source.fetch().await {
                Ok(Some(value)) => {
                    debug!("从配置源 {} 解析到初始配置", source.name());

                    if self.cache_enabled {
                        let mut cache = self.resolved_cache.write().await;
                        *cache = Some(value.clone());
                    }

                    return Ok(Some(value));
                }
                Ok(None) => {
                    debug!("配置源 {} 无可用配置，继续回落", source.name());
                    continue;
                }
                Err(e) => {
                    error!("配置源 {} 解析失败: {}", source.name(), e);
                    continue;
                }
            }
        }

        debug!("所有配置源均无可用配置，将回落到默认模式");
        Ok(None)
    }

    /// 解析完整配置（与默认模式合并后的结果）
    pub async fn resolve_configuration(&self) -> Result<FormConfiguration, ConfigError> {
        let initial = self.resolve_initial().await?;
        Ok(merge_with_defaults(initial.as_ref()))
    }

    /// 解析单个配置节
    pub async fn resolve_section(&self, section_name: &str) -> Result<FormSection, ConfigError> {
        let config = self.resolve_configuration().await?;
        let json = serde_json::to_value(&config)?;

        match json.get(section_name) {
            Some(Value::Object(entries)) => {
                let mut section = FormSection::new();
                for (key, value) in entries {
                    section.insert(key.clone(), value.clone());
                }
                Ok(section)
            }
            Some(_) => Err(ConfigError::type_conversion(format!(
                "配置节 {} 不是对象类型",
                section_name
            ))),
            None => Err(ConfigError::KeyNotFound {
                key: section_name.to_string(),
            }),
        }
    }

    /// 打开编辑会话
    pub async fn open_session(&self) -> Result<FormConfigSynchronizer, ConfigError> {
        let initial = self.resolve_initial().await?;
        let synchronizer = FormConfigSynchronizer::new(initial);

        info!("打开编辑会话: {}", synchronizer.session_id());
        Ok(synchronizer)
    }

    /// 重新加载所有配置源
    pub async fn reload_all(&mut self) -> Result<(), ConfigError> {
        info!("重新加载所有配置源");

        let mut errors = Vec::new();

        for source in &mut self.sources {
            if let Err(e) = source.reload().await {
                error!("配置源 {} 重载失败: {}", source.name(), e);
                errors.push(e);
            }
        }

        self.clear_cache().await;

        if errors.is_empty() {
            info!("所有配置源重载成功");
            Ok(())
        } else {
            Err(ConfigError::ReloadError {
                message: format!("{}个配置源重载失败", errors.len()),
            })
        }
    }
}

impl Default for FormTemplateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::JsonPayloadSource;
    use formconfig_types::VenueSection;

    #[tokio::test]
    async fn test_register_and_unregister_source() {
        let mut manager = FormTemplateManager::new();
        assert_eq!(manager.source_count(), 0);

        manager
            .register_source(Box::new(JsonPayloadSource::empty()))
            .await;
        assert_eq!(manager.source_count(), 1);

        manager.unregister_source("JsonPayloadSource").await.unwrap();
        assert_eq!(manager.source_count(), 0);

        let result = manager.unregister_source("JsonPayloadSource").await;
        assert!(matches!(result, Err(ConfigError::KeyNotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_priority_order() {
        let mut manager = FormTemplateManager::new();
        manager.set_cache_enabled(false);

        manager
            .register_source(Box::new(
                JsonPayloadSource::new(r#"{ "venue": { "gender": false } }"#).with_priority(10),
            ))
            .await;
        manager
            .register_source(Box::new(
                JsonPayloadSource::new(r#"{ "venue": { "gender": true } }"#).with_priority(50),
            ))
            .await;

        let value = manager.resolve_initial().await.unwrap().unwrap();
        assert_eq!(value["venue"]["gender"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_resolve_falls_through_corrupt_source() {
        let mut manager = FormTemplateManager::new();
        manager.set_cache_enabled(false);

        manager
            .register_source(Box::new(
                JsonPayloadSource::new("{ corrupt").with_priority(50),
            ))
            .await;
        manager
            .register_source(Box::new(
                JsonPayloadSource::new(r#"{ "venue": { "gender": true } }"#).with_priority(10),
            ))
            .await;

        let value = manager.resolve_initial().await.unwrap().unwrap();
        assert_eq!(value["venue"]["gender"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_resolve_without_sources_yields_defaults() {
        let manager = FormTemplateManager::new();

        assert!(manager.resolve_initial().await.unwrap().is_none());

        let config = manager.resolve_configuration().await.unwrap();
        assert_eq!(config, FormConfiguration::default());
    }

    #[tokio::test]
    async fn test_resolve_section_binds_to_typed_model() {
        let manager = FormTemplateManager::new();

        let section = manager.resolve_section("venue").await.unwrap();
        assert!(!section.is_empty());

        let venue: VenueSection = section.bind().unwrap();
        assert_eq!(venue, VenueSection::default());
    }

    #[tokio::test]
    async fn test_resolve_unknown_section() {
        let manager = FormTemplateManager::new();

        let result = manager.resolve_section("payments").await;
        assert!(matches!(result, Err(ConfigError::KeyNotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_session_uses_resolved_payload() {
        let mut manager = FormTemplateManager::new();
        manager
            .register_source(Box::new(JsonPayloadSource::new(
                r#"{ "venue": { "gender": true } }"#,
            )))
            .await;

        let session = manager.open_session().await.unwrap();
        assert!(session.configuration().venue.gender);
    }
}
