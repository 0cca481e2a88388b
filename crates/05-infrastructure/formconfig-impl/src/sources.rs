//! 配置源实现

use async_trait::async_trait;
use formconfig_abstractions::{ConfigSource, FileTemplateSource};
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// 持久化载荷配置源
///
/// 包装 REST 后端持久化的 `formConfig` JSON 字符串。载荷可能损坏或
/// 过期，解析失败时宽容地返回 `None`（回落到默认模式），绝不报错。
#[derive(Debug)]
pub struct JsonPayloadSource {
    payload: Option<String>,
    priority: i32,
}

impl JsonPayloadSource {
    /// 创建新的载荷配置源
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
            priority: 200, // 所属方持久化的载荷最高优先级
        }
    }

    /// 创建空载荷配置源
    pub fn empty() -> Self {
        Self {
            payload: None,
            priority: 200,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 替换载荷内容
    pub fn set_payload(&mut self, payload: Option<String>) {
        self.payload = payload;
    }
}

#[async_trait]
impl ConfigSource for JsonPayloadSource {
    async fn fetch(&self) -> Result<Option<Value>, ConfigError> {
        let Some(raw) = &self.payload else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("持久化载荷解析失败，回落到更低优先级来源: {}", e);
                Ok(None)
            }
        }
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        // 载荷由所属方注入，重载无事可做
        Ok(())
    }

    fn name(&self) -> &str {
        "JsonPayloadSource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// TOML 模板配置源
///
/// 运维环境播种的类目模板文件，形状与持久化 JSON 的部分配置树一致。
#[derive(Debug)]
pub struct TomlTemplateSource {
    file_path: PathBuf,
    template: Option<toml::Value>,
    last_modified: Option<SystemTime>,
    priority: i32,
}

impl TomlTemplateSource {
    /// 创建新的 TOML 模板配置源
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file_path = path.as_ref().to_path_buf();
        let mut source = Self {
            file_path,
            template: None,
            last_modified: None,
            priority: 100, // TOML 模板默认高于 JSON 模板
        };

        source.load_template()?;
        Ok(source)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 加载模板文件
    fn load_template(&mut self) -> Result<(), ConfigError> {
        debug!("加载 TOML 模板文件: {}", self.file_path.display());

        let content = std::fs::read_to_string(&self.file_path)
            .map_err(|e| ConfigError::FileReadError { source: e })?;

        self.template = Some(toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?);

        self.last_modified = Some(
            std::fs::metadata(&self.file_path)
                .and_then(|m| m.modified())
                .map_err(|e| ConfigError::FileReadError { source: e })?,
        );

        debug!("TOML 模板文件加载完成");
        Ok(())
    }

    /// 将 TOML 值转换为 JSON 值
    fn toml_to_json(value: &toml::Value) -> Value {
        match value {
            toml::Value::String(s) => Value::String(s.clone()),
            toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
            toml::Value::Float(f) => Value::Number(
                serde_json::Number::from_f64(*f).unwrap_or_else(|| serde_json::Number::from(0)),
            ),
            toml::Value::Boolean(b) => Value::Bool(*b),
            toml::Value::Array(arr) => {
                Value::Array(arr.iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::toml_to_json(v)))
                    .collect(),
            ),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        }
    }
}

#[async_trait]
impl ConfigSource for TomlTemplateSource {
    async fn fetch(&self) -> Result<Option<Value>, ConfigError> {
        Ok(self.template.as_ref().map(Self::toml_to_json))
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_template()
    }

    fn name(&self) -> &str {
        "TomlTemplateSource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supports_watch(&self) -> bool {
        true
    }
}

#[async_trait]
impl FileTemplateSource for TomlTemplateSource {
    fn file_path(&self) -> &str {
        self.file_path.to_str().unwrap_or("unknown")
    }

    async fn file_exists(&self) -> bool {
        self.file_path.exists()
    }

    async fn last_modified(&self) -> Result<SystemTime, ConfigError> {
        self.last_modified.ok_or_else(|| ConfigError::FileNotFound {
            path: self.file_path.display().to_string(),
        })
    }
}

/// JSON 模板配置源
#[derive(Debug)]
pub struct JsonTemplateSource {
    file_path: PathBuf,
    template: Option<Value>,
    last_modified: Option<SystemTime>,
    priority: i32,
}

impl JsonTemplateSource {
    /// 创建新的 JSON 模板配置源
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file_path = path.as_ref().to_path_buf();
        let mut source = Self {
            file_path,
            template: None,
            last_modified: None,
            priority: 90, // JSON 模板中等优先级
        };

        source.load_template()?;
        Ok(source)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 加载模板文件
    fn load_template(&mut self) -> Result<(), ConfigError> {
        debug!("加载 JSON 模板文件: {}", self.file_path.display());

        let content = std::fs::read_to_string(&self.file_path)
            .map_err(|e| ConfigError::FileReadError { source: e })?;

        self.template = Some(serde_json::from_str(&content)?);

        self.last_modified = Some(
            std::fs::metadata(&self.file_path)
                .and_then(|m| m.modified())
                .map_err(|e| ConfigError::FileReadError { source: e })?,
        );

        debug!("JSON 模板文件加载完成");
        Ok(())
    }
}

#[async_trait]
impl ConfigSource for JsonTemplateSource {
    async fn fetch(&self) -> Result<Option<Value>, ConfigError> {
        Ok(self.template.clone())
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_template()
    }

    fn name(&self) -> &str {
        "JsonTemplateSource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supports_watch(&self) -> bool {
        true
    }
}

#[async_trait]
impl FileTemplateSource for JsonTemplateSource {
    fn file_path(&self) -> &str {
        self.file_path.to_str().unwrap_or("unknown")
    }

    async fn file_exists(&self) -> bool {
        self.file_path.exists()
    }

    async fn last_modified(&self) -> Result<SystemTime, ConfigError> {
        self.last_modified.ok_or_else(|| ConfigError::FileNotFound {
            path: self.file_path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_payload_source_parses_json() {
        let source = JsonPayloadSource::new(r#"{ "venue": { "gender": true } }"#);

        let value = source.fetch().await.unwrap().unwrap();
        assert_eq!(value["venue"]["gender"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_payload_source_tolerates_corrupt_json() {
        let source = JsonPayloadSource::new("{ not json at all");

        let result = source.fetch().await.unwrap();
        assert!(result.is_none(), "损坏的载荷应该宽容地返回 None");
    }

    #[tokio::test]
    async fn test_empty_payload_source() {
        let source = JsonPayloadSource::empty();
        assert!(source.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toml_template_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[venue]\ngender = true\n\n[venue.food]\noptions = [\"veg\"]"
        )
        .unwrap();

        let source = TomlTemplateSource::new(file.path()).unwrap();
        let value = source.fetch().await.unwrap().unwrap();

        assert_eq!(value["venue"]["gender"], serde_json::json!(true));
        assert_eq!(value["venue"]["food"]["options"], serde_json::json!(["veg"]));
    }

    #[tokio::test]
    async fn test_json_template_source_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "venue": {{ "gender": false }} }}"#).unwrap();
        file.flush().unwrap();

        let mut source = JsonTemplateSource::new(file.path()).unwrap();
        let before = source.fetch().await.unwrap().unwrap();
        assert_eq!(before["venue"]["gender"], serde_json::json!(false));

        std::fs::write(file.path(), r#"{ "venue": { "gender": true } }"#).unwrap();
        source.reload().await.unwrap();

        let after = source.fetch().await.unwrap().unwrap();
        assert_eq!(after["venue"]["gender"], serde_json::json!(true));
    }

    #[test]
    fn test_missing_template_file_is_an_error() {
        let result = TomlTemplateSource::new("definitely/not/there.toml");
        assert!(result.is_err());
    }
}
