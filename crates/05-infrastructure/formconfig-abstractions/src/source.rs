//! 配置源抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigError;
use serde_json::Value;

/// 配置源 trait
///
/// 定义从不同来源获取部分表单配置的统一接口。来源可以是 REST 后端
/// 持久化的 `formConfig` 载荷，也可以是运维环境播种的类目模板文件。
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// 获取部分配置
    ///
    /// 返回 `Ok(None)` 表示该来源当前没有可用配置（例如载荷损坏被宽容
    /// 跳过），调用方应回落到更低优先级的来源或默认模式。
    async fn fetch(&self) -> Result<Option<Value>, ConfigError>;

    /// 重新加载配置
    async fn reload(&mut self) -> Result<(), ConfigError>;

    /// 获取来源名称
    fn name(&self) -> &str;

    /// 获取来源优先级（数值大的优先）
    fn priority(&self) -> i32 {
        0
    }

    /// 是否支持文件监控
    fn supports_watch(&self) -> bool {
        false
    }
}

/// 文件模板配置源 trait
#[async_trait]
pub trait FileTemplateSource: ConfigSource {
    /// 获取文件路径
    fn file_path(&self) -> &str;

    /// 检查文件是否存在
    async fn file_exists(&self) -> bool;

    /// 获取文件最后修改时间
    async fn last_modified(&self) -> Result<std::time::SystemTime, ConfigError>;
}
