//! 模板文件监控抽象接口

use crate::events::TemplateFileEvent;
use async_trait::async_trait;
use infrastructure_common::ConfigError;
use std::path::Path;
use tokio::sync::mpsc;

/// 模板监控器 trait
///
/// 监控类目模板文件的变更并发送事件通知，供所属方触发重新合并。
#[async_trait]
pub trait TemplateWatcher: Send + Sync {
    /// 开始监控
    async fn start_watching(&mut self) -> Result<(), ConfigError>;

    /// 停止监控
    async fn stop_watching(&mut self) -> Result<(), ConfigError>;

    /// 添加监控路径
    async fn add_watch_path(&mut self, path: &Path) -> Result<(), ConfigError>;

    /// 移除监控路径
    async fn remove_watch_path(&mut self, path: &Path) -> Result<(), ConfigError>;

    /// 取走变更事件接收器（只能取走一次）
    fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<TemplateFileEvent>>;

    /// 是否正在监控
    fn is_watching(&self) -> bool;

    /// 获取监控路径列表
    fn watched_paths(&self) -> Vec<std::path::PathBuf>;
}

/// 文件过滤器 trait
pub trait FileFilter: Send + Sync {
    /// 检查文件是否应该被监控
    fn should_watch(&self, path: &Path) -> bool;

    /// 获取过滤器名称
    fn name(&self) -> &str;
}

/// 扩展名文件过滤器
#[derive(Debug)]
pub struct ExtensionFileFilter {
    extensions: Vec<String>,
}

impl ExtensionFileFilter {
    /// 创建新的扩展名过滤器
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// 创建模板文件过滤器
    pub fn template_files() -> Self {
        Self {
            extensions: vec!["toml".to_string(), "json".to_string()],
        }
    }
}

impl FileFilter for ExtensionFileFilter {
    fn should_watch(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            self.extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(extension))
        } else {
            false
        }
    }

    fn name(&self) -> &str {
        "ExtensionFileFilter"
    }
}

/// 模式文件过滤器
#[derive(Debug)]
pub struct PatternFileFilter {
    patterns: Vec<glob::Pattern>,
}

impl PatternFileFilter {
    /// 创建新的模式过滤器
    pub fn new(patterns: Vec<String>) -> Result<Self, glob::PatternError> {
        let mut compiled_patterns = Vec::new();
        for pattern in patterns {
            compiled_patterns.push(glob::Pattern::new(&pattern)?);
        }
        Ok(Self {
            patterns: compiled_patterns,
        })
    }
}

impl FileFilter for PatternFileFilter {
    fn should_watch(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&path_str))
    }

    fn name(&self) -> &str {
        "PatternFileFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_filter() {
        let filter = ExtensionFileFilter::template_files();

        assert!(filter.should_watch(&PathBuf::from("templates/wedding.toml")));
        assert!(filter.should_watch(&PathBuf::from("templates/birthday.JSON")));
        assert!(!filter.should_watch(&PathBuf::from("templates/notes.txt")));
        assert!(!filter.should_watch(&PathBuf::from("templates/no_extension")));
    }

    #[test]
    fn test_pattern_filter() {
        let filter = PatternFileFilter::new(vec!["templates/*.toml".to_string()]).unwrap();

        assert!(filter.should_watch(&PathBuf::from("templates/wedding.toml")));
        assert!(!filter.should_watch(&PathBuf::from("other/wedding.toml")));
    }
}
