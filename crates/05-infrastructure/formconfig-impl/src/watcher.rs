//! 模板文件监控器实现

use async_trait::async_trait;
use formconfig_abstractions::{
    ExtensionFileFilter, FileFilter, TemplateFileEvent, TemplateFileEventType, TemplateWatcher,
};
use infrastructure_common::ConfigError;
use notify::{recommended_watcher, Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// 模板文件监控器
///
/// 监控类目模板文件的变更，经过扩展名过滤与防抖后把事件送入通道，
/// 供所属方触发对应来源的重载与重新合并。
pub struct TemplateFileWatcher {
    /// 文件系统监控器
    watcher: Option<notify::RecommendedWatcher>,
    /// 模板事件发送器
    event_sender: mpsc::Sender<TemplateFileEvent>,
    /// 模板事件接收器
    event_receiver: Option<mpsc::Receiver<TemplateFileEvent>>,
    /// 监控路径列表
    watched_paths: Vec<PathBuf>,
    /// 是否正在监控
    is_watching: bool,
    /// 防抖延迟
    debounce_delay: Duration,
    /// 文件过滤器
    file_filter: Arc<dyn FileFilter>,
}

impl std::fmt::Debug for TemplateFileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFileWatcher")
            .field("watched_paths", &self.watched_paths)
            .field("is_watching", &self.is_watching)
            .field("debounce_delay", &self.debounce_delay)
            .field("file_filter", &self.file_filter.name())
            .finish()
    }
}

impl TemplateFileWatcher {
    /// 创建新的模板文件监控器
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::channel(1000);

        Self {
            watcher: None,
            event_sender,
            event_receiver: Some(event_receiver),
            watched_paths: Vec::new(),
            is_watching: false,
            debounce_delay: Duration::from_millis(500),
            file_filter: Arc::new(ExtensionFileFilter::template_files()),
        }
    }

    /// 设置防抖延迟
    pub fn set_debounce_delay(&mut self, delay: Duration) {
        self.debounce_delay = delay;
    }

    /// 获取防抖延迟
    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    /// 设置文件过滤器
    pub fn set_file_filter(&mut self, filter: Arc<dyn FileFilter>) {
        self.file_filter = filter;
    }

    fn classify(kind: &EventKind) -> Option<TemplateFileEventType> {
        match kind {
            EventKind::Create(_) => Some(TemplateFileEventType::Created),
            EventKind::Modify(_) => Some(TemplateFileEventType::Modified),
            EventKind::Remove(_) => Some(TemplateFileEventType::Removed),
            _ => None,
        }
    }
}

impl Default for TemplateFileWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateWatcher for TemplateFileWatcher {
    async fn start_watching(&mut self) -> Result<(), ConfigError> {
        if self.is_watching {
            warn!("模板监控器已经在运行");
            return Ok(());
        }

        info!("启动模板文件监控");

        let sender = self.event_sender.clone();
        let filter = Arc::clone(&self.file_filter);
        let debounce_delay = self.debounce_delay;
        // 防抖记录：notify 回调线程内按路径记录上次放行时间
        let last_emitted: Arc<Mutex<HashMap<PathBuf, Instant>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let mut watcher = recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("文件监控错误: {:?}", e);
                    return;
                }
            };

            let Some(event_type) = TemplateFileWatcher::classify(&event.kind) else {
                return;
            };

            for path in event.paths {
                if !filter.should_watch(&path) {
                    continue;
                }

                {
                    let mut last = last_emitted.lock();
                    let now = Instant::now();
                    if let Some(previous) = last.get(&path) {
                        if now.duration_since(*previous) < debounce_delay {
                            continue;
                        }
                    }
                    last.insert(path.clone(), now);
                }

                let template_event = TemplateFileEvent::new(event_type.clone(), path);
                if let Err(e) = sender.try_send(template_event) {
                    warn!("模板事件发送失败: {}", e);
                }
            }
        })
        .map_err(|e| ConfigError::WatchError {
            message: format!("创建文件监控器失败: {}", e),
        })?;

        for path in &self.watched_paths {
            if let Err(e) = watcher.watch(path, RecursiveMode::Recursive) {
                error!("添加监控路径失败: {} - {}", path.display(), e);
            } else {
                info!("添加监控路径: {}", path.display());
            }
        }

        self.watcher = Some(watcher);
        self.is_watching = true;

        info!("模板文件监控启动完成");
        Ok(())
    }

    async fn stop_watching(&mut self) -> Result<(), ConfigError> {
        if !self.is_watching {
            warn!("模板监控器未在运行");
            return Ok(());
        }

        info!("停止模板文件监控");

        self.watcher = None;
        self.is_watching = false;

        info!("模板文件监控停止完成");
        Ok(())
    }

    async fn add_watch_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        let path_buf = path.to_path_buf();

        if self.watched_paths.contains(&path_buf) {
            warn!("路径已在监控列表中: {}", path.display());
            return Ok(());
        }

        info!("添加监控路径: {}", path.display());

        if let Some(watcher) = &mut self.watcher {
            watcher
                .watch(&path_buf, RecursiveMode::Recursive)
                .map_err(|e| ConfigError::WatchError {
                    message: format!("添加监控路径失败: {}", e),
                })?;
        }

        self.watched_paths.push(path_buf);
        Ok(())
    }

    async fn remove_watch_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        let path_buf = path.to_path_buf();

        if !self.watched_paths.contains(&path_buf) {
            warn!("路径不在监控列表中: {}", path.display());
            return Ok(());
        }

        info!("移除监控路径: {}", path.display());

        if let Some(watcher) = &mut self.watcher {
            watcher
                .unwatch(&path_buf)
                .map_err(|e| ConfigError::WatchError {
                    message: format!("移除监控路径失败: {}", e),
                })?;
        }

        self.watched_paths.retain(|p| p != &path_buf);
        Ok(())
    }

    fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<TemplateFileEvent>> {
        self.event_receiver.take()
    }

    fn is_watching(&self) -> bool {
        self.is_watching
    }

    fn watched_paths(&self) -> Vec<PathBuf> {
        self.watched_paths.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watcher_creation() {
        let mut watcher = TemplateFileWatcher::new();

        assert!(!watcher.is_watching());
        assert!(watcher.watched_paths().is_empty());
        assert!(watcher.take_event_receiver().is_some());
        // 接收器只能取走一次
        assert!(watcher.take_event_receiver().is_none());
    }

    #[tokio::test]
    async fn test_watcher_path_management() {
        let mut watcher = TemplateFileWatcher::new();
        let path = PathBuf::from("templates/wedding.toml");

        watcher.add_watch_path(&path).await.unwrap();
        assert_eq!(watcher.watched_paths().len(), 1);

        // 重复添加不产生重复项
        watcher.add_watch_path(&path).await.unwrap();
        assert_eq!(watcher.watched_paths().len(), 1);

        watcher.remove_watch_path(&path).await.unwrap();
        assert!(watcher.watched_paths().is_empty());
    }

    #[tokio::test]
    async fn test_watcher_start_stop() {
        let mut watcher = TemplateFileWatcher::new();
        let dir = tempfile::tempdir().unwrap();

        watcher.add_watch_path(dir.path()).await.unwrap();
        watcher.start_watching().await.unwrap();
        assert!(watcher.is_watching());

        watcher.stop_watching().await.unwrap();
        assert!(!watcher.is_watching());
    }
}
