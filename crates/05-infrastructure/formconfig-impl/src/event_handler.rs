//! 变更事件分发器实现

use formconfig_abstractions::{
    ChangeOrigin, FormChangeEvent, FormChangeEventType, FormChangeListener, TemplateFileEvent,
};
use formconfig_types::FormConfiguration;
use infrastructure_common::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// 表单事件分发器
///
/// 负责管理监听器并把同步器转发来的变更事件分发给它们。分发跑在
/// 独立的 tokio 任务上，监听器回调必须是非阻塞的同步调用。
pub struct FormEventHandler {
    /// 事件监听器映射
    listeners: Arc<RwLock<HashMap<String, Arc<dyn FormChangeListener>>>>,
    /// 事件分发通道
    event_sender: mpsc::Sender<FormChangeEvent>,
    /// 事件接收器（用于内部处理）
    event_receiver: Option<mpsc::Receiver<FormChangeEvent>>,
    /// 是否正在运行
    is_running: bool,
    /// 事件处理任务句柄
    handler_task: Option<tokio::task::JoinHandle<()>>,
}

impl FormEventHandler {
    /// 创建新的表单事件分发器
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(1000);

        Self {
            listeners: Arc::new(RwLock::new(HashMap::new())),
            event_sender: sender,
            event_receiver: Some(receiver),
            is_running: false,
            handler_task: None,
        }
    }

    /// 获取事件发送器（挂接到同步器）
    pub fn event_sender(&self) -> mpsc::Sender<FormChangeEvent> {
        self.event_sender.clone()
    }

    /// 注册事件监听器
    pub async fn register_listener(
        &mut self,
        listener: Arc<dyn FormChangeListener>,
    ) -> Result<(), ConfigError> {
        info!("注册变更事件监听器: {}", listener.name());

        let mut listeners = self.listeners.write().await;
        listeners.insert(listener.name().to_string(), listener);

        Ok(())
    }

    /// 移除事件监听器
    pub async fn unregister_listener(&mut self, listener_name: &str) -> Result<(), ConfigError> {
        info!("移除变更事件监听器: {}", listener_name);

        let mut listeners = self.listeners.write().await;
        if listeners.remove(listener_name).is_some() {
            Ok(())
        } else {
            warn!("变更事件监听器不存在: {}", listener_name);
            Err(ConfigError::KeyNotFound {
                key: listener_name.to_string(),
            })
        }
    }

    /// 发送变更事件
    pub async fn send_event(&self, event: FormChangeEvent) -> Result<(), ConfigError> {
        debug!("发送变更事件: {:?}", event.event_type);

        self.event_sender
            .send(event)
            .await
            .map_err(|e| ConfigError::DispatchError {
                message: format!("发送事件失败: {}", e),
            })?;

        Ok(())
    }

    /// 启动事件分发器
    pub async fn start(&mut self) -> Result<(), ConfigError> {
        if self.is_running {
            return Ok(());
        }

        info!("启动变更事件分发器");

        let listeners = self.listeners.clone();
        let mut receiver =
            self.event_receiver
                .take()
                .ok_or_else(|| ConfigError::DispatchError {
                    message: "事件接收器不可用".to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                FormEventHandler::dispatch_event(&listeners, event).await;
            }
        });

        self.handler_task = Some(handle);
        self.is_running = true;

        info!("变更事件分发器已启动");
        Ok(())
    }

    /// 停止事件分发器
    pub async fn stop(&mut self) -> Result<(), ConfigError> {
        if !self.is_running {
            return Ok(());
        }

        info!("停止变更事件分发器");

        if let Some(handle) = self.handler_task.take() {
            handle.abort();
        }

        self.is_running = false;

        info!("变更事件分发器已停止");
        Ok(())
    }

    /// 分发事件到监听器
    async fn dispatch_event(
        listeners: &Arc<RwLock<HashMap<String, Arc<dyn FormChangeListener>>>>,
        event: FormChangeEvent,
    ) {
        let listeners_guard = listeners.read().await;

        for (name, listener) in listeners_guard.iter() {
            if !listener.is_enabled() {
                continue;
            }

            // 检查监听器是否对此变更来源感兴趣
            let interested = listener.interested_origins();
            if !interested.is_empty() && !interested.contains(&event.origin) {
                continue;
            }

            debug!("向监听器 {} 分发事件: {:?}", name, event.event_type);

            listener.on_form_event(&event);
        }
    }

    /// 获取监听器数量
    pub async fn listener_count(&self) -> usize {
        let listeners = self.listeners.read().await;
        listeners.len()
    }

    /// 获取所有监听器名称
    pub async fn listener_names(&self) -> Vec<String> {
        let listeners = self.listeners.read().await;
        listeners.keys().cloned().collect()
    }

    /// 是否正在运行
    pub fn is_running(&self) -> bool {
        self.is_running
    }
}

impl Default for FormEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志记录监听器
///
/// 将所有表单变更事件记录到日志中。
pub struct LoggingFormChangeListener {
    name: String,
    enabled: bool,
    interested_origins: Vec<ChangeOrigin>,
}

impl LoggingFormChangeListener {
    /// 创建新的日志记录监听器
    pub fn new() -> Self {
        Self {
            name: "LoggingFormChangeListener".to_string(),
            enabled: true,
            interested_origins: Vec::new(),
        }
    }

    /// 设置是否启用
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 设置感兴趣的变更来源
    pub fn set_interested_origins(&mut self, origins: Vec<ChangeOrigin>) {
        self.interested_origins = origins;
    }
}

impl Default for LoggingFormChangeListener {
    fn default() -> Self {
        Self::new()
    }
}

impl FormChangeListener for LoggingFormChangeListener {
    fn on_form_event(&self, event: &FormChangeEvent) {
        match event.event_type {
            FormChangeEventType::FieldSet => {
                info!("字段写入: {} (会话 {})", event.path, event.session);
            }
            FormChangeEventType::MemberToggled => {
                info!("列表成员翻转: {} (会话 {})", event.path, event.session);
            }
            FormChangeEventType::OptionAdded => {
                info!("自定义选项追加: {} (会话 {})", event.path, event.session);
            }
            FormChangeEventType::OptionRemoved => {
                info!("自定义选项移除: {} (会话 {})", event.path, event.session);
            }
            FormChangeEventType::Remerged => {
                info!("外部配置重新合并 (会话 {})", event.session);
            }
        }

        if !event.metadata.is_empty() {
            debug!("事件元数据: {:?}", event.metadata);
        }
    }

    fn on_form_settled(&self, _config: &FormConfiguration) {
        info!("配置定格上报");
    }

    fn on_template_file_event(&self, event: &TemplateFileEvent) {
        debug!(
            "模板文件事件: {:?} for {}",
            event.event_type,
            event.path.display()
        );
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn interested_origins(&self) -> Vec<ChangeOrigin> {
        self.interested_origins.clone()
    }
}

/// 计数监听器
///
/// 按来源统计变更事件数量，供测试与运维观测使用。
pub struct CountingFormChangeListener {
    name: String,
    enabled: bool,
    local_count: std::sync::atomic::AtomicU64,
    external_count: std::sync::atomic::AtomicU64,
    settled_count: std::sync::atomic::AtomicU64,
}

impl CountingFormChangeListener {
    /// 创建新的计数监听器
    pub fn new() -> Self {
        Self {
            name: "CountingFormChangeListener".to_string(),
            enabled: true,
            local_count: std::sync::atomic::AtomicU64::new(0),
            external_count: std::sync::atomic::AtomicU64::new(0),
            settled_count: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// 获取本地变更事件数
    pub fn local_count(&self) -> u64 {
        self.local_count.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// 获取外部变更事件数
    pub fn external_count(&self) -> u64 {
        self.external_count
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// 获取定格上报次数
    pub fn settled_count(&self) -> u64 {
        self.settled_count
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// 重置计数器
    pub fn reset_counters(&self) {
        self.local_count
            .store(0, std::sync::atomic::Ordering::Relaxed);
        self.external_count
            .store(0, std::sync::atomic::Ordering::Relaxed);
        self.settled_count
            .store(0, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Default for CountingFormChangeListener {
    fn default() -> Self {
        Self::new()
    }
}

impl FormChangeListener for CountingFormChangeListener {
    fn on_form_event(&self, event: &FormChangeEvent) {
        match event.origin {
            ChangeOrigin::Local => {
                self.local_count
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
            ChangeOrigin::External => {
                self.external_count
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        }
    }

    fn on_form_settled(&self, _config: &FormConfiguration) {
        self.settled_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn on_template_file_event(&self, _event: &TemplateFileEvent) {
        // 计数监听器不处理模板文件事件
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn interested_origins(&self) -> Vec<ChangeOrigin> {
        Vec::new()
    }
}
