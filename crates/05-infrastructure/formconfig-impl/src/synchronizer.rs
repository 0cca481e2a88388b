//! 编辑会话同步器实现
//!
//! 同步器持有一份始终完整有效的表单配置，向编辑界面暴露按路径寻址的
//! 修改操作，并在配置定格后恰好一次地向所属方上报。双向都以深度结构
//! 相等作为唯一过滤条件：所属方回写相同状态不会触发回声通知，同一
//! 事件处理内的连续修改合并为一次定格上报。

use crate::merge::merge_with_defaults;
use formconfig_types::{FieldPath, FormConfiguration, LeafValue, VenueField};
use infrastructure_common::ConfigError;
use formconfig_abstractions::{FormChangeEvent, FormChangeListener};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 同步状态
///
/// `Initializing -> Settled <-> LocallyMutating`。
/// 变更来源在修改发生的同步时刻确定并随事件携带，
/// 不存在需要延迟清除的抑制标志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// 首次合并进行中，不向所属方上报
    Initializing,
    /// 配置已定格
    Settled,
    /// 本地修改尚未定格
    LocallyMutating,
}

/// 表单配置同步器
///
/// 每个编辑会话创建一个实例；实例只有一个写者（会话自身的事件处理），
/// 所有修改操作同步完成。
pub struct FormConfigSynchronizer {
    /// 会话标识
    session_id: Uuid,
    /// 同步状态
    state: SyncState,
    /// 当前配置
    config: FormConfiguration,
    /// 最近一次收到的外部配置（外部方向的深度相等闸门）
    last_received: Option<Value>,
    /// 最近一次上报的配置快照（本地方向的深度相等闸门）
    last_notified: FormConfiguration,
    /// 定格监听器列表
    listeners: RwLock<Vec<Arc<dyn FormChangeListener>>>,
    /// 变更事件转发通道
    event_sink: Option<mpsc::Sender<FormChangeEvent>>,
}

impl std::fmt::Debug for FormConfigSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfigSynchronizer")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("listener_count", &self.listeners.read().len())
            .field("has_event_sink", &self.event_sink.is_some())
            .finish()
    }
}

impl FormConfigSynchronizer {
    /// 创建新的编辑会话
    ///
    /// 首次合并不向所属方上报：没有新东西可报。
    pub fn new(initial: Option<Value>) -> Self {
        let mut synchronizer = Self {
            session_id: Uuid::new_v4(),
            state: SyncState::Initializing,
            config: FormConfiguration::default(),
            last_received: None,
            last_notified: FormConfiguration::default(),
            listeners: RwLock::new(Vec::new()),
            event_sink: None,
        };

        debug!("创建编辑会话: {}", synchronizer.session_id);

        synchronizer.config = merge_with_defaults(initial.as_ref());
        synchronizer.last_notified = synchronizer.config.clone();
        synchronizer.last_received = initial;
        synchronizer.state = SyncState::Settled;

        synchronizer
    }

    /// 获取会话标识
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 获取同步状态
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// 获取当前配置
    pub fn configuration(&self) -> &FormConfiguration {
        &self.config
    }

    /// 注册定格监听器
    pub fn register_listener(&self, listener: Arc<dyn FormChangeListener>) {
        info!("注册定格监听器: {}", listener.name());
        self.listeners.write().push(listener);
    }

    /// 移除定格监听器
    pub fn unregister_listener(&self, listener_name: &str) -> Result<(), ConfigError> {
        let mut listeners = self.listeners.write();
        let initial_count = listeners.len();
        listeners.retain(|l| l.name() != listener_name);

        if listeners.len() < initial_count {
            info!("移除定格监听器: {}", listener_name);
            Ok(())
        } else {
            warn!("定格监听器不存在: {}", listener_name);
            Err(ConfigError::KeyNotFound {
                key: listener_name.to_string(),
            })
        }
    }

    /// 获取监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 挂接变更事件转发通道
    pub fn attach_event_sink(&mut self, sender: mpsc::Sender<FormChangeEvent>) {
        self.event_sink = Some(sender);
    }

    /// 写入叶子字段
    pub fn set_field(&mut self, path: FieldPath, value: LeafValue) -> Result<(), ConfigError> {
        let new_json = value.to_json();
        let old = self.config.set_leaf(path, value)?;

        debug!("写入字段: {} (会话 {})", path, self.session_id);
        self.state = SyncState::LocallyMutating;
        self.emit(FormChangeEvent::field_set(
            self.session_id,
            path.as_dotted(),
            old.to_json(),
            new_json,
        ));
        Ok(())
    }

    /// 翻转列表叶子的成员
    ///
    /// 成员存在则移除第一次出现，不存在则追加到末尾；返回翻转后成员
    /// 是否在列表中。翻转是取反而非幂等置位：连续两次调用恢复原状。
    pub fn toggle_list_member(
        &mut self,
        path: FieldPath,
        member: &str,
    ) -> Result<bool, ConfigError> {
        let old_json = {
            let list = self.config.list(path)?;
            serde_json::to_value(list)?
        };

        let list = self.config.list_mut(path)?;
        let now_present = match list.iter().position(|item| item == member) {
            Some(index) => {
                list.remove(index);
                false
            }
            None => {
                list.push(member.to_string());
                true
            }
        };

        let new_json = serde_json::to_value(self.config.list(path)?)?;

        debug!(
            "翻转列表成员: {} {} -> {} (会话 {})",
            path, member, now_present, self.session_id
        );
        self.state = SyncState::LocallyMutating;
        self.emit(FormChangeEvent::member_toggled(
            self.session_id,
            path.as_dotted(),
            old_json,
            new_json,
        ));
        Ok(now_present)
    }

    /// 追加自定义场地类型选项
    ///
    /// 输入修剪后为空则不做任何事；重复项原样保留（既有行为，
    /// 验证器会以警告形式上报，见 DESIGN.md）。
    pub fn add_custom_option(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            debug!("忽略空白的自定义选项 (会话 {})", self.session_id);
            return false;
        }

        let path = FieldPath::Venue(VenueField::TypeOptions);
        if let Ok(list) = self.config.list_mut(path) {
            list.push(trimmed.to_string());
        }

        debug!("追加自定义选项: {} (会话 {})", trimmed, self.session_id);
        self.state = SyncState::LocallyMutating;
        self.emit(FormChangeEvent::option_added(
            self.session_id,
            path.as_dotted(),
            Value::String(trimmed.to_string()),
        ));
        true
    }

    /// 按下标移除自定义场地类型选项
    ///
    /// 下标越界时不做任何事，返回 `None`。
    pub fn remove_option_at(&mut self, index: usize) -> Option<String> {
        let path = FieldPath::Venue(VenueField::TypeOptions);
        let removed = match self.config.list_mut(path) {
            Ok(list) if index < list.len() => list.remove(index),
            _ => return None,
        };

        debug!(
            "移除自定义选项: {} (下标 {}, 会话 {})",
            removed, index, self.session_id
        );
        self.state = SyncState::LocallyMutating;
        self.emit(FormChangeEvent::option_removed(
            self.session_id,
            path.as_dotted(),
            Value::String(removed.clone()),
        ));
        Some(removed)
    }

    /// 应用所属方重新下发的外部配置
    ///
    /// 与最近一次收到的外部配置深度相等时不做任何事（所属方把相同状态
    /// 回写下来是正常的回声，不是变更）。发生变化时重新合并并采纳结果，
    /// 同时把上报快照更新为采纳值，抑制紧随其后的一次向上通知。
    pub fn apply_external(&mut self, partial: Option<&Value>) -> bool {
        let incoming = partial.cloned();
        if incoming == self.last_received {
            debug!("外部配置未变化，跳过重新合并 (会话 {})", self.session_id);
            return false;
        }

        info!("外部配置变化，重新合并 (会话 {})", self.session_id);

        self.config = merge_with_defaults(partial);
        self.last_received = incoming;
        // 采纳即视为已上报：外部来源的变更不再回声给所属方
        self.last_notified = self.config.clone();
        self.state = SyncState::Settled;

        self.emit(FormChangeEvent::remerged(self.session_id, "*"));
        true
    }

    /// 定格当前配置
    ///
    /// 当前配置与上报快照深度不相等时，向每个启用的监听器恰好上报一次
    /// 完整配置并更新快照；连续的本地修改合并为最终状态的一次上报。
    /// 返回本次定格是否触发了上报。
    pub fn settle(&mut self) -> bool {
        if self.config == self.last_notified {
            self.state = SyncState::Settled;
            return false;
        }

        let snapshot = self.config.clone();
        {
            let listeners = self.listeners.read();
            for listener in listeners.iter() {
                if listener.is_enabled() {
                    listener.on_form_settled(&snapshot);
                }
            }
        }

        debug!("配置定格并上报 (会话 {})", self.session_id);
        self.last_notified = snapshot;
        self.state = SyncState::Settled;
        true
    }

    fn emit(&self, event: FormChangeEvent) {
        if let Some(sink) = &self.event_sink {
            if let Err(e) = sink.try_send(event) {
                warn!("变更事件转发失败: {}", e);
            }
        }
    }
}
