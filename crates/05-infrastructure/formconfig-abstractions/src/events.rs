//! 表单配置变更事件定义

use formconfig_types::FormConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// 变更来源
///
/// 在变更发生的同步时刻确定并随事件携带：向上通知与否由来源标签
/// 和深度相等闸门决定，不依赖延迟清除的副作用标志。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// 会话内的本地编辑
    Local,
    /// 所属方重新下发的外部配置
    External,
}

/// 变更事件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FormChangeEventType {
    /// 叶子字段写入
    FieldSet,
    /// 列表成员翻转
    MemberToggled,
    /// 自定义选项追加
    OptionAdded,
    /// 自定义选项移除
    OptionRemoved,
    /// 外部配置重新合并
    Remerged,
}

/// 表单配置变更事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormChangeEvent {
    /// 事件类型
    pub event_type: FormChangeEventType,
    /// 变更来源
    pub origin: ChangeOrigin,
    /// 变更路径（点分形式）
    pub path: String,
    /// 旧值
    pub old_value: Option<serde_json::Value>,
    /// 新值
    pub new_value: Option<serde_json::Value>,
    /// 所属编辑会话
    pub session: Uuid,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// 额外元数据
    pub metadata: HashMap<String, String>,
}

impl FormChangeEvent {
    fn new(
        event_type: FormChangeEventType,
        origin: ChangeOrigin,
        session: Uuid,
        path: impl Into<String>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            origin,
            path: path.into(),
            old_value,
            new_value,
            session,
            timestamp: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// 创建字段写入事件
    pub fn field_set(
        session: Uuid,
        path: impl Into<String>,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
    ) -> Self {
        Self::new(
            FormChangeEventType::FieldSet,
            ChangeOrigin::Local,
            session,
            path,
            Some(old_value),
            Some(new_value),
        )
    }

    /// 创建列表成员翻转事件
    pub fn member_toggled(
        session: Uuid,
        path: impl Into<String>,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
    ) -> Self {
        Self::new(
            FormChangeEventType::MemberToggled,
            ChangeOrigin::Local,
            session,
            path,
            Some(old_value),
            Some(new_value),
        )
    }

    /// 创建自定义选项追加事件
    pub fn option_added(
        session: Uuid,
        path: impl Into<String>,
        new_value: serde_json::Value,
    ) -> Self {
        Self::new(
            FormChangeEventType::OptionAdded,
            ChangeOrigin::Local,
            session,
            path,
            None,
            Some(new_value),
        )
    }

    /// 创建自定义选项移除事件
    pub fn option_removed(
        session: Uuid,
        path: impl Into<String>,
        old_value: serde_json::Value,
    ) -> Self {
        Self::new(
            FormChangeEventType::OptionRemoved,
            ChangeOrigin::Local,
            session,
            path,
            Some(old_value),
            None,
        )
    }

    /// 创建外部重新合并事件
    pub fn remerged(session: Uuid, path: impl Into<String>) -> Self {
        Self::new(
            FormChangeEventType::Remerged,
            ChangeOrigin::External,
            session,
            path,
            None,
            None,
        )
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 模板文件事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFileEvent {
    /// 事件类型
    pub event_type: TemplateFileEventType,
    /// 文件路径
    pub path: PathBuf,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl TemplateFileEvent {
    /// 创建模板文件事件
    pub fn new(event_type: TemplateFileEventType, path: PathBuf) -> Self {
        Self {
            event_type,
            path,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 模板文件事件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TemplateFileEventType {
    /// 文件创建
    Created,
    /// 文件修改
    Modified,
    /// 文件删除
    Removed,
}

/// 表单变更监听器 trait
pub trait FormChangeListener: Send + Sync {
    /// 处理单条变更事件
    fn on_form_event(&self, event: &FormChangeEvent);

    /// 处理一次已定格的配置（每次定格恰好调用一次）
    fn on_form_settled(&self, config: &FormConfiguration);

    /// 处理模板文件事件
    fn on_template_file_event(&self, event: &TemplateFileEvent);

    /// 获取监听器名称
    fn name(&self) -> &str;

    /// 是否启用
    fn is_enabled(&self) -> bool {
        true
    }

    /// 获取感兴趣的变更来源（空列表表示全部）
    fn interested_origins(&self) -> Vec<ChangeOrigin>;
}
