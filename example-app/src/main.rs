//! # 示例应用程序
//!
//! 演示如何使用 VenueHub 动态表单配置引擎：从模板文件或持久化载荷
//! 解析初始配置，打开编辑会话，执行一轮脚本化修改并观察定格上报。

use clap::Parser;
use formconfig_abstractions::TemplateWatcher;
use formconfig_impl::{
    FormConfigSynchronizer, FormConfigValidator, FormEventHandler, FormTemplateManager,
    FormValidationManager, JsonPayloadSource, JsonTemplateSource, LoggingFormChangeListener,
    TemplateFileWatcher, TomlTemplateSource,
};
use formconfig_types::{FieldPath, LeafValue, VenueField};
use infrastructure_common::InfrastructureError;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "VenueHub 表单配置引擎示例应用")]
struct Args {
    /// 类目模板文件路径（.toml 或 .json）
    #[arg(short, long)]
    template: Option<String>,

    /// 持久化载荷 JSON（模拟 REST 后端返回的 formConfig 字段）
    #[arg(short, long)]
    payload: Option<String>,

    /// 是否监控模板文件变更
    #[arg(long)]
    watch: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(parse_log_level(&args.log_level))
        .init();

    info!("启动 VenueHub 表单配置示例应用");

    // 构建模板管理器
    let mut manager = build_manager(&args).await?;

    // 打开编辑会话
    let mut session = manager.open_session().await?;

    // 挂接变更事件分发器
    let mut event_handler = FormEventHandler::new();
    event_handler
        .register_listener(Arc::new(LoggingFormChangeListener::new()))
        .await?;
    event_handler.start().await?;
    session.attach_event_sink(event_handler.event_sender());
    session.register_listener(Arc::new(LoggingFormChangeListener::new()));

    // 演示一轮脚本化编辑
    demonstrate_editing(&mut session);

    // 验证定格结果
    let mut validation = FormValidationManager::new();
    validation.register_validator(Box::new(FormConfigValidator::new()));
    let report = validation.validate_all(session.configuration());
    info!(
        "验证结果: valid={}, 错误 {} 条, 警告 {} 条",
        report.is_valid,
        report.errors.len(),
        report.warnings.len()
    );

    println!(
        "{}",
        serde_json::to_string_pretty(session.configuration())?
    );

    // 监控模式：模板文件变更触发重新合并
    if args.watch {
        watch_template(&args, &mut manager, &mut session).await?;
    }

    event_handler.stop().await?;
    info!("应用已退出");
    Ok(())
}

/// 构建模板管理器
async fn build_manager(args: &Args) -> Result<FormTemplateManager, InfrastructureError> {
    info!("构建模板管理器");

    let mut manager = FormTemplateManager::new();

    // 添加持久化载荷来源（最高优先级）
    if let Some(payload) = &args.payload {
        manager
            .register_source(Box::new(JsonPayloadSource::new(payload.clone())))
            .await;
    }

    // 添加模板文件来源
    if let Some(template) = &args.template {
        if !Path::new(template).exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("模板文件不存在: {}", template),
            });
        }

        if template.ends_with(".toml") {
            manager
                .register_source(Box::new(TomlTemplateSource::new(template)?))
                .await;
        } else if template.ends_with(".json") {
            manager
                .register_source(Box::new(JsonTemplateSource::new(template)?))
                .await;
        } else {
            warn!("不支持的模板格式: {}", template);
        }
    }

    if manager.source_count() == 0 {
        info!("未提供任何来源，将使用默认模式");
    }

    info!("模板管理器构建完成");
    Ok(manager)
}

/// 演示一轮脚本化编辑
fn demonstrate_editing(session: &mut FormConfigSynchronizer) {
    info!("演示编辑会话 {}", session.session_id());

    let gender = FieldPath::Venue(VenueField::Gender);
    let days = FieldPath::Venue(VenueField::OpenDaysDays);

    if let Err(e) = session.set_field(gender, LeafValue::Bool(true)) {
        warn!("字段写入失败: {}", e);
    }
    if let Err(e) = session.toggle_list_member(days, "sunday") {
        warn!("列表成员翻转失败: {}", e);
    }
    session.add_custom_option("Banquet Hall");

    // 一次定格合并上面的全部修改
    let notified = session.settle();
    info!("编辑定格完成, 是否上报: {}", notified);
}

/// 监控模板文件并在变更时重新合并
async fn watch_template(
    args: &Args,
    manager: &mut FormTemplateManager,
    session: &mut FormConfigSynchronizer,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(template) = &args.template else {
        warn!("未提供模板文件，忽略 --watch");
        return Ok(());
    };

    let mut watcher = TemplateFileWatcher::new();
    watcher.add_watch_path(Path::new(template)).await?;
    let mut receiver = watcher
        .take_event_receiver()
        .ok_or("事件接收器不可用")?;
    watcher.start_watching().await?;

    info!("进入监控模式，Ctrl+C 退出");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("收到退出信号");
                break;
            }
            Some(event) = receiver.recv() => {
                info!("模板文件变更: {}", event.path.display());

                if let Err(e) = manager.reload_all().await {
                    warn!("模板重载失败: {}", e);
                    continue;
                }

                let initial = manager.resolve_initial().await?;
                if session.apply_external(initial.as_ref()) {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(session.configuration())?
                    );
                }
            }
        }
    }

    watcher.stop_watching().await?;
    Ok(())
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
