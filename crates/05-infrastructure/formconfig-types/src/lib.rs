//! # FormConfig Types
//!
//! VenueHub 动态表单配置的类型化模型。
//!
//! 每个供应商类目携带一份 `FormConfiguration`，描述该类目下场地表单和
//! 预订表单分别展示哪些字段、哪些选项集可选、哪些选项列表允许自定义扩展。
//!
//! ## 核心类型
//!
//! - [`FormConfiguration`] - 完整的表单配置树（`venue` + `booking` 两个节）
//! - [`FieldPath`] - 叶子地址的封闭枚举（取代自由字符串路径）
//! - [`LeafValue`] - 叶子值（布尔开关或字符串列表）
//!
//! 默认配置常量是进程级不可变数据，合并前总是深拷贝，绝不原地修改。

pub mod path;
pub mod schema;

pub use path::*;
pub use schema::*;
