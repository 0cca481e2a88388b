//! 字段路径的封闭枚举
//!
//! 叶子地址建模为封闭联合：非法路径在解析边界就变成错误值，不可能
//! 静默创建中间对象。点分字符串（`"venue.location.city"`）仅作为
//! 持久化载荷与日志的兼容表示保留。

use crate::schema::FormConfiguration;
use infrastructure_common::ConfigError;
use std::fmt;
use std::str::FromStr;

/// 叶子种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// 布尔开关
    Bool,
    /// 字符串列表
    StringList,
}

/// 叶子值
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    /// 布尔开关
    Bool(bool),
    /// 字符串列表
    StringList(Vec<String>),
}

impl LeafValue {
    /// 叶子值对应的种类
    pub fn kind(&self) -> LeafKind {
        match self {
            LeafValue::Bool(_) => LeafKind::Bool,
            LeafValue::StringList(_) => LeafKind::StringList,
        }
    }

    /// 转换为 JSON 值
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LeafValue::Bool(b) => serde_json::Value::Bool(*b),
            LeafValue::StringList(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for LeafValue {
    fn from(value: bool) -> Self {
        LeafValue::Bool(value)
    }
}

impl From<Vec<String>> for LeafValue {
    fn from(value: Vec<String>) -> Self {
        LeafValue::StringList(value)
    }
}

/// 字段路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// 场地节内的叶子
    Venue(VenueField),
    /// 预订节内的叶子
    Booking(BookingField),
}

/// 场地节叶子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VenueField {
    Name,
    Description,
    Gender,
    Capacity,
    Photos,
    LocationEnabled,
    LocationCity,
    LocationState,
    LocationAddress,
    PriceTypeEnabled,
    PriceTypeTypes,
    FoodEnabled,
    FoodOptions,
    TypeEnabled,
    TypeAllowCustom,
    TypeOptions,
    OpenDaysEnabled,
    OpenDaysDays,
    AmenitiesEnabled,
    AmenitiesOptions,
}

/// 预订节叶子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingField {
    EventDate,
    GuestCount,
    TimeSlotEnabled,
    TimeSlotOptions,
    PickupDropEnabled,
    PickupDropPickupLocation,
    PickupDropDropLocation,
    AdvancePayment,
    SpecialRequests,
}

impl FieldPath {
    /// 叶子种类
    pub fn leaf_kind(&self) -> LeafKind {
        use BookingField as B;
        use VenueField as V;

        match self {
            FieldPath::Venue(field) => match field {
                V::PriceTypeTypes
                | V::FoodOptions
                | V::TypeOptions
                | V::OpenDaysDays
                | V::AmenitiesOptions => LeafKind::StringList,
                _ => LeafKind::Bool,
            },
            FieldPath::Booking(field) => match field {
                B::TimeSlotOptions => LeafKind::StringList,
                _ => LeafKind::Bool,
            },
        }
    }

    /// 点分路径形式（与持久化 JSON 的 camelCase 字段名一致）
    pub fn as_dotted(&self) -> &'static str {
        use BookingField as B;
        use VenueField as V;

        match self {
            FieldPath::Venue(field) => match field {
                V::Name => "venue.name",
                V::Description => "venue.description",
                V::Gender => "venue.gender",
                V::Capacity => "venue.capacity",
                V::Photos => "venue.photos",
                V::LocationEnabled => "venue.location.enabled",
                V::LocationCity => "venue.location.city",
                V::LocationState => "venue.location.state",
                V::LocationAddress => "venue.location.address",
                V::PriceTypeEnabled => "venue.priceType.enabled",
                V::PriceTypeTypes => "venue.priceType.types",
                V::FoodEnabled => "venue.food.enabled",
                V::FoodOptions => "venue.food.options",
                V::TypeEnabled => "venue.type.enabled",
                V::TypeAllowCustom => "venue.type.allowCustom",
                V::TypeOptions => "venue.type.options",
                V::OpenDaysEnabled => "venue.openDays.enabled",
                V::OpenDaysDays => "venue.openDays.days",
                V::AmenitiesEnabled => "venue.amenities.enabled",
                V::AmenitiesOptions => "venue.amenities.options",
            },
            FieldPath::Booking(field) => match field {
                B::EventDate => "booking.eventDate",
                B::GuestCount => "booking.guestCount",
                B::TimeSlotEnabled => "booking.timeSlot.enabled",
                B::TimeSlotOptions => "booking.timeSlot.options",
                B::PickupDropEnabled => "booking.pickupDrop.enabled",
                B::PickupDropPickupLocation => "booking.pickupDrop.pickupLocation",
                B::PickupDropDropLocation => "booking.pickupDrop.dropLocation",
                B::AdvancePayment => "booking.advancePayment",
                B::SpecialRequests => "booking.specialRequests",
            },
        }
    }

    /// 所有叶子路径
    pub fn all() -> Vec<FieldPath> {
        use BookingField as B;
        use VenueField as V;

        let venue = [
            V::Name,
            V::Description,
            V::Gender,
            V::Capacity,
            V::Photos,
            V::LocationEnabled,
            V::LocationCity,
            V::LocationState,
            V::LocationAddress,
            V::PriceTypeEnabled,
            V::PriceTypeTypes,
            V::FoodEnabled,
            V::FoodOptions,
            V::TypeEnabled,
            V::TypeAllowCustom,
            V::TypeOptions,
            V::OpenDaysEnabled,
            V::OpenDaysDays,
            V::AmenitiesEnabled,
            V::AmenitiesOptions,
        ];
        let booking = [
            B::EventDate,
            B::GuestCount,
            B::TimeSlotEnabled,
            B::TimeSlotOptions,
            B::PickupDropEnabled,
            B::PickupDropPickupLocation,
            B::PickupDropDropLocation,
            B::AdvancePayment,
            B::SpecialRequests,
        ];

        venue
            .iter()
            .map(|f| FieldPath::Venue(*f))
            .chain(booking.iter().map(|f| FieldPath::Booking(*f)))
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_dotted())
    }
}

impl FromStr for FieldPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::all()
            .into_iter()
            .find(|path| path.as_dotted() == s)
            .ok_or_else(|| ConfigError::unknown_path(s))
    }
}

impl FormConfiguration {
    /// 读取叶子值
    pub fn leaf(&self, path: FieldPath) -> LeafValue {
        use BookingField as B;
        use VenueField as V;

        match path {
            FieldPath::Venue(field) => match field {
                V::Name => LeafValue::Bool(self.venue.name),
                V::Description => LeafValue::Bool(self.venue.description),
                V::Gender => LeafValue::Bool(self.venue.gender),
                V::Capacity => LeafValue::Bool(self.venue.capacity),
                V::Photos => LeafValue::Bool(self.venue.photos),
                V::LocationEnabled => LeafValue::Bool(self.venue.location.enabled),
                V::LocationCity => LeafValue::Bool(self.venue.location.city),
                V::LocationState => LeafValue::Bool(self.venue.location.state),
                V::LocationAddress => LeafValue::Bool(self.venue.location.address),
                V::PriceTypeEnabled => LeafValue::Bool(self.venue.price_type.enabled),
                V::PriceTypeTypes => LeafValue::StringList(self.venue.price_type.types.clone()),
                V::FoodEnabled => LeafValue::Bool(self.venue.food.enabled),
                V::FoodOptions => LeafValue::StringList(self.venue.food.options.clone()),
                V::TypeEnabled => LeafValue::Bool(self.venue.venue_type.enabled),
                V::TypeAllowCustom => LeafValue::Bool(self.venue.venue_type.allow_custom),
                V::TypeOptions => LeafValue::StringList(self.venue.venue_type.options.clone()),
                V::OpenDaysEnabled => LeafValue::Bool(self.venue.open_days.enabled),
                V::OpenDaysDays => LeafValue::StringList(self.venue.open_days.days.clone()),
                V::AmenitiesEnabled => LeafValue::Bool(self.venue.amenities.enabled),
                V::AmenitiesOptions => LeafValue::StringList(self.venue.amenities.options.clone()),
            },
            FieldPath::Booking(field) => match field {
                B::EventDate => LeafValue::Bool(self.booking.event_date),
                B::GuestCount => LeafValue::Bool(self.booking.guest_count),
                B::TimeSlotEnabled => LeafValue::Bool(self.booking.time_slot.enabled),
                B::TimeSlotOptions => LeafValue::StringList(self.booking.time_slot.options.clone()),
                B::PickupDropEnabled => LeafValue::Bool(self.booking.pickup_drop.enabled),
                B::PickupDropPickupLocation => {
                    LeafValue::Bool(self.booking.pickup_drop.pickup_location)
                }
                B::PickupDropDropLocation => {
                    LeafValue::Bool(self.booking.pickup_drop.drop_location)
                }
                B::AdvancePayment => LeafValue::Bool(self.booking.advance_payment),
                B::SpecialRequests => LeafValue::Bool(self.booking.special_requests),
            },
        }
    }

    /// 写入叶子值，返回旧值
    ///
    /// 值的种类与路径的叶子种类不一致时返回
    /// [`ConfigError::TypeConversionError`]，配置保持不变。
    pub fn set_leaf(&mut self, path: FieldPath, value: LeafValue) -> Result<LeafValue, ConfigError> {
        if value.kind() != path.leaf_kind() {
            return Err(ConfigError::type_conversion(format!(
                "路径 {} 期望 {:?}，实际为 {:?}",
                path,
                path.leaf_kind(),
                value.kind()
            )));
        }

        let old = self.leaf(path);
        match value {
            LeafValue::Bool(b) => self.set_bool_leaf(path, b),
            LeafValue::StringList(items) => {
                if let Ok(list) = self.list_mut(path) {
                    *list = items;
                }
            }
        }
        Ok(old)
    }

    /// 读取列表叶子
    pub fn list(&self, path: FieldPath) -> Result<&Vec<String>, ConfigError> {
        use BookingField as B;
        use VenueField as V;

        match path {
            FieldPath::Venue(V::PriceTypeTypes) => Ok(&self.venue.price_type.types),
            FieldPath::Venue(V::FoodOptions) => Ok(&self.venue.food.options),
            FieldPath::Venue(V::TypeOptions) => Ok(&self.venue.venue_type.options),
            FieldPath::Venue(V::OpenDaysDays) => Ok(&self.venue.open_days.days),
            FieldPath::Venue(V::AmenitiesOptions) => Ok(&self.venue.amenities.options),
            FieldPath::Booking(B::TimeSlotOptions) => Ok(&self.booking.time_slot.options),
            _ => Err(ConfigError::type_conversion(format!(
                "路径 {} 不是列表叶子",
                path
            ))),
        }
    }

    /// 可变访问列表叶子
    pub fn list_mut(&mut self, path: FieldPath) -> Result<&mut Vec<String>, ConfigError> {
        use BookingField as B;
        use VenueField as V;

        match path {
            FieldPath::Venue(V::PriceTypeTypes) => Ok(&mut self.venue.price_type.types),
            FieldPath::Venue(V::FoodOptions) => Ok(&mut self.venue.food.options),
            FieldPath::Venue(V::TypeOptions) => Ok(&mut self.venue.venue_type.options),
            FieldPath::Venue(V::OpenDaysDays) => Ok(&mut self.venue.open_days.days),
            FieldPath::Venue(V::AmenitiesOptions) => Ok(&mut self.venue.amenities.options),
            FieldPath::Booking(B::TimeSlotOptions) => Ok(&mut self.booking.time_slot.options),
            _ => Err(ConfigError::type_conversion(format!(
                "路径 {} 不是列表叶子",
                path
            ))),
        }
    }

    fn set_bool_leaf(&mut self, path: FieldPath, value: bool) {
        use BookingField as B;
        use VenueField as V;

        match path {
            FieldPath::Venue(field) => match field {
                V::Name => self.venue.name = value,
                V::Description => self.venue.description = value,
                V::Gender => self.venue.gender = value,
                V::Capacity => self.venue.capacity = value,
                V::Photos => self.venue.photos = value,
                V::LocationEnabled => self.venue.location.enabled = value,
                V::LocationCity => self.venue.location.city = value,
                V::LocationState => self.venue.location.state = value,
                V::LocationAddress => self.venue.location.address = value,
                V::PriceTypeEnabled => self.venue.price_type.enabled = value,
                V::FoodEnabled => self.venue.food.enabled = value,
                V::TypeEnabled => self.venue.venue_type.enabled = value,
                V::TypeAllowCustom => self.venue.venue_type.allow_custom = value,
                V::OpenDaysEnabled => self.venue.open_days.enabled = value,
                V::AmenitiesEnabled => self.venue.amenities.enabled = value,
                // 列表叶子在 set_leaf 的种类检查中已被拦截
                V::PriceTypeTypes
                | V::FoodOptions
                | V::TypeOptions
                | V::OpenDaysDays
                | V::AmenitiesOptions => {}
            },
            FieldPath::Booking(field) => match field {
                B::EventDate => self.booking.event_date = value,
                B::GuestCount => self.booking.guest_count = value,
                B::TimeSlotEnabled => self.booking.time_slot.enabled = value,
                B::PickupDropEnabled => self.booking.pickup_drop.enabled = value,
                B::PickupDropPickupLocation => self.booking.pickup_drop.pickup_location = value,
                B::PickupDropDropLocation => self.booking.pickup_drop.drop_location = value,
                B::AdvancePayment => self.booking.advance_payment = value,
                B::SpecialRequests => self.booking.special_requests = value,
                B::TimeSlotOptions => {}
            },
        }
    }
}
