use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use rms_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::is_valid_order_number;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The name to show the user in messages. Falls back to the username when no email is present.
    pub fn display_name(&self) -> String {
        match &self.email {
            Some(email) => format!("{} ({email})", self.username),
            None => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S) -> Self {
        Self { username: username.into(), ..Default::default() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

//--------------------------------------      Restaurant       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub slug: String,
    pub location: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn full_address(&self) -> String {
        format!("{}, {}", self.name, self.location)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewRestaurant {
    pub owner_id: i64,
    pub name: String,
    pub location: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: String,
}

impl NewRestaurant {
    pub fn new<S: Into<String>>(owner_id: i64, name: S, location: S) -> Self {
        Self { owner_id, name: name.into(), location: location.into(), ..Default::default() }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }
}

//--------------------------------------     MenuCategory      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Appetizer,
    Main,
    Dessert,
    Drink,
    Side,
}

impl Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuCategory::Appetizer => write!(f, "appetizer"),
            MenuCategory::Main => write!(f, "main"),
            MenuCategory::Dessert => write!(f, "dessert"),
            MenuCategory::Drink => write!(f, "drink"),
            MenuCategory::Side => write!(f, "side"),
        }
    }
}

impl FromStr for MenuCategory {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "appetizer" => Ok(Self::Appetizer),
            "main" => Ok(Self::Main),
            "dessert" => Ok(Self::Dessert),
            "drink" => Ok(Self::Drink),
            "side" => Ok(Self::Side),
            s => Err(ConversionError(format!("Invalid menu category: {s}"))),
        }
    }
}

//--------------------------------------       MenuItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: MenuCategory,
    /// Preparation time in minutes
    pub preparation_time: i64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The default preparation time for a menu item, in minutes.
pub const DEFAULT_PREPARATION_TIME: i64 = 15;

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub restaurant_id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: MenuCategory,
    pub preparation_time: i64,
}

impl NewMenuItem {
    pub fn new<S: Into<String>>(restaurant_id: i64, name: S, price: Money, category: MenuCategory) -> Self {
        Self {
            restaurant_id,
            name: name.into(),
            description: String::default(),
            price,
            category,
            preparation_time: DEFAULT_PREPARATION_TIME,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_preparation_time(mut self, minutes: i64) -> Self {
        self.preparation_time = minutes;
        self
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for the restaurant.
    Pending,
    /// The restaurant has accepted the order.
    Confirmed,
    /// The kitchen is preparing the order.
    Preparing,
    /// The order is ready for pickup or dispatch.
    Ready,
    /// The order is on its way to the customer.
    OutForDelivery,
    /// The order has reached the customer. Terminal.
    Delivered,
    /// The order was cancelled by the user, an admin, or automatically because it has no items. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 7] = [
        OrderStatusType::Pending,
        OrderStatusType::Confirmed,
        OrderStatusType::Preparing,
        OrderStatusType::Ready,
        OrderStatusType::OutForDelivery,
        OrderStatusType::Delivered,
        OrderStatusType::Cancelled,
    ];
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Confirmed => write!(f, "confirmed"),
            OrderStatusType::Preparing => write!(f, "preparing"),
            OrderStatusType::Ready => write!(f, "ready"),
            OrderStatusType::OutForDelivery => write!(f, "out_for_delivery"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------       OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Delivery,
    Pickup,
    DineIn,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Delivery => write!(f, "delivery"),
            OrderType::Pickup => write!(f, "pickup"),
            OrderType::DineIn => write!(f, "dine_in"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            "dine_in" => Ok(Self::DineIn),
            s => Err(ConversionError(format!("Invalid order type: {s}"))),
        }
    }
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The customer-facing order reference, e.g. `ORD-3F9A01BC`. Generated once when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_valid_order_number(s) {
            Ok(OrderNumber(s.to_string()))
        } else {
            Err(ConversionError(format!("Invalid order number: {s}")))
        }
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub status: OrderStatusType,
    pub order_type: OrderType,
    pub delivery_address: Option<String>,
    pub delivery_notes: String,
    pub phone_number: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    /// Bumped on every mutation of the order, its items or its status.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub order_type: OrderType,
    /// Required for delivery orders. Ignored for pickup and dine-in orders.
    pub delivery_address: Option<String>,
    pub delivery_notes: String,
    pub phone_number: Option<String>,
    /// Set by the delivery-distance logic outside the engine. Defaults to zero.
    pub delivery_fee: Money,
}

impl NewOrder {
    pub fn new(user_id: i64, restaurant_id: i64, order_type: OrderType) -> Self {
        Self {
            user_id,
            restaurant_id,
            order_type,
            delivery_address: None,
            delivery_notes: String::default(),
            phone_number: None,
            delivery_fee: Money::zero(),
        }
    }

    pub fn delivery<S: Into<String>>(user_id: i64, restaurant_id: i64, address: S) -> Self {
        Self::new(user_id, restaurant_id, OrderType::Delivery).with_delivery_address(address)
    }

    pub fn with_delivery_address<S: Into<String>>(mut self, address: S) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    pub fn with_delivery_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.delivery_notes = notes.into();
        self
    }

    pub fn with_phone_number<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_delivery_fee(mut self, fee: Money) -> Self {
        self.delivery_fee = fee;
        self
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    /// The menu price at the time the item was first added to the order.
    pub unit_price: Money,
    pub special_instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub quantity: i64,
    pub special_instructions: Option<String>,
}

impl NewOrderItem {
    pub fn new(menu_item_id: i64, quantity: i64) -> Self {
        Self { menu_item_id, quantity, special_instructions: None }
    }

    pub fn with_instructions<S: Into<String>>(mut self, instructions: S) -> Self {
        self.special_instructions = Some(instructions.into());
        self
    }
}

//--------------------------------------  OrderStatusHistory   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: i64,
    /// `None` for the entry recorded when the order is created.
    pub previous_status: Option<OrderStatusType>,
    pub new_status: OrderStatusType,
    pub changed_by: Option<i64>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Review         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub order_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: i64,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(rating: i64) -> Self {
        Self { rating, comment: None }
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
