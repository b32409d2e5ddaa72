use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::game::types::Stats;

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i32,
    pub external_id: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub external_id: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_admin: bool,
}

/// Character archetype: base stats plus the item every new character of
/// this class starts with equipped.
#[derive(Debug, Clone, FromRow)]
pub struct Class {
    pub id: i32,
    pub name: String,
    #[sqlx(flatten)]
    pub base: Stats,
    pub basic_item_code: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub base: Stats,
}

#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub hp: Option<i32>,
    pub power: Option<i32>,
    pub speed: Option<i32>,
    pub cooldown: Option<i32>,
}

impl ClassPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.hp.is_none()
            && self.power.is_none()
            && self.speed.is_none()
            && self.cooldown.is_none()
    }

    pub fn apply(&self, class: &mut Class) {
        if let Some(name) = &self.name {
            class.name = name.clone();
        }
        if let Some(hp) = self.hp {
            class.base.hp = hp;
        }
        if let Some(power) = self.power {
            class.base.power = power;
        }
        if let Some(speed) = self.speed {
            class.base.speed = speed;
        }
        if let Some(cooldown) = self.cooldown {
            class.base.cooldown = cooldown;
        }
    }
}

/// Catalog definition an item instance is minted from.
#[derive(Debug, Clone, FromRow)]
pub struct ItemTemplate {
    pub code: i32,
    pub name: String,
    #[sqlx(flatten)]
    pub stat: Stats,
    pub price: i64,
    pub class_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub stat: Option<Stats>,
    pub price: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.stat.is_none() && self.price.is_none()
    }

    pub fn apply(&self, item: &mut ItemTemplate) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(stat) = self.stat {
            item.stat = stat;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
    }
}

/// One ownable unit. Its stat payload is copied from the template at mint
/// time and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ItemInstance {
    pub id: i32,
    pub code: i32,
    pub name: String,
    #[sqlx(flatten)]
    pub stat: Stats,
    pub price: i64,
    pub class_id: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct Character {
    pub id: i32,
    pub account_id: i32,
    pub class_id: i32,
    pub name: String,
    #[sqlx(flatten)]
    pub stats: Stats,
    pub money: i64,
}

/// Result of a purchase or sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub item_name: String,
    pub count: i64,
    /// Money moved by the trade (debited on purchase, credited on sale).
    pub amount: i64,
    pub balance: i64,
}
