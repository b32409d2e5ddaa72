use serde::{Deserialize, Serialize};

/// A stat block. Used both for a character's current stats and for the
/// delta an item contributes while equipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Stats {
    pub hp: i32,
    pub power: i32,
    pub speed: i32,
    pub cooldown: i32,
}

impl Stats {
    pub fn new(hp: i32, power: i32, speed: i32, cooldown: i32) -> Self {
        Stats {
            hp,
            power,
            speed,
            cooldown,
        }
    }

    /// Apply an item delta. `None` on overflow.
    pub fn checked_add(&self, delta: &Stats) -> Option<Stats> {
        Some(Stats {
            hp: self.hp.checked_add(delta.hp)?,
            power: self.power.checked_add(delta.power)?,
            speed: self.speed.checked_add(delta.speed)?,
            cooldown: self.cooldown.checked_add(delta.cooldown)?,
        })
    }

    /// Reverse an item delta. `None` on overflow.
    pub fn checked_sub(&self, delta: &Stats) -> Option<Stats> {
        Some(Stats {
            hp: self.hp.checked_sub(delta.hp)?,
            power: self.power.checked_sub(delta.power)?,
            speed: self.speed.checked_sub(delta.speed)?,
            cooldown: self.cooldown.checked_sub(delta.cooldown)?,
        })
    }
}
