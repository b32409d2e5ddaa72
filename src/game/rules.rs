//! Validation and pricing rules shared by every store backend.

use crate::error::{GameError, GameResult};
use crate::game::types::Stats;

pub const MAX_CHARACTER_NAME_LEN: usize = 15;
pub const MIN_PASSWORD_LEN: usize = 6;
/// Upper bound on items bought or sold in a single request.
pub const MAX_TRADE_COUNT: i64 = 100;

/// Sell-back rate, as a fraction (6/10).
const SELL_RATE_NUM: i64 = 6;
const SELL_RATE_DEN: i64 = 10;

fn is_lower_alnum(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

pub fn validate_external_id(external_id: &str) -> GameResult<()> {
    if !is_lower_alnum(external_id) {
        return Err(GameError::bad_request(
            "id must consist of lowercase letters and digits only",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, confirmation: &str) -> GameResult<()> {
    if !is_lower_alnum(password) {
        return Err(GameError::bad_request(
            "password must consist of lowercase letters and digits only",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GameError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != confirmation {
        return Err(GameError::bad_request("password confirmation does not match"));
    }
    Ok(())
}

/// Returns the trimmed name.
pub fn validate_character_name(name: &str) -> GameResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::bad_request("character name must not be empty"));
    }
    if name.chars().count() > MAX_CHARACTER_NAME_LEN {
        return Err(GameError::bad_request(format!(
            "character name must be at most {MAX_CHARACTER_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Catalog names in partial updates: absent is fine, blank is not.
pub fn optional_name(field: &str, name: Option<String>) -> GameResult<Option<String>> {
    match name {
        Some(n) if n.trim().is_empty() => {
            Err(GameError::bad_request(format!("{field} must not be empty")))
        }
        Some(n) => Ok(Some(n.trim().to_string())),
        None => Ok(None),
    }
}

pub fn validate_trade_count(count: i64) -> GameResult<()> {
    if !(1..=MAX_TRADE_COUNT).contains(&count) {
        return Err(GameError::bad_request(format!(
            "count must be between 1 and {MAX_TRADE_COUNT} per request; split larger trades"
        )));
    }
    Ok(())
}

/// `price × count`.
pub fn purchase_cost(price: i64, count: i64) -> GameResult<i64> {
    price
        .checked_mul(count)
        .ok_or_else(|| GameError::bad_request("purchase total is out of range"))
}

/// 60 % of the summed unit prices, rounded down. With a uniform price this
/// is `floor(price × count × 0.6)`.
pub fn sell_payout(unit_prices: &[i64]) -> GameResult<i64> {
    unit_prices
        .iter()
        .try_fold(0i64, |acc, p| acc.checked_add(*p))
        .and_then(|total| total.checked_mul(SELL_RATE_NUM))
        .map(|scaled| scaled.div_euclid(SELL_RATE_DEN))
        .ok_or_else(|| GameError::bad_request("sell total is out of range"))
}

pub fn equip_stats(current: &Stats, delta: &Stats) -> GameResult<Stats> {
    current
        .checked_add(delta)
        .ok_or_else(|| GameError::bad_request("stat overflow"))
}

pub fn unequip_stats(current: &Stats, delta: &Stats) -> GameResult<Stats> {
    current
        .checked_sub(delta)
        .ok_or_else(|| GameError::bad_request("stat overflow"))
}
