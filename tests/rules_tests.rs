//! Unit tests for validation, pricing and stat helpers.

use rpg_server::error::GameError;
use rpg_server::game::{rules, types::Stats};

#[test]
fn external_id_must_be_lowercase_alphanumeric() {
    assert!(rules::validate_external_id("abc123").is_ok());
    assert!(rules::validate_external_id("Abc123").is_err());
    assert!(rules::validate_external_id("abc_123").is_err());
    assert!(rules::validate_external_id("").is_err());
}

#[test]
fn password_checks_charset_length_and_confirmation() {
    assert!(rules::validate_password("pass12", "pass12").is_ok());
    assert!(rules::validate_password("pas12", "pas12").is_err());
    assert!(rules::validate_password("PASS12", "PASS12").is_err());
    assert!(matches!(
        rules::validate_password("pass12", "pass13"),
        Err(GameError::BadRequest(_))
    ));
}

#[test]
fn character_name_is_trimmed_and_bounded() {
    assert_eq!(rules::validate_character_name("  Hero ").unwrap(), "Hero");
    assert!(rules::validate_character_name("   ").is_err());
    assert!(rules::validate_character_name("abcdefghijklmno").is_ok());
    assert!(rules::validate_character_name("abcdefghijklmnop").is_err());
    // counted in characters, not bytes
    assert!(rules::validate_character_name("용사용사용사용사용사용사용사용").is_ok());
}

#[test]
fn trade_count_bounds() {
    assert!(rules::validate_trade_count(0).is_err());
    assert!(rules::validate_trade_count(-3).is_err());
    assert!(rules::validate_trade_count(1).is_ok());
    assert!(rules::validate_trade_count(rules::MAX_TRADE_COUNT).is_ok());
    assert!(rules::validate_trade_count(rules::MAX_TRADE_COUNT + 1).is_err());
}

#[test]
fn sell_payout_is_sixty_percent_rounded_down() {
    assert_eq!(rules::sell_payout(&[500, 500]).unwrap(), 600);
    assert_eq!(rules::sell_payout(&[7]).unwrap(), 4);
    assert_eq!(rules::sell_payout(&[5, 5, 5]).unwrap(), 9);
    assert_eq!(rules::sell_payout(&[0]).unwrap(), 0);
}

#[test]
fn purchase_cost_overflow_is_rejected() {
    assert_eq!(rules::purchase_cost(250, 4).unwrap(), 1000);
    assert!(rules::purchase_cost(i64::MAX, 2).is_err());
}

#[test]
fn equip_then_unequip_restores_stats() {
    let base = Stats::new(100, 10, 5, 3);
    let delta = Stats::new(15, 2, -1, 0);
    let worn = rules::equip_stats(&base, &delta).unwrap();
    assert_eq!(worn, Stats::new(115, 12, 4, 3));
    assert_eq!(rules::unequip_stats(&worn, &delta).unwrap(), base);
}

#[test]
fn stat_overflow_is_rejected() {
    let base = Stats::new(i32::MAX, 0, 0, 0);
    assert!(rules::equip_stats(&base, &Stats::new(1, 0, 0, 0)).is_err());
}

#[test]
fn trade_count_limit_is_reported_per_request() {
    let err = rules::validate_trade_count(rules::MAX_TRADE_COUNT + 1).unwrap_err();
    assert!(err.to_string().contains("per request"), "{err}");
}

#[test]
fn optional_names_reject_blank_but_allow_absent() {
    assert_eq!(rules::optional_name("itemName", None).unwrap(), None);
    assert_eq!(
        rules::optional_name("itemName", Some(" helm ".into())).unwrap(),
        Some("helm".to_string())
    );
    let err = rules::optional_name("itemName", Some("   ".into())).unwrap_err();
    assert!(matches!(err, GameError::BadRequest(_)));
    assert!(err.to_string().contains("itemName"));
}
