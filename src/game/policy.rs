use crate::db::models::{Account, Character};
use crate::error::{GameError, GameResult};

/// Caller is an administrator or owns the character.
pub fn can_manage(account: &Account, character: &Character) -> bool {
    account.is_admin || character.account_id == account.id
}

pub fn ensure_can_manage(account: &Account, character: &Character) -> GameResult<()> {
    if can_manage(account, character) {
        Ok(())
    } else {
        Err(GameError::forbidden("character belongs to another account"))
    }
}

pub fn ensure_admin(account: &Account) -> GameResult<()> {
    if account.is_admin {
        Ok(())
    } else {
        Err(GameError::forbidden("administrator privilege required"))
    }
}
