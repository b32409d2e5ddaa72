//! Persistence seam: every read and every atomic unit of work the HTTP layer
//! needs, behind one trait so Postgres and the in-memory store are
//! interchangeable.

pub mod memory_store;
pub mod models;
pub mod pg_store;

use async_trait::async_trait;

use crate::error::GameResult;
use models::{
    Account, Character, Class, ClassPatch, ItemInstance, ItemPatch, ItemTemplate, NewAccount,
    NewClass, Receipt,
};

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;

#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub account_id: i32,
    pub class_id: i32,
    /// Already trimmed and length-checked.
    pub name: String,
    pub starting_money: i64,
}

/// Each method is atomic: it either applies completely or leaves the store
/// untouched.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn ping(&self) -> GameResult<()>;

    // accounts
    async fn create_account(&self, new: NewAccount) -> GameResult<Account>;
    async fn account_by_external_id(&self, external_id: &str) -> GameResult<Option<Account>>;

    // class catalog
    async fn create_class(&self, new: NewClass) -> GameResult<Class>;
    async fn list_classes(&self) -> GameResult<Vec<Class>>;
    async fn class_by_id(&self, id: i32) -> GameResult<Option<Class>>;
    async fn update_class(&self, id: i32, patch: ClassPatch) -> GameResult<Class>;
    /// The template must belong to the class.
    async fn set_basic_item(&self, class_id: i32, item_code: i32) -> GameResult<Class>;

    // item catalog
    async fn create_item(&self, item: ItemTemplate) -> GameResult<ItemTemplate>;
    async fn list_items(&self) -> GameResult<Vec<ItemTemplate>>;
    async fn item_by_code(&self, code: i32) -> GameResult<Option<ItemTemplate>>;
    /// Only the template changes; minted instances keep their copies.
    async fn update_item(&self, code: i32, patch: ItemPatch) -> GameResult<ItemTemplate>;

    // character ledger
    /// Inserts the character, mints the class' basic item and equips it.
    async fn create_character(&self, new: NewCharacter) -> GameResult<Character>;
    async fn character_by_id(&self, id: i32) -> GameResult<Option<Character>>;
    /// Removes the character together with every item instance it owns.
    async fn delete_character(&self, id: i32) -> GameResult<()>;
    async fn equipped_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>>;
    async fn inventory_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>>;

    // equipment
    /// Moves the oldest inventory instance with `item_code` into the
    /// equipped set and applies its delta.
    async fn equip(&self, character_id: i32, item_code: i32) -> GameResult<Character>;
    /// Moves an equipped instance back to inventory and reverses its delta.
    async fn unequip(&self, character_id: i32, item_id: i32) -> GameResult<Character>;

    // shop
    async fn purchase(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt>;
    async fn sell(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt>;
}

/// Rejections both backends report identically.
pub(crate) mod reject {
    use crate::error::GameError;

    pub fn account_exists() -> GameError {
        GameError::bad_request("id already exists")
    }

    pub fn class_not_found() -> GameError {
        GameError::not_found("class does not exist")
    }

    /// Character creation reports a missing class as invalid input.
    pub fn unknown_class() -> GameError {
        GameError::bad_request("class does not exist")
    }

    pub fn no_basic_item() -> GameError {
        GameError::bad_request("class has no basic item configured")
    }

    pub fn name_taken() -> GameError {
        GameError::bad_request("character name already taken")
    }

    pub fn character_not_found() -> GameError {
        GameError::not_found("character does not exist")
    }

    pub fn item_not_found() -> GameError {
        GameError::not_found("item does not exist")
    }

    pub fn item_code_taken() -> GameError {
        GameError::bad_request("item code already exists")
    }

    pub fn item_class_mismatch() -> GameError {
        GameError::bad_request("item does not belong to this class")
    }

    pub fn not_in_inventory() -> GameError {
        GameError::not_found("no such item in inventory")
    }

    pub fn already_equipped() -> GameError {
        GameError::bad_request("item is already equipped")
    }

    pub fn not_equipped() -> GameError {
        GameError::not_found("item is not equipped")
    }

    pub fn insufficient_funds() -> GameError {
        GameError::bad_request("not enough money")
    }

    pub fn not_enough_items() -> GameError {
        GameError::bad_request("not enough items in inventory")
    }

    pub fn balance_overflow() -> GameError {
        GameError::bad_request("balance is out of range")
    }
}
