//! In-process store for development and the test suite.
//!
//! The whole state sits behind a single async mutex, so every trait call
//! is serialized. Each operation validates everything before its first
//! write, which makes a rejected call leave the state untouched.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::models::{
    Account, Character, Class, ClassPatch, ItemInstance, ItemPatch, ItemTemplate, NewAccount,
    NewClass, Receipt,
};
use super::{reject, GameStore, NewCharacter};
use crate::error::GameResult;
use crate::game::rules;

#[derive(Default)]
struct State {
    accounts: BTreeMap<i32, Account>,
    classes: BTreeMap<i32, Class>,
    items: BTreeMap<i32, ItemTemplate>,
    instances: BTreeMap<i32, ItemInstance>,
    characters: BTreeMap<i32, Character>,
    /// item instance id → character id
    equipped: BTreeMap<i32, i32>,
    /// item instance id → character id
    inventory: BTreeMap<i32, i32>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn character(&self, id: i32) -> GameResult<&Character> {
        self.characters.get(&id).ok_or_else(reject::character_not_found)
    }

    fn mint(&mut self, template: &ItemTemplate) -> ItemInstance {
        let instance = ItemInstance {
            id: self.next_id(),
            code: template.code,
            name: template.name.clone(),
            stat: template.stat,
            price: template.price,
            class_id: template.class_id,
        };
        self.instances.insert(instance.id, instance.clone());
        instance
    }

    /// Instances in `set` owned by the character, oldest first.
    fn owned<'a>(
        &'a self,
        set: &'a BTreeMap<i32, i32>,
        character_id: i32,
    ) -> impl Iterator<Item = &'a ItemInstance> + 'a {
        set.iter()
            .filter(move |(_, owner)| **owner == character_id)
            .filter_map(move |(item_id, _)| self.instances.get(item_id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn ping(&self) -> GameResult<()> {
        Ok(())
    }

    async fn create_account(&self, new: NewAccount) -> GameResult<Account> {
        let mut state = self.state.lock().await;
        if state
            .accounts
            .values()
            .any(|a| a.external_id == new.external_id)
        {
            return Err(reject::account_exists());
        }
        let account = Account {
            id: state.next_id(),
            external_id: new.external_id,
            password_hash: new.password_hash,
            display_name: new.display_name,
            is_admin: new.is_admin,
            created_at: Utc::now(),
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn account_by_external_id(&self, external_id: &str) -> GameResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.external_id == external_id)
            .cloned())
    }

    async fn create_class(&self, new: NewClass) -> GameResult<Class> {
        let mut state = self.state.lock().await;
        let class = Class {
            id: state.next_id(),
            name: new.name,
            base: new.base,
            basic_item_code: None,
        };
        state.classes.insert(class.id, class.clone());
        Ok(class)
    }

    async fn list_classes(&self) -> GameResult<Vec<Class>> {
        let state = self.state.lock().await;
        Ok(state.classes.values().cloned().collect())
    }

    async fn class_by_id(&self, id: i32) -> GameResult<Option<Class>> {
        let state = self.state.lock().await;
        Ok(state.classes.get(&id).cloned())
    }

    async fn update_class(&self, id: i32, patch: ClassPatch) -> GameResult<Class> {
        let mut state = self.state.lock().await;
        let class = state
            .classes
            .get_mut(&id)
            .ok_or_else(reject::class_not_found)?;
        patch.apply(class);
        Ok(class.clone())
    }

    async fn set_basic_item(&self, class_id: i32, item_code: i32) -> GameResult<Class> {
        let mut state = self.state.lock().await;
        let template_class = state
            .items
            .get(&item_code)
            .map(|t| t.class_id)
            .ok_or_else(reject::item_not_found)?;
        let class = state
            .classes
            .get_mut(&class_id)
            .ok_or_else(reject::class_not_found)?;
        if template_class != class_id {
            return Err(reject::item_class_mismatch());
        }
        class.basic_item_code = Some(item_code);
        Ok(class.clone())
    }

    async fn create_item(&self, item: ItemTemplate) -> GameResult<ItemTemplate> {
        let mut state = self.state.lock().await;
        if !state.classes.contains_key(&item.class_id) {
            return Err(reject::class_not_found());
        }
        if state.items.contains_key(&item.code) {
            return Err(reject::item_code_taken());
        }
        state.items.insert(item.code, item.clone());
        Ok(item)
    }

    async fn list_items(&self) -> GameResult<Vec<ItemTemplate>> {
        let state = self.state.lock().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn item_by_code(&self, code: i32) -> GameResult<Option<ItemTemplate>> {
        let state = self.state.lock().await;
        Ok(state.items.get(&code).cloned())
    }

    async fn update_item(&self, code: i32, patch: ItemPatch) -> GameResult<ItemTemplate> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .get_mut(&code)
            .ok_or_else(reject::item_not_found)?;
        patch.apply(item);
        Ok(item.clone())
    }

    async fn create_character(&self, new: NewCharacter) -> GameResult<Character> {
        let mut state = self.state.lock().await;
        if state.characters.values().any(|c| c.name == new.name) {
            return Err(reject::name_taken());
        }
        let class = state
            .classes
            .get(&new.class_id)
            .cloned()
            .ok_or_else(reject::unknown_class)?;
        let template = class
            .basic_item_code
            .and_then(|code| state.items.get(&code))
            .cloned()
            .ok_or_else(reject::no_basic_item)?;
        let stats = rules::equip_stats(&class.base, &template.stat)?;

        let character = Character {
            id: state.next_id(),
            account_id: new.account_id,
            class_id: class.id,
            name: new.name,
            stats,
            money: new.starting_money,
        };
        let instance = state.mint(&template);
        state.equipped.insert(instance.id, character.id);
        state.characters.insert(character.id, character.clone());
        Ok(character)
    }

    async fn character_by_id(&self, id: i32) -> GameResult<Option<Character>> {
        let state = self.state.lock().await;
        Ok(state.characters.get(&id).cloned())
    }

    async fn delete_character(&self, id: i32) -> GameResult<()> {
        let mut state = self.state.lock().await;
        state.character(id)?;
        let owned: Vec<i32> = state
            .equipped
            .iter()
            .chain(state.inventory.iter())
            .filter(|(_, owner)| **owner == id)
            .map(|(item_id, _)| *item_id)
            .collect();
        for item_id in owned {
            state.equipped.remove(&item_id);
            state.inventory.remove(&item_id);
            state.instances.remove(&item_id);
        }
        state.characters.remove(&id);
        Ok(())
    }

    async fn equipped_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>> {
        let state = self.state.lock().await;
        Ok(state
            .owned(&state.equipped, character_id)
            .cloned()
            .collect())
    }

    async fn inventory_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>> {
        let state = self.state.lock().await;
        Ok(state
            .owned(&state.inventory, character_id)
            .cloned()
            .collect())
    }

    async fn equip(&self, character_id: i32, item_code: i32) -> GameResult<Character> {
        let mut state = self.state.lock().await;
        let character = state.character(character_id)?.clone();

        let candidate = state
            .owned(&state.inventory, character_id)
            .find(|i| i.code == item_code)
            .cloned();
        let Some(instance) = candidate else {
            let worn = state
                .owned(&state.equipped, character_id)
                .any(|i| i.code == item_code);
            return Err(if worn {
                reject::already_equipped()
            } else {
                reject::not_in_inventory()
            });
        };
        if instance.class_id != character.class_id {
            return Err(reject::item_class_mismatch());
        }
        let stats = rules::equip_stats(&character.stats, &instance.stat)?;

        state.inventory.remove(&instance.id);
        state.equipped.insert(instance.id, character_id);
        let character = state
            .characters
            .get_mut(&character_id)
            .ok_or_else(reject::character_not_found)?;
        character.stats = stats;
        Ok(character.clone())
    }

    async fn unequip(&self, character_id: i32, item_id: i32) -> GameResult<Character> {
        let mut state = self.state.lock().await;
        let character = state.character(character_id)?.clone();

        if state.equipped.get(&item_id) != Some(&character_id) {
            return Err(reject::not_equipped());
        }
        let delta = state
            .instances
            .get(&item_id)
            .map(|i| i.stat)
            .ok_or_else(reject::not_equipped)?;
        let stats = rules::unequip_stats(&character.stats, &delta)?;

        state.equipped.remove(&item_id);
        state.inventory.insert(item_id, character_id);
        let character = state
            .characters
            .get_mut(&character_id)
            .ok_or_else(reject::character_not_found)?;
        character.stats = stats;
        Ok(character.clone())
    }

    async fn purchase(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt> {
        rules::validate_trade_count(count)?;
        let mut state = self.state.lock().await;
        let money = state.character(character_id)?.money;
        let template = state
            .items
            .get(&item_code)
            .cloned()
            .ok_or_else(reject::item_not_found)?;
        let cost = rules::purchase_cost(template.price, count)?;
        if cost > money {
            return Err(reject::insufficient_funds());
        }

        for _ in 0..count {
            let instance = state.mint(&template);
            state.inventory.insert(instance.id, character_id);
        }
        let character = state
            .characters
            .get_mut(&character_id)
            .ok_or_else(reject::character_not_found)?;
        character.money -= cost;
        Ok(Receipt {
            item_name: template.name,
            count,
            amount: cost,
            balance: character.money,
        })
    }

    async fn sell(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt> {
        rules::validate_trade_count(count)?;
        let mut state = self.state.lock().await;
        let money = state.character(character_id)?.money;
        let selected: Vec<ItemInstance> = state
            .owned(&state.inventory, character_id)
            .filter(|i| i.code == item_code)
            .take(count as usize)
            .cloned()
            .collect();
        if (selected.len() as i64) < count {
            return Err(reject::not_enough_items());
        }
        let prices: Vec<i64> = selected.iter().map(|i| i.price).collect();
        let payout = rules::sell_payout(&prices)?;
        let balance = money
            .checked_add(payout)
            .ok_or_else(reject::balance_overflow)?;

        for instance in &selected {
            state.inventory.remove(&instance.id);
            state.instances.remove(&instance.id);
        }
        let character = state
            .characters
            .get_mut(&character_id)
            .ok_or_else(reject::character_not_found)?;
        character.money = balance;
        Ok(Receipt {
            item_name: selected[0].name.clone(),
            count,
            amount: payout,
            balance,
        })
    }
}
