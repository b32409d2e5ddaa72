//! Postgres-backed store.
//!
//! Every mutation touching more than one row runs in one transaction at the
//! default READ COMMITTED level. Character-scoped mutations first take a
//! row lock on the character (`FOR UPDATE`), so two requests against the
//! same character are serialized by Postgres.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};

use super::models::{
    Account, Character, Class, ClassPatch, ItemInstance, ItemPatch, ItemTemplate, NewAccount,
    NewClass, Receipt,
};
use super::{reject, GameStore, NewCharacter};
use crate::config::Settings;
use crate::error::{GameError, GameResult};
use crate::game::{rules, types::Stats};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(settings: &Settings, database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;

        Ok(Self::new(pool))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

async fn lock_character(conn: &mut PgConnection, id: i32) -> GameResult<Character> {
    sqlx::query_as::<_, Character>("SELECT * FROM characters WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(reject::character_not_found)
}

async fn set_stats(conn: &mut PgConnection, id: i32, stats: &Stats) -> GameResult<Character> {
    let character = sqlx::query_as::<_, Character>(
        "UPDATE characters
            SET hp = $2, power = $3, speed = $4, cooldown = $5
          WHERE id = $1
      RETURNING *",
    )
    .bind(id)
    .bind(stats.hp)
    .bind(stats.power)
    .bind(stats.speed)
    .bind(stats.cooldown)
    .fetch_one(&mut *conn)
    .await?;
    Ok(character)
}

/// Create a new instance copying the template's payload.
async fn mint(conn: &mut PgConnection, template: &ItemTemplate) -> GameResult<ItemInstance> {
    let instance = sqlx::query_as::<_, ItemInstance>(
        "INSERT INTO item_instances (code, name, hp, power, speed, cooldown, price, class_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      RETURNING *",
    )
    .bind(template.code)
    .bind(&template.name)
    .bind(template.stat.hp)
    .bind(template.stat.power)
    .bind(template.stat.speed)
    .bind(template.stat.cooldown)
    .bind(template.price)
    .bind(template.class_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(instance)
}

#[async_trait]
impl GameStore for PgStore {
    async fn ping(&self) -> GameResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_account(&self, new: NewAccount) -> GameResult<Account> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (external_id, password_hash, display_name, is_admin)
             VALUES ($1, $2, $3, $4)
          RETURNING *",
        )
        .bind(&new.external_id)
        .bind(&new.password_hash)
        .bind(&new.display_name)
        .bind(new.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                reject::account_exists()
            } else {
                e.into()
            }
        })
    }

    async fn account_by_external_id(&self, external_id: &str) -> GameResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn create_class(&self, new: NewClass) -> GameResult<Class> {
        let class = sqlx::query_as::<_, Class>(
            "INSERT INTO classes (name, hp, power, speed, cooldown)
             VALUES ($1, $2, $3, $4, $5)
          RETURNING *",
        )
        .bind(&new.name)
        .bind(new.base.hp)
        .bind(new.base.power)
        .bind(new.base.speed)
        .bind(new.base.cooldown)
        .fetch_one(&self.pool)
        .await?;
        Ok(class)
    }

    async fn list_classes(&self) -> GameResult<Vec<Class>> {
        let rows = sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn class_by_id(&self, id: i32) -> GameResult<Option<Class>> {
        let class = sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(class)
    }

    async fn update_class(&self, id: i32, patch: ClassPatch) -> GameResult<Class> {
        let mut tx = self.pool.begin().await?;

        let mut class =
            sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(reject::class_not_found)?;
        patch.apply(&mut class);

        let class = sqlx::query_as::<_, Class>(
            "UPDATE classes
                SET name = $2, hp = $3, power = $4, speed = $5, cooldown = $6
              WHERE id = $1
          RETURNING *",
        )
        .bind(id)
        .bind(&class.name)
        .bind(class.base.hp)
        .bind(class.base.power)
        .bind(class.base.speed)
        .bind(class.base.cooldown)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(class)
    }

    async fn set_basic_item(&self, class_id: i32, item_code: i32) -> GameResult<Class> {
        let mut tx = self.pool.begin().await?;

        let template_class: i32 =
            sqlx::query_scalar("SELECT class_id FROM item_templates WHERE code = $1")
                .bind(item_code)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(reject::item_not_found)?;

        let class = sqlx::query_as::<_, Class>(
            "UPDATE classes SET basic_item_code = $2 WHERE id = $1 AND $3 = $1 RETURNING *",
        )
        .bind(class_id)
        .bind(item_code)
        .bind(template_class)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(class) = class else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
                    .bind(class_id)
                    .fetch_one(&mut *tx)
                    .await?;
            tx.rollback().await.ok();
            return Err(if exists {
                reject::item_class_mismatch()
            } else {
                reject::class_not_found()
            });
        };

        tx.commit().await?;
        Ok(class)
    }

    async fn create_item(&self, item: ItemTemplate) -> GameResult<ItemTemplate> {
        let mut tx = self.pool.begin().await?;

        let class_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
                .bind(item.class_id)
                .fetch_one(&mut *tx)
                .await?;
        if !class_exists {
            tx.rollback().await.ok();
            return Err(reject::class_not_found());
        }

        let created = sqlx::query_as::<_, ItemTemplate>(
            "INSERT INTO item_templates (code, name, hp, power, speed, cooldown, price, class_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
          RETURNING *",
        )
        .bind(item.code)
        .bind(&item.name)
        .bind(item.stat.hp)
        .bind(item.stat.power)
        .bind(item.stat.speed)
        .bind(item.stat.cooldown)
        .bind(item.price)
        .bind(item.class_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                reject::item_code_taken()
            } else {
                GameError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list_items(&self) -> GameResult<Vec<ItemTemplate>> {
        let rows = sqlx::query_as::<_, ItemTemplate>("SELECT * FROM item_templates ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn item_by_code(&self, code: i32) -> GameResult<Option<ItemTemplate>> {
        let item = sqlx::query_as::<_, ItemTemplate>("SELECT * FROM item_templates WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn update_item(&self, code: i32, patch: ItemPatch) -> GameResult<ItemTemplate> {
        let mut tx = self.pool.begin().await?;

        let mut item = sqlx::query_as::<_, ItemTemplate>(
            "SELECT * FROM item_templates WHERE code = $1 FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(reject::item_not_found)?;
        patch.apply(&mut item);

        let item = sqlx::query_as::<_, ItemTemplate>(
            "UPDATE item_templates
                SET name = $2, hp = $3, power = $4, speed = $5, cooldown = $6, price = $7
              WHERE code = $1
          RETURNING *",
        )
        .bind(code)
        .bind(&item.name)
        .bind(item.stat.hp)
        .bind(item.stat.power)
        .bind(item.stat.speed)
        .bind(item.stat.cooldown)
        .bind(item.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn create_character(&self, new: NewCharacter) -> GameResult<Character> {
        let mut tx = self.pool.begin().await?;

        // Re-read the class under a share lock so it cannot vanish mid-way.
        let class = sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1 FOR SHARE")
            .bind(new.class_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(reject::unknown_class)?;

        let code = class.basic_item_code.ok_or_else(reject::no_basic_item)?;
        let template = sqlx::query_as::<_, ItemTemplate>(
            "SELECT * FROM item_templates WHERE code = $1 FOR SHARE",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(reject::no_basic_item)?;

        let character = sqlx::query_as::<_, Character>(
            "INSERT INTO characters (account_id, class_id, name, hp, power, speed, cooldown, money)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
          RETURNING *",
        )
        .bind(new.account_id)
        .bind(class.id)
        .bind(&new.name)
        .bind(class.base.hp)
        .bind(class.base.power)
        .bind(class.base.speed)
        .bind(class.base.cooldown)
        .bind(new.starting_money)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                reject::name_taken()
            } else {
                GameError::from(e)
            }
        })?;

        let instance = mint(&mut tx, &template).await?;
        sqlx::query("INSERT INTO character_equipment (item_id, character_id) VALUES ($1, $2)")
            .bind(instance.id)
            .bind(character.id)
            .execute(&mut *tx)
            .await?;

        let stats = rules::equip_stats(&character.stats, &instance.stat)?;
        let character = set_stats(&mut tx, character.id, &stats).await?;

        tx.commit().await?;
        Ok(character)
    }

    async fn character_by_id(&self, id: i32) -> GameResult<Option<Character>> {
        let character = sqlx::query_as::<_, Character>("SELECT * FROM characters WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(character)
    }

    async fn delete_character(&self, id: i32) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_character(&mut tx, id).await?;

        // Membership rows cascade from the instances.
        sqlx::query(
            "DELETE FROM item_instances
              WHERE id IN (SELECT item_id FROM character_equipment WHERE character_id = $1
                           UNION
                           SELECT item_id FROM character_inventory WHERE character_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn equipped_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>> {
        let rows = sqlx::query_as::<_, ItemInstance>(
            "SELECT i.*
               FROM item_instances i
               JOIN character_equipment ce ON ce.item_id = i.id
              WHERE ce.character_id = $1
              ORDER BY i.id",
        )
        .bind(character_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn inventory_items(&self, character_id: i32) -> GameResult<Vec<ItemInstance>> {
        let rows = sqlx::query_as::<_, ItemInstance>(
            "SELECT i.*
               FROM item_instances i
               JOIN character_inventory ci ON ci.item_id = i.id
              WHERE ci.character_id = $1
              ORDER BY i.id",
        )
        .bind(character_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn equip(&self, character_id: i32, item_code: i32) -> GameResult<Character> {
        let mut tx = self.pool.begin().await?;
        let character = lock_character(&mut tx, character_id).await?;

        // 1) oldest stored instance with that code
        let instance = sqlx::query_as::<_, ItemInstance>(
            "SELECT i.*
               FROM item_instances i
               JOIN character_inventory ci ON ci.item_id = i.id
              WHERE ci.character_id = $1 AND i.code = $2
              ORDER BY i.id
              LIMIT 1",
        )
        .bind(character_id)
        .bind(item_code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(instance) = instance else {
            let worn: bool = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1
                       FROM character_equipment ce
                       JOIN item_instances i ON i.id = ce.item_id
                      WHERE ce.character_id = $1 AND i.code = $2)",
            )
            .bind(character_id)
            .bind(item_code)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await.ok();
            return Err(if worn {
                reject::already_equipped()
            } else {
                reject::not_in_inventory()
            });
        };

        if instance.class_id != character.class_id {
            tx.rollback().await.ok();
            return Err(reject::item_class_mismatch());
        }
        let stats = rules::equip_stats(&character.stats, &instance.stat)?;

        // 2) inventory → equipped
        sqlx::query("DELETE FROM character_inventory WHERE item_id = $1")
            .bind(instance.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO character_equipment (item_id, character_id) VALUES ($1, $2)")
            .bind(instance.id)
            .bind(character_id)
            .execute(&mut *tx)
            .await?;

        // 3) apply delta
        let character = set_stats(&mut tx, character_id, &stats).await?;

        tx.commit().await?;
        Ok(character)
    }

    async fn unequip(&self, character_id: i32, item_id: i32) -> GameResult<Character> {
        let mut tx = self.pool.begin().await?;
        let character = lock_character(&mut tx, character_id).await?;

        let instance = sqlx::query_as::<_, ItemInstance>(
            "SELECT i.*
               FROM item_instances i
               JOIN character_equipment ce ON ce.item_id = i.id
              WHERE ce.character_id = $1 AND i.id = $2",
        )
        .bind(character_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(reject::not_equipped)?;

        let stats = rules::unequip_stats(&character.stats, &instance.stat)?;

        sqlx::query("DELETE FROM character_equipment WHERE item_id = $1")
            .bind(instance.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO character_inventory (item_id, character_id) VALUES ($1, $2)")
            .bind(instance.id)
            .bind(character_id)
            .execute(&mut *tx)
            .await?;

        let character = set_stats(&mut tx, character_id, &stats).await?;

        tx.commit().await?;
        Ok(character)
    }

    async fn purchase(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt> {
        rules::validate_trade_count(count)?;
        let mut tx = self.pool.begin().await?;
        let character = lock_character(&mut tx, character_id).await?;

        let template = sqlx::query_as::<_, ItemTemplate>(
            "SELECT * FROM item_templates WHERE code = $1 FOR SHARE",
        )
        .bind(item_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(reject::item_not_found)?;

        let cost = rules::purchase_cost(template.price, count)?;
        if cost > character.money {
            tx.rollback().await.ok();
            return Err(reject::insufficient_funds());
        }

        // 1) debit; the guard keeps the balance non-negative regardless
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE characters SET money = money - $1 WHERE id = $2 AND money >= $1 RETURNING money",
        )
        .bind(cost)
        .bind(character_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(balance) = balance else {
            tx.rollback().await.ok();
            return Err(reject::insufficient_funds());
        };

        // 2) mint into inventory
        for _ in 0..count {
            let instance = mint(&mut tx, &template).await?;
            sqlx::query("INSERT INTO character_inventory (item_id, character_id) VALUES ($1, $2)")
                .bind(instance.id)
                .bind(character_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Receipt {
            item_name: template.name,
            count,
            amount: cost,
            balance,
        })
    }

    async fn sell(&self, character_id: i32, item_code: i32, count: i64) -> GameResult<Receipt> {
        rules::validate_trade_count(count)?;
        let mut tx = self.pool.begin().await?;
        let character = lock_character(&mut tx, character_id).await?;

        let selected = sqlx::query_as::<_, ItemInstance>(
            "SELECT i.*
               FROM item_instances i
               JOIN character_inventory ci ON ci.item_id = i.id
              WHERE ci.character_id = $1 AND i.code = $2
              ORDER BY i.id
              LIMIT $3",
        )
        .bind(character_id)
        .bind(item_code)
        .bind(count)
        .fetch_all(&mut *tx)
        .await?;

        if (selected.len() as i64) < count {
            tx.rollback().await.ok();
            return Err(reject::not_enough_items());
        }

        let prices: Vec<i64> = selected.iter().map(|i| i.price).collect();
        let payout = rules::sell_payout(&prices)?;
        character
            .money
            .checked_add(payout)
            .ok_or_else(reject::balance_overflow)?;

        // 1) credit
        let balance: i64 = sqlx::query_scalar(
            "UPDATE characters SET money = money + $1 WHERE id = $2 RETURNING money",
        )
        .bind(payout)
        .bind(character_id)
        .fetch_one(&mut *tx)
        .await?;

        // 2) retire the instances; inventory rows cascade
        let ids: Vec<i32> = selected.iter().map(|i| i.id).collect();
        sqlx::query("DELETE FROM item_instances WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Receipt {
            item_name: selected[0].name.clone(),
            count,
            amount: payout,
            balance,
        })
    }
}
