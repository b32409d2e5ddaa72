//! Equipped-set and inventory endpoints.

use actix_web::{get, patch, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::models::ItemInstance;
use crate::db::GameStore;
use crate::error::{GameError, GameResult};
use crate::http::auth::AuthAccount;
use crate::http::characters::{managed_character, CharacterView};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    item_id: i32,
    item_code: i32,
    item_name: String,
}

impl From<ItemInstance> for InventoryEntry {
    fn from(i: ItemInstance) -> Self {
        InventoryEntry {
            item_id: i.id,
            item_code: i.code,
            item_name: i.name,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipReq {
    pub item_code: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnequipReq {
    pub item_id: Option<i32>,
}

/// PATCH /api/characters/equip/{id}
#[patch("/characters/equip/{id}")]
pub async fn equip(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<EquipReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let code = info
        .item_code
        .ok_or_else(|| GameError::bad_request("itemCode is required"))?;
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;

    let updated = store.equip(character.id, code).await?;
    log::info!("character {} equipped item code {code}", updated.id);
    Ok(HttpResponse::Created().json(CharacterView::from(updated)))
}

/// PATCH /api/characters/unEquip/{id}
#[patch("/characters/unEquip/{id}")]
pub async fn unequip(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<UnequipReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let item_id = info
        .item_id
        .ok_or_else(|| GameError::bad_request("itemId is required"))?;
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;

    let updated = store.unequip(character.id, item_id).await?;
    log::info!("character {} unequipped item {item_id}", updated.id);
    Ok(HttpResponse::Created().json(CharacterView::from(updated)))
}

/// GET /api/charactersItem/{id}
#[get("/charactersItem/{id}")]
pub async fn equipped(
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let id = path.into_inner();
    if store.character_by_id(id).await?.is_none() {
        return Err(GameError::not_found("character does not exist"));
    }

    let out: Vec<InventoryEntry> = store
        .equipped_items(id)
        .await?
        .into_iter()
        .map(InventoryEntry::from)
        .collect();
    Ok(HttpResponse::Ok().json(out))
}

/// GET /api/charactersInventory/{id}
#[get("/charactersInventory/{id}")]
pub async fn inventory(
    auth: AuthAccount,
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;

    let out: Vec<InventoryEntry> = store
        .inventory_items(character.id)
        .await?
        .into_iter()
        .map(InventoryEntry::from)
        .collect();
    Ok(HttpResponse::Ok().json(out))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(equip)
        .service(unequip)
        .service(equipped)
        .service(inventory);
}
