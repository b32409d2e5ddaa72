//! Item catalog.

use actix_web::{get, patch, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::models::{ItemPatch, ItemTemplate};
use crate::db::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::{policy, rules, types::Stats};
use crate::http::auth::AuthAccount;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    item_code: i32,
    item_name: String,
    item_price: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemRow {
    item_code: i32,
    item_name: String,
    item_stat: Stats,
    item_price: i64,
    class_id: i32,
}

impl From<ItemTemplate> for ItemRow {
    fn from(t: ItemTemplate) -> Self {
        ItemRow {
            item_code: t.code,
            item_name: t.name,
            item_stat: t.stat,
            item_price: t.price,
            class_id: t.class_id,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReq {
    pub item_code: Option<i32>,
    pub item_name: Option<String>,
    pub item_stat: Option<Stats>,
    pub item_price: Option<i64>,
    pub class_id: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReq {
    pub item_name: Option<String>,
    pub item_stat: Option<Stats>,
    pub item_price: Option<i64>,
}

fn check_price(price: Option<i64>) -> GameResult<()> {
    match price {
        Some(p) if p < 0 => Err(GameError::bad_request("itemPrice must not be negative")),
        _ => Ok(()),
    }
}

/// POST /api/items
#[post("/items")]
pub async fn create(
    auth: AuthAccount,
    info: web::Json<CreateReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    policy::ensure_admin(&auth.0)?;
    let info = info.into_inner();
    let (Some(code), Some(name), Some(stat), Some(price), Some(class_id)) = (
        info.item_code,
        info.item_name.filter(|n| !n.trim().is_empty()),
        info.item_stat,
        info.item_price,
        info.class_id,
    ) else {
        return Err(GameError::bad_request(
            "itemCode, itemName, itemStat, itemPrice and classId are required",
        ));
    };
    check_price(Some(price))?;

    let item = store
        .create_item(ItemTemplate {
            code,
            name: name.trim().to_string(),
            stat,
            price,
            class_id,
        })
        .await?;

    log::info!("item {} ({}) created", item.code, item.name);
    Ok(HttpResponse::Created().json(ItemRow::from(item)))
}

/// GET /api/items
#[get("/items")]
pub async fn list(store: web::Data<dyn GameStore>) -> GameResult<HttpResponse> {
    let out: Vec<ItemSummary> = store
        .list_items()
        .await?
        .into_iter()
        .map(|t| ItemSummary {
            item_code: t.code,
            item_name: t.name,
            item_price: t.price,
        })
        .collect();
    Ok(HttpResponse::Ok().json(out))
}

/// GET /api/items/{code}
#[get("/items/{code}")]
pub async fn detail(
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let item = store
        .item_by_code(path.into_inner())
        .await?
        .ok_or_else(|| GameError::not_found("item does not exist"))?;
    Ok(HttpResponse::Ok().json(ItemRow::from(item)))
}

/// PATCH /api/items/{code}
#[patch("/items/{code}")]
pub async fn update(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<UpdateReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    policy::ensure_admin(&auth.0)?;
    let info = info.into_inner();
    check_price(info.item_price)?;
    let patch = ItemPatch {
        name: rules::optional_name("itemName", info.item_name)?,
        stat: info.item_stat,
        price: info.item_price,
    };
    if patch.is_empty() {
        return Err(GameError::bad_request("nothing to update"));
    }

    let item = store.update_item(path.into_inner(), patch).await?;
    log::info!("item {} updated", item.code);
    Ok(HttpResponse::Ok().json(ItemRow::from(item)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(list)
        .service(detail)
        .service(update);
}
