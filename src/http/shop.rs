use actix_web::{delete, patch, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::models::Receipt;
use crate::db::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::rules;
use crate::http::auth::AuthAccount;
use crate::http::characters::managed_character;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReq {
    pub item_code: Option<i32>,
    pub count: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub message: String,
    pub item_name: String,
    pub count: i64,
    pub amount: i64,
    pub money: i64,
}

impl TradeReq {
    fn validated(&self) -> GameResult<(i32, i64)> {
        let (Some(code), Some(count)) = (self.item_code, self.count) else {
            return Err(GameError::bad_request("itemCode and count are required"));
        };
        rules::validate_trade_count(count)?;
        Ok((code, count))
    }
}

fn response(verb: &str, receipt: Receipt) -> TradeResponse {
    TradeResponse {
        message: format!(
            "{verb} {} x{}; balance is now {}",
            receipt.item_name, receipt.count, receipt.balance
        ),
        item_name: receipt.item_name,
        count: receipt.count,
        amount: receipt.amount,
        money: receipt.balance,
    }
}

/// PATCH /api/shop/purchase/{character_id}
#[patch("/shop/purchase/{character_id}")]
pub async fn purchase(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<TradeReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let (code, count) = info.validated()?;
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;

    // Cheap pre-check; the store re-checks under its lock.
    let template = store
        .item_by_code(code)
        .await?
        .ok_or_else(|| GameError::not_found("item does not exist"))?;
    if rules::purchase_cost(template.price, count)? > character.money {
        return Err(GameError::bad_request("not enough money"));
    }

    let receipt = store.purchase(character.id, code, count).await?;
    log::info!(
        "character {} bought {}x{} for {}",
        character.id,
        receipt.item_name,
        count,
        receipt.amount
    );
    Ok(HttpResponse::Created().json(response("purchased", receipt)))
}

/// DELETE /api/shop/sell/{character_id}
#[delete("/shop/sell/{character_id}")]
pub async fn sell(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<TradeReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let (code, count) = info.validated()?;
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;

    let receipt = store.sell(character.id, code, count).await?;
    log::info!(
        "character {} sold {}x{} for {}",
        character.id,
        receipt.item_name,
        count,
        receipt.amount
    );
    Ok(HttpResponse::Created().json(response("sold", receipt)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(purchase).service(sell);
}
