//! Character creation, detail and deletion.

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Settings;
use crate::db::models::Character;
use crate::db::{GameStore, NewCharacter};
use crate::error::{GameError, GameResult};
use crate::game::{policy, rules};
use crate::http::auth::AuthAccount;

//////////////////////////////////////////////////
// Data transfer objects
//////////////////////////////////////////////////

/// Post-mutation stat snapshot returned by every character-mutating route.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterView {
    pub character_id: i32,
    pub name: String,
    pub hp: i32,
    pub power: i32,
    pub speed: i32,
    pub cooldown: i32,
    pub money: i64,
}

impl From<Character> for CharacterView {
    fn from(c: Character) -> Self {
        CharacterView {
            character_id: c.id,
            name: c.name,
            hp: c.stats.hp,
            power: c.stats.power,
            speed: c.stats.speed,
            cooldown: c.stats.cooldown,
            money: c.money,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetail {
    pub character_id: i32,
    pub name: String,
    pub class_id: i32,
    pub class_name: Option<String>,
    pub hp: i32,
    pub power: i32,
    pub speed: i32,
    pub cooldown: i32,
    /// Only disclosed to the owner or an administrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReq {
    #[serde(alias = "characterName")]
    pub display_name: Option<String>,
    pub class_id: Option<i32>,
}

/// Load a character and check the caller may act on it.
pub(crate) async fn managed_character(
    store: &dyn GameStore,
    auth: &AuthAccount,
    id: i32,
) -> GameResult<Character> {
    let character = store
        .character_by_id(id)
        .await?
        .ok_or_else(|| GameError::not_found("character does not exist"))?;
    policy::ensure_can_manage(&auth.0, &character)?;
    Ok(character)
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// POST /api/characters
#[post("/characters")]
pub async fn create(
    auth: AuthAccount,
    info: web::Json<CreateReq>,
    store: web::Data<dyn GameStore>,
    settings: web::Data<Settings>,
) -> GameResult<HttpResponse> {
    let info = info.into_inner();
    let (Some(name), Some(class_id)) = (info.display_name, info.class_id) else {
        return Err(GameError::bad_request("displayName and classId are required"));
    };
    let name = rules::validate_character_name(&name)?;

    let character = store
        .create_character(NewCharacter {
            account_id: auth.0.id,
            class_id,
            name: name.to_string(),
            starting_money: settings.starting_money,
        })
        .await?;

    log::info!(
        "character {} ({}) created by {}",
        character.id,
        character.name,
        auth.0.external_id
    );
    Ok(HttpResponse::Created().json(CharacterView::from(character)))
}

/// GET /api/characters/{id}
#[get("/characters/{id}")]
pub async fn detail(
    auth: Option<AuthAccount>,
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let id = path.into_inner();
    let character = store
        .character_by_id(id)
        .await?
        .ok_or_else(|| GameError::not_found("character does not exist"))?;
    let class_name = store
        .class_by_id(character.class_id)
        .await?
        .map(|c| c.name);

    let show_money = auth
        .as_ref()
        .is_some_and(|a| policy::can_manage(&a.0, &character));

    Ok(HttpResponse::Ok().json(CharacterDetail {
        character_id: character.id,
        class_id: character.class_id,
        class_name,
        hp: character.stats.hp,
        power: character.stats.power,
        speed: character.stats.speed,
        cooldown: character.stats.cooldown,
        money: show_money.then_some(character.money),
        name: character.name,
    }))
}

/// DELETE /api/characters/{id}
#[delete("/characters/{id}")]
pub async fn remove(
    auth: AuthAccount,
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let character = managed_character(store.get_ref(), &auth, path.into_inner()).await?;
    store.delete_character(character.id).await?;

    log::info!(
        "character {} ({}) deleted by {}",
        character.id,
        character.name,
        auth.0.external_id
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("character {} deleted", character.name)
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create).service(detail).service(remove);
}
