//! Class catalog (admin-managed) and per-class basic item.

use actix_web::{get, patch, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::models::{Class, ClassPatch, NewClass};
use crate::db::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::{policy, rules, types::Stats};
use crate::http::auth::AuthAccount;

/// Applied when a class is created without `classCoolDown`.
pub const DEFAULT_CLASS_COOLDOWN: i32 = 0;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_id: i32,
    pub class_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRow {
    pub class_id: i32,
    pub class_name: String,
    pub class_hp: i32,
    pub class_power: i32,
    pub class_speed: i32,
    #[serde(rename = "classCoolDown")]
    pub class_cooldown: i32,
    pub basic_item_code: Option<i32>,
}

impl From<Class> for ClassRow {
    fn from(c: Class) -> Self {
        ClassRow {
            class_id: c.id,
            class_name: c.name,
            class_hp: c.base.hp,
            class_power: c.base.power,
            class_speed: c.base.speed,
            class_cooldown: c.base.cooldown,
            basic_item_code: c.basic_item_code,
        }
    }
}

/// Body of both create and edit; create requires all but the cooldown.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReq {
    pub class_name: Option<String>,
    pub class_hp: Option<i32>,
    pub class_power: Option<i32>,
    pub class_speed: Option<i32>,
    #[serde(rename = "classCoolDown", alias = "classCooldown")]
    pub class_cooldown: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicItemReq {
    pub class_id: Option<i32>,
    pub item_code: Option<i32>,
}

/// POST /api/classes
#[post("/classes")]
pub async fn create(
    auth: AuthAccount,
    info: web::Json<ClassReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    policy::ensure_admin(&auth.0)?;
    let info = info.into_inner();
    let (Some(name), Some(hp), Some(power), Some(speed)) = (
        rules::optional_name("className", info.class_name)?,
        info.class_hp,
        info.class_power,
        info.class_speed,
    ) else {
        return Err(GameError::bad_request(
            "className, classHp, classPower and classSpeed are required",
        ));
    };
    let cooldown = info.class_cooldown.unwrap_or(DEFAULT_CLASS_COOLDOWN);

    let class = store
        .create_class(NewClass {
            name,
            base: Stats::new(hp, power, speed, cooldown),
        })
        .await?;

    log::info!("class {} ({}) created", class.id, class.name);
    Ok(HttpResponse::Created().json(ClassRow::from(class)))
}

/// GET /api/classes
#[get("/classes")]
pub async fn list(store: web::Data<dyn GameStore>) -> GameResult<HttpResponse> {
    let out: Vec<ClassSummary> = store
        .list_classes()
        .await?
        .into_iter()
        .map(|c| ClassSummary {
            class_id: c.id,
            class_name: c.name,
        })
        .collect();
    Ok(HttpResponse::Ok().json(out))
}

/// GET /api/classes/{id}
#[get("/classes/{id}")]
pub async fn detail(
    path: web::Path<i32>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    let class = store
        .class_by_id(path.into_inner())
        .await?
        .ok_or_else(|| GameError::not_found("class does not exist"))?;
    Ok(HttpResponse::Ok().json(ClassRow::from(class)))
}

/// PATCH /api/classes/{id}
#[patch("/classes/{id}")]
pub async fn update(
    auth: AuthAccount,
    path: web::Path<i32>,
    info: web::Json<ClassReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    policy::ensure_admin(&auth.0)?;
    let info = info.into_inner();
    let patch = ClassPatch {
        name: rules::optional_name("className", info.class_name)?,
        hp: info.class_hp,
        power: info.class_power,
        speed: info.class_speed,
        cooldown: info.class_cooldown,
    };
    if patch.is_empty() {
        return Err(GameError::bad_request("nothing to update"));
    }

    let class = store.update_class(path.into_inner(), patch).await?;
    log::info!("class {} updated", class.id);
    Ok(HttpResponse::Ok().json(ClassRow::from(class)))
}

/// PATCH /api/basic-items
#[patch("/basic-items")]
pub async fn set_basic_item(
    auth: AuthAccount,
    info: web::Json<BasicItemReq>,
    store: web::Data<dyn GameStore>,
) -> GameResult<HttpResponse> {
    policy::ensure_admin(&auth.0)?;
    let (Some(class_id), Some(item_code)) = (info.class_id, info.item_code) else {
        return Err(GameError::bad_request("classId and itemCode are required"));
    };

    let class = store.set_basic_item(class_id, item_code).await?;
    log::info!("class {} basic item set to {item_code}", class.id);
    Ok(HttpResponse::Created().json(ClassRow::from(class)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(list)
        .service(detail)
        .service(update)
        .service(set_basic_item);
}
