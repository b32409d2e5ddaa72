//! Account registration, login (JWT) and the bearer-token extractor.

use actix_web::{http::header, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Settings;
use crate::credentials;
use crate::db::models::NewAccount;
use crate::db::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::rules;

//////////////////////////////////////////////////
// Data structs
//////////////////////////////////////////////////

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(alias = "id", alias = "userId")]
    pub external_id: Option<String>,
    pub password: Option<String>,
    pub password_check: Option<String>,
    #[serde(alias = "userName")]
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(alias = "id", alias = "userId")]
    pub external_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub message: &'static str,
    pub id: String,
    pub display_name: String,
    pub is_admin: bool,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

//////////////////////////////////////////////////
// ─────────────  AuthAccount extractor  ─────────
//////////////////////////////////////////////////

pub mod extractor {
    use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
    use futures_util::future::LocalBoxFuture;

    use crate::config::Settings;
    use crate::credentials;
    use crate::db::models::Account;
    use crate::db::GameStore;
    use crate::error::GameError;

    /// The caller's account, resolved from `Authorization: Bearer <JWT>`.
    ///
    /// Handlers that take `Option<AuthAccount>` treat any credential failure
    /// as an anonymous caller.
    #[derive(Debug, Clone)]
    pub struct AuthAccount(pub Account);

    impl FromRequest for AuthAccount {
        type Error = GameError;
        type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            let hdr = req
                .headers()
                .get(header::AUTHORIZATION)
                .map(|v| v.to_str().map(str::to_owned));
            let store = req.app_data::<web::Data<dyn GameStore>>().cloned();
            let settings = req.app_data::<web::Data<Settings>>().cloned();

            Box::pin(async move {
                let (Some(store), Some(settings)) = (store, settings) else {
                    return Err(GameError::Internal(anyhow::anyhow!(
                        "store or settings not registered"
                    )));
                };

                // Expect:  Authorization: Bearer <JWT>
                let hdr = match hdr {
                    Some(Ok(v)) if !v.trim().is_empty() => v,
                    Some(Err(_)) => {
                        return Err(GameError::bad_request("malformed Authorization header"))
                    }
                    _ => return Err(GameError::unauthorized("missing Authorization header")),
                };

                let token = match hdr.split_once(' ') {
                    Some(("Bearer", token)) if !token.trim().is_empty() => token.trim(),
                    _ => {
                        return Err(GameError::bad_request(
                            "Authorization header must use the Bearer scheme",
                        ))
                    }
                };

                let claims = credentials::decode_token(token, &settings.token_secret)?;
                if claims.sub.is_empty() {
                    return Err(GameError::unauthorized("invalid token"));
                }

                let account = store
                    .account_by_external_id(&claims.sub)
                    .await?
                    .ok_or_else(|| GameError::unauthorized("account for this token no longer exists"))?;

                Ok(AuthAccount(account))
            })
        }
    }
}
pub use extractor::AuthAccount;

//////////////////////////////////////////////////
// POST /api/sign-up
//////////////////////////////////////////////////
#[post("/sign-up")]
pub async fn sign_up(
    info: web::Json<SignUpRequest>,
    store: web::Data<dyn GameStore>,
    settings: web::Data<Settings>,
) -> GameResult<HttpResponse> {
    let info = info.into_inner();
    let (Some(external_id), Some(password), Some(password_check), Some(display_name)) = (
        required(info.external_id),
        required(info.password),
        required(info.password_check),
        required(info.display_name),
    ) else {
        return Err(GameError::bad_request(
            "id, password, passwordCheck and displayName are required",
        ));
    };

    rules::validate_external_id(&external_id)?;
    if store.account_by_external_id(&external_id).await?.is_some() {
        return Err(GameError::bad_request("id already exists"));
    }
    rules::validate_password(&password, &password_check)?;

    let password_hash = credentials::hash_password(&password)?;
    let account = store
        .create_account(NewAccount {
            is_admin: settings.is_admin_id(&external_id),
            external_id,
            password_hash,
            display_name: display_name.trim().to_string(),
        })
        .await?;

    log::info!(
        "account created: {} (admin: {})",
        account.external_id,
        account.is_admin
    );
    Ok(HttpResponse::Created().json(SignUpResponse {
        message: "account created",
        id: account.external_id,
        display_name: account.display_name,
        is_admin: account.is_admin,
    }))
}

//////////////////////////////////////////////////
// POST /api/sign-in
//////////////////////////////////////////////////
#[post("/sign-in")]
pub async fn sign_in(
    info: web::Json<SignInRequest>,
    store: web::Data<dyn GameStore>,
    settings: web::Data<Settings>,
) -> GameResult<HttpResponse> {
    let info = info.into_inner();
    let (Some(external_id), Some(password)) = (required(info.external_id), required(info.password))
    else {
        return Err(GameError::bad_request("id and password are required"));
    };

    let account = store
        .account_by_external_id(&external_id)
        .await?
        .ok_or_else(|| GameError::unauthorized("no such account"))?;

    if !credentials::verify_password(&password, &account.password_hash)? {
        return Err(GameError::unauthorized("wrong password"));
    }

    let token = credentials::issue_token(
        &account.external_id,
        &settings.token_secret,
        settings.token_ttl_days,
    )?;

    log::info!("account signed in: {}", account.external_id);
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .json(json!({ "message": "signed in" })))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up).service(sign_in);
}
