//! Shared fixtures: an in-memory store, seeded catalog and a request helper.
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use rpg_server::{
    config::Settings,
    credentials,
    db::{
        models::{Character, Class, ItemTemplate, NewAccount, NewClass},
        GameStore, MemoryStore, NewCharacter,
    },
    game::types::Stats,
};
use serde_json::Value;

pub const SECRET: &str = "test-secret";
pub const SWORD: i32 = 1;
pub const HELM: i32 = 2;
pub const HELM_PRICE: i64 = 500;

pub fn settings() -> Settings {
    Settings::for_tests(SECRET)
}

pub fn store() -> Arc<dyn GameStore> {
    Arc::new(MemoryStore::new())
}

/// Build the real application around `$store` (an `Arc<dyn GameStore>`).
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from($store.clone()))
                .app_data(actix_web::web::Data::new($crate::common::settings()))
                .configure(rpg_server::http::routes::init_routes),
        )
        .await
    };
}
pub(crate) use test_app;

pub struct Reply {
    pub status: StatusCode,
    pub authorization: Option<String>,
    pub body: Value,
}

impl Reply {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub async fn send<S, B>(app: &S, req: test::TestRequest) -> Reply
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let authorization = resp
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        authorization,
        body,
    }
}

/// Insert an account directly and return a ready-to-use `Authorization`
/// header value.
pub async fn account(store: &Arc<dyn GameStore>, external_id: &str, is_admin: bool) -> String {
    store
        .create_account(NewAccount {
            external_id: external_id.into(),
            password_hash: "not-a-real-hash".into(),
            display_name: external_id.into(),
            is_admin,
        })
        .await
        .expect("create account");
    bearer(external_id)
}

pub fn bearer(external_id: &str) -> String {
    let token = credentials::issue_token(external_id, SECRET, 7).expect("issue token");
    format!("Bearer {token}")
}

/// Warrior: 100 hp / 10 power / 5 speed / 3 cooldown; basic item is a
/// sword (+20 hp). A helm (+15 hp, +2 power, -1 speed) is for sale.
pub async fn warrior(store: &Arc<dyn GameStore>) -> Class {
    let class = store
        .create_class(NewClass {
            name: "warrior".into(),
            base: Stats::new(100, 10, 5, 3),
        })
        .await
        .expect("create class");
    store
        .create_item(ItemTemplate {
            code: SWORD,
            name: "wooden sword".into(),
            stat: Stats::new(20, 0, 0, 0),
            price: 100,
            class_id: class.id,
        })
        .await
        .expect("create sword");
    store
        .create_item(ItemTemplate {
            code: HELM,
            name: "iron helm".into(),
            stat: Stats::new(15, 2, -1, 0),
            price: HELM_PRICE,
            class_id: class.id,
        })
        .await
        .expect("create helm");
    store
        .set_basic_item(class.id, SWORD)
        .await
        .expect("set basic item")
}

pub async fn character(
    store: &Arc<dyn GameStore>,
    owner: &str,
    name: &str,
    class_id: i32,
) -> Character {
    let account = store
        .account_by_external_id(owner)
        .await
        .expect("lookup")
        .expect("owner exists");
    store
        .create_character(NewCharacter {
            account_id: account.id,
            class_id,
            name: name.into(),
            starting_money: 10_000,
        })
        .await
        .expect("create character")
}
