mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use common::{send, test_app};

#[actix_web::test]
async fn purchase_debits_exactly_and_fills_inventory() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;

    let reply = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/shop/purchase/{}", hero.id))
            .insert_header(("Authorization", owner))
            .set_json(json!({ "itemCode": common::HELM, "count": 3 })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["itemName"], "iron helm");
    assert_eq!(reply.body["count"], 3);
    assert_eq!(reply.body["money"], 10_000 - 3 * common::HELM_PRICE);

    let stored = store.inventory_items(hero.id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|i| i.code == common::HELM));
    let hero_now = store.character_by_id(hero.id).await.unwrap().unwrap();
    assert_eq!(hero_now.money, 10_000 - 3 * common::HELM_PRICE);
    // bought items are stored, not worn
    assert_eq!(hero_now.stats, hero.stats);
}

#[actix_web::test]
async fn purchase_beyond_balance_changes_nothing() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;

    // 21 × 500 > 10 000
    let reply = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/shop/purchase/{}", hero.id))
            .insert_header(("Authorization", owner))
            .set_json(json!({ "itemCode": common::HELM, "count": 21 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let hero_now = store.character_by_id(hero.id).await.unwrap().unwrap();
    assert_eq!(hero_now.money, 10_000);
    assert!(store.inventory_items(hero.id).await.unwrap().is_empty());

    // the store refuses on its own, too
    assert!(store.purchase(hero.id, common::HELM, 21).await.is_err());
    assert_eq!(
        store.character_by_id(hero.id).await.unwrap().unwrap().money,
        10_000
    );
}

#[actix_web::test]
async fn purchase_rejects_bad_requests() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let stranger = common::account(&store, "stranger", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;
    let uri = format!("/api/shop/purchase/{}", hero.id);

    let cases = [
        (owner.clone(), json!({ "itemCode": common::HELM, "count": 0 }), StatusCode::BAD_REQUEST),
        (owner.clone(), json!({ "itemCode": common::HELM }), StatusCode::BAD_REQUEST),
        (owner.clone(), json!({ "itemCode": 777, "count": 1 }), StatusCode::NOT_FOUND),
        (stranger, json!({ "itemCode": common::HELM, "count": 1 }), StatusCode::FORBIDDEN),
    ];
    for (auth, body, expected) in cases {
        let reply = send(
            &app,
            TestRequest::patch()
                .uri(&uri)
                .insert_header(("Authorization", auth))
                .set_json(body),
        )
        .await;
        assert_eq!(reply.status, expected, "{}", reply.body);
    }

    let missing = send(
        &app,
        TestRequest::patch()
            .uri("/api/shop/purchase/9999")
            .insert_header(("Authorization", owner))
            .set_json(json!({ "itemCode": common::HELM, "count": 1 })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn sell_credits_sixty_percent_and_removes_items() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;
    store.purchase(hero.id, common::HELM, 3).await.unwrap();
    let before = 10_000 - 3 * common::HELM_PRICE;

    let reply = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/shop/sell/{}", hero.id))
            .insert_header(("Authorization", owner))
            .set_json(json!({ "itemCode": common::HELM, "count": 2 })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["amount"], 600);
    assert_eq!(reply.body["money"], before + 600);
    assert_eq!(store.inventory_items(hero.id).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn selling_more_than_owned_changes_nothing() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;
    store.purchase(hero.id, common::HELM, 1).await.unwrap();
    let before = store.character_by_id(hero.id).await.unwrap().unwrap().money;

    // the worn sword is not for sale either
    for (code, count) in [(common::HELM, 2), (common::SWORD, 1)] {
        let reply = send(
            &app,
            TestRequest::delete()
                .uri(&format!("/api/shop/sell/{}", hero.id))
                .insert_header(("Authorization", owner.clone()))
                .set_json(json!({ "itemCode": code, "count": count })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.body);
    }

    assert_eq!(
        store.character_by_id(hero.id).await.unwrap().unwrap().money,
        before
    );
    assert_eq!(store.inventory_items(hero.id).await.unwrap().len(), 1);
    assert_eq!(store.equipped_items(hero.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sell_payout_rounds_down() {
    let store = common::store();
    common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;
    store
        .update_item(
            common::HELM,
            rpg_server::db::models::ItemPatch {
                price: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let bought = store.purchase(hero.id, common::HELM, 1).await.unwrap();
    assert_eq!(bought.amount, 7);

    let sold = store.sell(hero.id, common::HELM, 1).await.unwrap();
    assert_eq!(sold.amount, 4);
    assert_eq!(sold.balance, 10_000 - 7 + 4);
}

#[actix_web::test]
async fn large_stacks_sell_over_several_requests() {
    let store = common::store();
    let app = test_app!(store);
    let owner = common::account(&store, "owner", false).await;
    let class = common::warrior(&store).await;
    let hero = common::character(&store, "owner", "Hero", class.id).await;
    store
        .update_item(
            common::HELM,
            rpg_server::db::models::ItemPatch {
                price: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store.purchase(hero.id, common::HELM, 100).await.unwrap();
    store.purchase(hero.id, common::HELM, 50).await.unwrap();
    let uri = format!("/api/shop/sell/{}", hero.id);

    let too_many = send(
        &app,
        TestRequest::delete()
            .uri(&uri)
            .insert_header(("Authorization", owner.clone()))
            .set_json(json!({ "itemCode": common::HELM, "count": 150 })),
    )
    .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
    assert!(too_many.message().contains("per request"), "{}", too_many.body);
    assert_eq!(store.inventory_items(hero.id).await.unwrap().len(), 150);

    for count in [100, 50] {
        let reply = send(
            &app,
            TestRequest::delete()
                .uri(&uri)
                .insert_header(("Authorization", owner.clone()))
                .set_json(json!({ "itemCode": common::HELM, "count": count })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    }
    assert!(store.inventory_items(hero.id).await.unwrap().is_empty());
}
