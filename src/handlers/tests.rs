use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use crate::models::{LocalizedName, Prize};
use crate::services::{CatalogService, DrawService, ReconcileService};
use crate::store::{LotteryStore, MemoryStore};

fn store() -> Arc<dyn LotteryStore> {
    Arc::new(MemoryStore::with_prizes(vec![
        Prize::new(
            "A",
            LocalizedName {
                zh: "头奖".into(),
                en: "Grand".into(),
            },
            1,
        ),
        Prize {
            remaining: 0,
            ..Prize::new(
                "B",
                LocalizedName {
                    zh: "二奖".into(),
                    en: "Second".into(),
                },
                1,
            )
        },
    ]))
}

macro_rules! app {
    ($store:expr) => {{
        let store = $store;
        test::init_service(
            App::new()
                .app_data(web::Data::new(DrawService::new(store.clone(), false)))
                .app_data(web::Data::new(CatalogService::new(store.clone())))
                .app_data(web::Data::new(ReconcileService::new(store.clone())))
                .configure(super::extractor_config)
                .service(
                    web::scope("/api")
                        .configure(super::draw_config)
                        .configure(super::draws_config)
                        .configure(super::prizes_config)
                        .configure(super::admin_config),
                ),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_draw_flow() {
    let app = app!(store());

    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"requester_id": "u1", "requester_name": "Alice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["prize"]["id"], "A");
    assert_eq!(body["data"]["prize"]["remaining"], 0);
    assert_eq!(body["data"]["allocation"]["prize_name"]["en"], "Grand");

    // 同一参与者再次抽奖: 409 + 之前的中奖记录
    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"userId": "u1", "userName": "Alice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "ALREADY_PARTICIPATED");
    assert_eq!(body["error"]["retryable"], false);
    assert_eq!(body["prize"]["prize_id"], "A");

    // 其他参与者: 奖品已抽完
    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"requester_id": "u2", "requester_name": "Bob"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NO_STOCK_AVAILABLE");

    let req = test::TestRequest::get()
        .uri("/api/draw/check?requester_id=u1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["has_drawn"], true);
    assert_eq!(body["prize"]["requester_id"], "u1");

    let req = test::TestRequest::get()
        .uri("/api/draw/check?requester_id=u2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["has_drawn"], false);
    assert!(body.get("prize").is_none());
}

#[actix_web::test]
async fn test_draw_validation() {
    let app = app!(store());

    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"requester_id": "u1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/draw/check").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_and_reset() {
    let app = app!(store());

    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"requester_id": "u1", "requester_name": "Alice"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["allocation"]["id"].as_i64().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/draws/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/draws/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/prizes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["id"], "A");
    assert_eq!(body["data"][0]["remaining"], 1);

    let req = test::TestRequest::post().uri("/api/reset").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/prizes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][1]["id"], "B");
    assert_eq!(body["data"][1]["remaining"], 1);

    let req = test::TestRequest::get().uri("/api/draws").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));

    let req = test::TestRequest::get().uri("/api/reconcile").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["discrepancies"], json!([]));
}

#[actix_web::test]
async fn test_malformed_input_uses_error_envelope() {
    let app = app!(store());

    let req = test::TestRequest::post()
        .uri("/api/draw")
        .set_json(json!({"requester_id": 123, "requester_name": "Alice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["retryable"], false);

    let req = test::TestRequest::delete()
        .uri("/api/draws/not-a-number")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_oversized_forwarded_for_is_not_recorded() {
    let app = app!(store());

    let req = test::TestRequest::post()
        .uri("/api/draw")
        .insert_header(("x-forwarded-for", "z".repeat(200)))
        .set_json(json!({"requester_id": "u1", "requester_name": "Alice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["allocation"].get("origin_address").is_none());
}
