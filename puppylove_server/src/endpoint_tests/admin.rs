use actix_web::{http::StatusCode, web::ServiceConfig};
use plv_common::Gender;
use puppylove_engine::{db_types::ConfigKey, PublishOutcome};
use serde_json::{json, Value};

use super::{
    helpers::{admin, admin_credentials, gate_api, get_request, post_request, profile_api, user},
    mocks::{config_backend, profile, MockBackend},
};
use crate::{
    identity::ADMIN_TOKEN_HEADER,
    routes::{health, AdminConfigRoute, PublishResultsRoute, ResetProfileRoute, StatsRoute, TogglePermitRoute},
};

fn configure(cfg: &mut ServiceConfig, admin_db: MockBackend, profile_db: MockBackend) {
    cfg.service(health)
        .service(StatsRoute::<MockBackend>::new())
        .service(AdminConfigRoute::<MockBackend>::new())
        .service(TogglePermitRoute::<MockBackend>::new())
        .service(PublishResultsRoute::<MockBackend>::new())
        .service(ResetProfileRoute::<MockBackend>::new())
        .app_data(gate_api(admin_db))
        .app_data(profile_api(profile_db))
        .app_data(admin_credentials());
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = get_request(vec![], "/health", |cfg| configure(cfg, MockBackend::new(), MockBackend::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn config_needs_admin_token() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(user("230001"), "/config", |cfg| {
        configure(cfg, config_backend("active", "true", "false"), MockBackend::new())
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let headers = vec![(ADMIN_TOKEN_HEADER, "guess".to_string())];
    let (status, body) = get_request(headers, "/config", |cfg| {
        configure(cfg, config_backend("active", "true", "false"), MockBackend::new())
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Invalid admin token"}"#);
}

#[actix_web::test]
async fn fetch_config() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(admin(), "/config", |cfg| {
        configure(cfg, config_backend("active", "false", "false"), MockBackend::new())
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"permit":false,"mode":"active","results_published":false}"#);
}

#[actix_web::test]
async fn toggle_permit() {
    let _ = env_logger::try_init().ok();
    let mut db = config_backend("active", "true", "false");
    db.expect_set_config()
        .withf(|key: &ConfigKey, value: &str| *key == ConfigKey::Permit && value == "false")
        .times(1)
        .returning(|_, _| Ok(()));
    let (status, body) = post_request(admin(), "/permit", json!({}), |cfg| configure(cfg, db, MockBackend::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"permit":false}"#);
}

#[actix_web::test]
async fn publish_results_twice() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_publish_results().times(1).returning(|| Ok(PublishOutcome::AlreadyPublished));
    let (status, body) = post_request(admin(), "/publish", json!({}), |cfg| configure(cfg, db, MockBackend::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Results have already been published"}"#);
}

#[actix_web::test]
async fn stats_before_publication() {
    let _ = env_logger::try_init().ok();
    let mut db = config_backend("active", "true", "false");
    db.expect_fetch_registered_profiles().never();
    let (status, body) =
        get_request(vec![], "/stats", |cfg| configure(cfg, db, MockBackend::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Stats not yet published"}"#);
}

#[actix_web::test]
async fn stats_after_publication() {
    let _ = env_logger::try_init().ok();
    let mut db = config_backend("active", "true", "true");
    db.expect_fetch_registered_profiles().times(1).returning(|| {
        let mut female = profile("230001", Gender::F, true);
        female.matches.0.insert("230002".into(), "song".into());
        Ok(vec![female, profile("230002", Gender::M, true), profile("220003", Gender::M, false)])
    });
    let (status, body) =
        get_request(vec![], "/stats", |cfg| configure(cfg, db, MockBackend::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_str(&body).expect("Response was not JSON");
    assert_eq!(stats["totalRegisters"], json!(2));
    assert_eq!(stats["femaleRegisters"], json!(1));
    assert_eq!(stats["totalMatches"], json!(1));
}

#[actix_web::test]
async fn reset_profile() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_reset_profile()
        .withf(|roll: &str| roll == "230001")
        .times(1)
        .returning(|roll: &str| Ok(profile(roll, Gender::M, false)));
    let (status, body) =
        post_request(admin(), "/reset/230001", json!({}), |cfg| configure(cfg, MockBackend::new(), db))
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Profile 230001 has been reset"}"#);
}
