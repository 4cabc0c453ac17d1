use std::collections::HashMap;

use actix_web::{http::StatusCode, web::ServiceConfig};
use plv_common::Gender;
use puppylove_engine::{
    db_types::{ConfigKey, Registration},
    traits::ProfileError,
};
use serde_json::{json, Value};

use super::{
    helpers::{gate_api, get_request, post_request, profile_api, user},
    mocks::{config_backend, profile, MockBackend},
};
use crate::{
    identity::USER_ID_HEADER,
    routes::{FirstLoginRoute, MyMatchesRoute, ProfileAccessRoute, PublicKeysRoute, UpdateAboutRoute},
};

fn configure(cfg: &mut ServiceConfig, profile_db: MockBackend, gate_db: MockBackend) {
    cfg.service(FirstLoginRoute::<MockBackend>::new())
        .service(UpdateAboutRoute::<MockBackend>::new())
        .service(PublicKeysRoute::<MockBackend>::new())
        .service(MyMatchesRoute::<MockBackend>::new())
        .service(ProfileAccessRoute::<MockBackend>::new())
        .app_data(profile_api(profile_db))
        .app_data(gate_api(gate_db));
}

fn active() -> MockBackend {
    config_backend("active", "false", "false")
}

#[actix_web::test]
async fn first_login() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_register_profile()
        .withf(|r: &Registration| r.roll_no == "230001" && r.gender == Gender::F && r.public_key == "pk" && r.user_id.is_none())
        .times(1)
        .returning(|r: Registration| Ok(profile(&r.roll_no, r.gender, true)));
    let body = json!({"gender": "Female", "pubKey": "pk", "privKey": "sk", "data": ""});
    let (status, body) =
        post_request(user("230001"), "/login/first", body, |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"success":true,"message":"User Created Successfully."}"#);
}

#[actix_web::test]
async fn first_login_with_invalid_gender() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_register_profile().never();
    let body = json!({"gender": "X", "pubKey": "pk", "privKey": "sk"});
    let (status, _) =
        post_request(user("230001"), "/login/first", body, |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn first_login_twice() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_register_profile().returning(|r: Registration| Err(ProfileError::AlreadyRegistered(r.roll_no)));
    let body = json!({"gender": "M", "pubKey": "pk", "privKey": "sk"});
    let (status, body) =
        post_request(user("230001"), "/login/first", body, |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, r#"{"error":"User 230001 is already registered"}"#);
}

#[actix_web::test]
async fn about_is_limited() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_update_about().never();
    let body = json!({ "about": "x".repeat(71) });
    let (status, body) =
        post_request(user("230001"), "/about", body, |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"about can be at most 70 characters long"}"#);
}

#[actix_web::test]
async fn public_keys_are_read_through() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_public_keys()
        .times(1)
        .returning(|| Ok(HashMap::from([("230001".to_string(), "pk-230001".to_string())])));
    let (status, body) =
        get_request(user("230002"), "/fetchPublicKeys", |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"230001":"pk-230001"}"#);
}

#[actix_web::test]
async fn matches_before_publication() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_config().withf(|key: &ConfigKey| *key == ConfigKey::ResultsPublished).returning(|_| Ok(Some("false".into())));
    db.expect_fetch_profile().never();
    let (status, body) =
        get_request(user("230001"), "/mymatches", |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"not_published"}"#);
}

#[actix_web::test]
async fn matches_after_publication() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_config().returning(|_| Ok(Some("true".into())));
    db.expect_fetch_profile().returning(|roll: &str| {
        let mut p = profile(roll, Gender::M, true);
        p.publish = true;
        p.matches.0.insert("230002".into(), "song-from-230002".into());
        Ok(Some(p))
    });
    let (status, body) =
        get_request(user("230001"), "/mymatches", |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("Response was not JSON");
    assert_eq!(body, json!({"status": "published", "matches": {"230002": "song-from-230002"}}));
}

#[actix_web::test]
async fn profile_access_for_new_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_profile().returning(|_| Ok(None));
    let mut headers = user("230004");
    headers.push((USER_ID_HEADER, "6f1c8a4e-3b7d-4f5e-9a2b-1c3d5e7f9a0b".to_string()));
    let (status, body) =
        post_request(headers, "/access", json!({}), |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"action":"verify_password_and_create_keys"}"#);
}

#[actix_web::test]
async fn profile_access_needs_user_id() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_profile().never();
    let mut headers = user("230004");
    headers.push((USER_ID_HEADER, "not-a-uuid".to_string()));
    let (status, body) =
        post_request(headers, "/access", json!({}), |cfg| configure(cfg, db, active())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The X-User-Id header is missing or invalid"}"#);
}
