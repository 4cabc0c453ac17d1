use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{DateTime, Utc};
use plv_common::Gender;
use puppylove_engine::{
    db_types::{ClaimRequest, HeartClaim, HeartSummary, NewHeart},
    helpers::heart_digest,
    traits::MatchmakingError,
    HeartsApi,
    VerifyOutcome,
};
use serde_json::{json, Value};

use super::{
    helpers::{gate_api, get_request, post_request, user},
    mocks::{config_backend, profile, MockBackend},
};
use crate::routes::{
    ClaimHeartRoute,
    DraftCountRoute,
    FetchHeartsRoute,
    SendHeartsRoute,
    VerifyReturnHeartRoute,
};

fn configure(cfg: &mut ServiceConfig, hearts_db: MockBackend, gate_db: MockBackend) {
    cfg.service(SendHeartsRoute::<MockBackend>::new())
        .service(ClaimHeartRoute::<MockBackend>::new())
        .service(VerifyReturnHeartRoute::<MockBackend>::new())
        .service(FetchHeartsRoute::<MockBackend>::new())
        .service(DraftCountRoute::<MockBackend>::new())
        .app_data(web::Data::new(HeartsApi::new(hearts_db)))
        .app_data(gate_api(gate_db));
}

fn send_body() -> serde_json::Value {
    json!({
        "hearts": [
            {"sha": "sha-1", "enc": "enc-1", "songID_enc": "song-1"},
            {"sha": "sha-2", "enc": "enc-2"}
        ],
        "returnhearts": []
    })
}

#[actix_web::test]
async fn send_hearts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_profile().returning(|roll: &str| Ok(Some(profile(roll, Gender::F, true))));
    db.expect_submit_hearts()
        .withf(|roll: &str, gender: &Gender, hearts: &[NewHeart]| {
            roll == "230001" && *gender == Gender::F && hearts.len() == 2
        })
        .times(1)
        .returning(|_, _, _| Ok(vec![]));
    let (status, body) = post_request(user("230001"), "/sendheart", send_body(), |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, r#"{"success":true,"message":"Hearts Sent Successfully !!"}"#);
}

#[actix_web::test]
async fn send_hearts_twice() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_profile().returning(|roll: &str| Ok(Some(profile(roll, Gender::M, true))));
    db.expect_submit_hearts().returning(|_, _, _| Err(MatchmakingError::AlreadySubmitted));
    let (status, body) = post_request(user("230001"), "/sendheart", send_body(), |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, r#"{"error":"Hearts already sent."}"#);
}

#[actix_web::test]
async fn send_hearts_while_inactive() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_submit_hearts().never();
    let (status, body) = post_request(user("230001"), "/sendheart", send_body(), |cfg| {
        configure(cfg, db, config_backend("inactive", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("PuppyLove is not active right now"), "{body}");
}

#[actix_web::test]
async fn send_hearts_without_permit() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_submit_hearts().never();
    let (status, body) = post_request(user("230001"), "/sendheart", send_body(), |cfg| {
        configure(cfg, db, config_backend("active", "false", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Sending hearts is closed"), "{body}");
}

#[actix_web::test]
async fn claim_without_permit_is_allowed() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_claim_heart()
        .withf(|claim: &ClaimRequest, roll: &str| claim.enc == "enc-1" && roll == "230002")
        .returning(|claim: &ClaimRequest, roll: &str| {
            Ok(HeartClaim {
                claim_id: claim.enc.clone(),
                sha: claim.sha.clone(),
                roll_no: roll.to_string(),
                song_enc: claim.song_enc.clone(),
                created_at: Utc::now(),
            })
        });
    let body = json!({"enc": "enc-1", "sha": "sha-1", "songID_enc": "song-1", "genderOfSender": "M"});
    let (status, body) = post_request(user("230002"), "/claimheart", body, |cfg| {
        configure(cfg, db, config_backend("active", "false", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    let body: Value = serde_json::from_str(&body).expect("Response was not JSON");
    assert_eq!(body, json!({"message": "Heart Claim Success", "claim_status": "true"}));
}

#[actix_web::test]
async fn invalid_claim() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_claim_heart().returning(|_, _| Err(MatchmakingError::InvalidClaim));
    let body = json!({"enc": "enc-x", "sha": "sha-x", "genderOfSender": "F"});
    let (status, body) = post_request(user("230002"), "/claimheart", body, |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Invalid Heart Claim Request."}"#);
}

#[actix_web::test]
async fn claim_needs_identity() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_claim_heart().never();
    let body = json!({"enc": "enc-1", "sha": "sha-1", "genderOfSender": "M"});
    let (status, body) = post_request(vec![], "/claimheart", body, |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The X-Roll-No header is missing or invalid"}"#);
}

#[actix_web::test]
async fn verify_hashes_the_secret() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    let digest = heart_digest("my-secret");
    db.expect_verify_returned_heart()
        .withf(move |d: &str, enc: &str, roll: &str| d == digest && enc == "enc-1" && roll == "230001")
        .times(1)
        .returning(|_, _, _| Ok(VerifyOutcome::AlreadyMatched));
    let body = json!({"enc": "enc-1", "secret": "my-secret"});
    let (status, body) = post_request(user("230001"), "/verifyreturnhearts", body, |cfg| {
        configure(cfg, db, config_backend("active", "false", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, r#"{"success":true,"message":"Match Already Done from other side"}"#);
}

#[actix_web::test]
async fn fetch_hearts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_hearts_since_cursor()
        .withf(|roll: &str, cursor: &DateTime<Utc>| roll == "230003" && *cursor < Utc::now())
        .returning(|_, _| Ok(vec![HeartSummary { enc: "enc-1".into(), gender_of_sender: Gender::M }]));
    let (status, body) = get_request(user("230003"), "/fetchall", |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"enc":"enc-1","genderOfSender":"M"}]"#);
}

#[actix_web::test]
async fn draft_count() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_profile().returning(|roll: &str| {
        let mut p = profile(roll, Gender::M, true);
        p.data = r#"{"heart2": {"sha_encrypt": "s", "id_encrypt": "i"}}"#.to_string();
        Ok(Some(p))
    });
    let (status, body) = get_request(user("230001"), "/virtualHeartCount", |cfg| {
        configure(cfg, db, config_backend("active", "true", "false"))
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"count":1,"limit":4,"remaining":3}"#);
}
