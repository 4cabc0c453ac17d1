mod support;

use plv_common::Gender;
use puppylove_engine::{
    cache::Cache,
    db_types::ConfigKey,
    jobs::{JobPublisher, JobQueue, ProfileAction, ProfileActionJob, QueueNames},
    ConfigStore,
    FirstLogin,
    HeartsApi,
    MyMatches,
    ProfileApi,
    ProfileApiError,
    ProfileError,
    ProfileManagement,
    SqliteDatabase,
};
use support::{new_database, register, TestHeart};
use uuid::Uuid;

fn first_login(roll_no: &str, gender: &str, public_key: &str) -> FirstLogin {
    FirstLogin {
        roll_no: roll_no.to_string(),
        user_id: Some(Uuid::new_v4().to_string()),
        gender: gender.to_string(),
        public_key: public_key.to_string(),
        private_key: format!("sk-{roll_no}"),
        data: String::new(),
    }
}

async fn setup() -> (SqliteDatabase, ProfileApi<SqliteDatabase>, JobQueue) {
    let db = new_database().await;
    db.init_config_defaults().await.unwrap();
    let queue = JobQueue::default();
    let publisher = JobPublisher::new(queue.clone(), QueueNames::default());
    let api = ProfileApi::new(db.clone(), Cache::default(), publisher);
    (db, api, queue)
}

#[tokio::test]
async fn first_login_registers_the_profile() {
    let (db, api, _) = setup().await;
    let profile = api.register(first_login("210001", " female ", "pk-1")).await.unwrap();
    assert!(profile.registered);
    assert_eq!(profile.gender, Some(Gender::F));
    assert_eq!(profile.public_key, "pk-1");

    let data = api.user_data("210001").await.unwrap();
    assert!(data.registered);
    assert!(data.permit);
    assert!(!data.submitted);
    assert_eq!(data.private_key, "sk-210001");

    let err = api.register(first_login("210001", "F", "pk-other")).await.unwrap_err();
    assert!(matches!(err, ProfileApiError::Profile(ProfileError::AlreadyRegistered(_))));
    assert_eq!(db.fetch_active_users().await.unwrap(), vec!["210001".to_string()]);
}

#[tokio::test]
async fn registration_rejects_bad_input() {
    let (_db, api, _) = setup().await;
    let err = api.register(first_login("210001", "X", "pk-1")).await.unwrap_err();
    assert!(matches!(err, ProfileApiError::InvalidGender(_)));

    api.register(first_login("210001", "Male", "pk-1")).await.unwrap();
    let err = api.register(first_login("220002", "F", "pk-1")).await.unwrap_err();
    assert!(matches!(err, ProfileApiError::Profile(ProfileError::PublicKeyInUse)));
}

#[tokio::test]
async fn public_keys_are_cached_and_evicted() {
    let (_db, api, _) = setup().await;
    api.register(first_login("210001", "M", "pk-1")).await.unwrap();
    let keys = api.public_keys().await.unwrap();
    assert_eq!(keys.get("210001").map(String::as_str), Some("pk-1"));

    // Registering evicts the cached directory, so the new key shows up straight away
    api.register(first_login("220002", "F", "pk-2")).await.unwrap();
    let keys = api.public_keys().await.unwrap();
    assert_eq!(keys.len(), 2);

    api.reset_profile("220002").await.unwrap();
    let keys = api.public_keys().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(!keys.contains_key("220002"));
}

#[tokio::test]
async fn about_and_interests() {
    let (_db, api, _) = setup().await;
    api.register(first_login("210001", "M", "pk-1")).await.unwrap();
    api.update_about("210001", "I like long walks").await.unwrap();
    api.update_interests("210001", "chess").await.unwrap();

    let err = api.update_about("210001", &"a".repeat(71)).await.unwrap_err();
    assert!(matches!(err, ProfileApiError::TooLong { field: "about", max: 70 }));
    let err = api.update_interests("210001", &"ü".repeat(51)).await.unwrap_err();
    assert!(matches!(err, ProfileApiError::TooLong { field: "interests", max: 50 }));
    // Length is counted in characters, not bytes
    api.update_interests("210001", &"ü".repeat(50)).await.unwrap();

    let info = api.all_users_info().await.unwrap();
    assert_eq!(info.about.get("210001").map(String::as_str), Some("I like long walks"));
    assert_eq!(info.interests.get("210001"), Some(&"ü".repeat(50)));
}

#[tokio::test]
async fn users_info_is_fresh_after_an_update() {
    let (_db, api, _) = setup().await;
    api.register(first_login("210001", "M", "pk-1")).await.unwrap();
    api.update_about("210001", "before").await.unwrap();
    let info = api.all_users_info().await.unwrap();
    assert_eq!(info.about.get("210001").map(String::as_str), Some("before"));

    // The maps are now cached. Each update must evict them.
    api.update_about("210001", "after").await.unwrap();
    let info = api.all_users_info().await.unwrap();
    assert_eq!(info.about.get("210001").map(String::as_str), Some("after"));

    api.update_interests("210001", "go").await.unwrap();
    let info = api.all_users_info().await.unwrap();
    assert_eq!(info.interests.get("210001").map(String::as_str), Some("go"));
}

#[tokio::test]
async fn reset_is_total() {
    let (db, api, _) = setup().await;
    register(&db, "210001", Gender::M).await;
    register(&db, "220002", Gender::F).await;
    api.update_about("210001", "hello").await.unwrap();
    let hearts = HeartsApi::new(db.clone());
    let to_me = TestHeart::new("220002", "210001", Gender::F);
    let from_me = TestHeart::new("210001", "220002", Gender::M);
    hearts.submit("220002", &[to_me.new_heart()], &[]).await.unwrap();
    hearts.submit("210001", &[from_me.new_heart()], &[]).await.unwrap();
    hearts.claim("210001", &to_me.claim()).await.unwrap();
    api.publish_consent("210001").await.unwrap();

    let before = db.fetch_profile("210001").await.unwrap().unwrap();
    assert!(!before.is_pristine());
    let profile = api.reset_profile("210001").await.unwrap();
    assert!(profile.is_pristine());
    assert_eq!(profile.gender, Some(Gender::M));
    assert_eq!(profile.about, "hello");

    // A reset user can register again, with a new key
    let again = api.register(first_login("210001", "M", "pk-new")).await.unwrap();
    assert_eq!(again.public_key, "pk-new");
    assert!(!again.submitted);

    let err = api.reset_profile("299999").await.unwrap_err();
    assert!(matches!(err, ProfileApiError::Profile(ProfileError::ProfileNotFound(_))));
}

#[tokio::test]
async fn consent_and_matches_follow_publication() {
    let (db, api, _) = setup().await;
    register(&db, "210001", Gender::M).await;
    register(&db, "220002", Gender::F).await;
    assert_eq!(api.my_matches("210001").await.unwrap(), MyMatches::NotPublished);

    api.publish_consent("210001").await.unwrap();
    db.set_config(ConfigKey::ResultsPublished, "true").await.unwrap();

    let err = api.publish_consent("220002").await.unwrap_err();
    assert!(matches!(err, ProfileApiError::ResultsPublished));
    assert_eq!(api.my_matches("220002").await.unwrap(), MyMatches::NotConsented);
    assert!(matches!(api.my_matches("210001").await.unwrap(), MyMatches::Published(m) if m.is_empty()));
}

#[tokio::test]
async fn profile_access_queues_the_right_action() {
    let (db, api, queue) = setup().await;
    let mut jobs = queue.consume(&QueueNames::default().profile).unwrap();
    let user_id = Uuid::new_v4();

    let action = api.request_profile_access(user_id, "210001").await.unwrap();
    assert_eq!(action, ProfileAction::VerifyPasswordAndCreateKeys);
    let delivery = jobs.next().await.unwrap();
    let job: ProfileActionJob = serde_json::from_slice(delivery.payload()).unwrap();
    delivery.ack();
    assert_eq!(job.user_id, user_id);
    assert_eq!(job.roll_no, "210001");
    assert!(!job.has_profile);
    assert!(!job.is_dirty);

    register(&db, "210001", Gender::M).await;
    let action = api.request_profile_access(user_id, "210001").await.unwrap();
    assert_eq!(action, ProfileAction::VerifyPassword);
    let delivery = jobs.next().await.unwrap();
    let job: ProfileActionJob = serde_json::from_slice(delivery.payload()).unwrap();
    delivery.ack();
    assert!(job.has_profile);
    assert!(job.is_dirty);
}

#[tokio::test]
async fn profile_access_waits_for_the_next_worker() {
    let (_db, api, queue) = setup().await;
    let profile_queue = QueueNames::default().profile;
    // The previous worker went away
    drop(queue.consume(&profile_queue).unwrap());
    let user_id = Uuid::new_v4();
    let action = api.request_profile_access(user_id, "210001").await.unwrap();
    assert_eq!(action, ProfileAction::VerifyPasswordAndCreateKeys);
    let mut jobs = queue.consume(&profile_queue).unwrap();
    let delivery = jobs.next().await.unwrap();
    let job: ProfileActionJob = serde_json::from_slice(delivery.payload()).unwrap();
    assert_eq!(job.user_id, user_id);
    assert_eq!(job.roll_no, "210001");
    delivery.ack();
}

