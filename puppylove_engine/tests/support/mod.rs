#![allow(dead_code)]

use plv_common::Gender;
use puppylove_engine::{
    db_types::{ClaimRequest, NewHeart, NewReturnHeart, Registration},
    helpers::heart_digest,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ProfileManagement,
    SqliteDatabase,
};

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub async fn register(db: &SqliteDatabase, roll_no: &str, gender: Gender) {
    let registration = Registration {
        roll_no: roll_no.to_string(),
        user_id: None,
        gender,
        public_key: format!("pk-{roll_no}"),
        private_key: format!("sk-{roll_no}"),
        data: String::new(),
    };
    db.register_profile(registration).await.expect("Error registering profile");
}

/// A heart from `from` to `to`. The sender's secret is derived from both roll numbers.
pub struct TestHeart {
    pub secret: String,
    pub sha: String,
    pub enc: String,
    pub song: String,
    pub gender: Gender,
}

impl TestHeart {
    pub fn new(from: &str, to: &str, gender: Gender) -> Self {
        let secret = format!("secret-{from}-{to}");
        let sha = heart_digest(&secret);
        Self { secret, sha, enc: format!("enc-{from}-{to}"), song: format!("song-{from}-{to}"), gender }
    }

    pub fn new_heart(&self) -> NewHeart {
        NewHeart::new(self.sha.as_str(), self.enc.as_str(), self.song.as_str())
    }

    pub fn claim(&self) -> ClaimRequest {
        ClaimRequest {
            enc: self.enc.clone(),
            sha: self.sha.clone(),
            song_enc: self.song.clone(),
            gender_of_sender: self.gender,
        }
    }

    /// The heart the recipient hands back, carrying their own song.
    pub fn returned(&self, song: &str) -> NewReturnHeart {
        NewReturnHeart::new(self.sha.clone(), format!("{}-returned", self.enc), song.to_string())
    }

    pub fn returned_enc(&self) -> String {
        format!("{}-returned", self.enc)
    }
}
