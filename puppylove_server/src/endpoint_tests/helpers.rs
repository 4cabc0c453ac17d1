use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use plv_common::Secret;
use puppylove_engine::{
    cache::Cache,
    jobs::{JobPublisher, JobQueue, QueueNames},
    AdminApi,
    ProfileApi,
};
use serde_json::Value;

use super::mocks::MockBackend;
use crate::identity::{AdminCredentials, ADMIN_TOKEN_HEADER, ROLL_NO_HEADER};

pub const ADMIN_TOKEN: &str = "let-me-in";

pub fn user(roll_no: &str) -> Vec<(&'static str, String)> {
    vec![(ROLL_NO_HEADER, roll_no.to_string())]
}

pub fn admin() -> Vec<(&'static str, String)> {
    vec![(ADMIN_TOKEN_HEADER, ADMIN_TOKEN.to_string())]
}

pub fn admin_credentials() -> web::Data<AdminCredentials> {
    web::Data::new(AdminCredentials::new(Secret::new(ADMIN_TOKEN.to_string())))
}

/// The admin API the phase gates consult.
pub fn gate_api(db: MockBackend) -> web::Data<AdminApi<MockBackend>> {
    web::Data::new(AdminApi::new(db))
}

pub fn profile_api(db: MockBackend) -> web::Data<ProfileApi<MockBackend>> {
    let publisher = JobPublisher::new(JobQueue::default(), QueueNames::default());
    web::Data::new(ProfileApi::new(db, Cache::default(), publisher))
}

pub async fn get_request<F>(
    headers: Vec<(&'static str, String)>,
    path: &str,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::get().uri(path);
    for header in headers {
        req = req.insert_header(header);
    }
    send(req, configure).await
}

pub async fn post_request<F>(
    headers: Vec<(&'static str, String)>,
    path: &str,
    body: Value,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).set_json(body);
    for header in headers {
        req = req.insert_header(header);
    }
    send(req, configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    // Errors raised by middleware come back as `Err`, rather than as an error response
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let bytes = to_bytes(res.into_body()).await.map_err(|e| format!("Could not read response body. {e}"))?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}
