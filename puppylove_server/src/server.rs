use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use puppylove_engine::{
    cache::Cache,
    jobs::{JobPublisher, JobQueue},
    AdminApi,
    HeartsApi,
    ProfileApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    identity::AdminCredentials,
    routes::{
        health,
        ActiveUsersRoute,
        AdminConfigRoute,
        AllUsersInfoRoute,
        ClaimHeartRoute,
        DraftCountRoute,
        FetchHeartsRoute,
        FetchReturnHeartsRoute,
        FirstLoginRoute,
        MyMatchesRoute,
        ProfileAccessRoute,
        PublicKeysRoute,
        PublishConsentRoute,
        PublishResultsRoute,
        ResetProfileRoute,
        ReturnHeartsLateRoute,
        SaveDraftRoute,
        SendHeartsRoute,
        SetModeRoute,
        StatsRoute,
        TogglePermitRoute,
        UpdateAboutRoute,
        UpdateInterestsRoute,
        UserDataRoute,
        VerifyReturnHeartRoute,
    },
    workers::start_workers,
};

/// The engine APIs shared by every HTTP worker.
#[derive(Clone)]
pub struct ServerApis {
    pub hearts: HeartsApi<SqliteDatabase>,
    pub profiles: ProfileApi<SqliteDatabase>,
    pub admin: AdminApi<SqliteDatabase>,
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let cache = Cache::connect(config.redis_url.as_deref())
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not connect to the cache. {e}")))?;
    let queue = JobQueue::new(config.max_deliveries);
    let publisher = JobPublisher::new(queue.clone(), config.queues.clone());
    let apis = ServerApis {
        hearts: HeartsApi::new(db.clone()),
        profiles: ProfileApi::new(db.clone(), cache, publisher.clone()),
        admin: AdminApi::new(db.clone()),
    };
    apis.admin.init_config().await?;
    let _workers = start_workers(db, &queue, publisher, &config.assets_dir)?;
    let srv = create_server_instance(config, apis)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    queue.shutdown();
    result
}

pub fn create_server_instance(config: ServerConfig, apis: ServerApis) -> Result<Server, ServerError> {
    let admin_credentials = AdminCredentials::new(config.admin_token.clone());
    let srv = HttpServer::new(move || {
        let users_scope = web::scope("/users")
            .service(FirstLoginRoute::<SqliteDatabase>::new())
            .service(UserDataRoute::<SqliteDatabase>::new())
            .service(ProfileAccessRoute::<SqliteDatabase>::new())
            .service(ActiveUsersRoute::<SqliteDatabase>::new())
            .service(PublicKeysRoute::<SqliteDatabase>::new())
            .service(AllUsersInfoRoute::<SqliteDatabase>::new())
            .service(UpdateAboutRoute::<SqliteDatabase>::new())
            .service(UpdateInterestsRoute::<SqliteDatabase>::new())
            .service(PublishConsentRoute::<SqliteDatabase>::new())
            .service(MyMatchesRoute::<SqliteDatabase>::new())
            .service(SendHeartsRoute::<SqliteDatabase>::new())
            .service(SaveDraftRoute::<SqliteDatabase>::new())
            .service(DraftCountRoute::<SqliteDatabase>::new())
            .service(FetchHeartsRoute::<SqliteDatabase>::new())
            .service(FetchReturnHeartsRoute::<SqliteDatabase>::new())
            .service(ClaimHeartRoute::<SqliteDatabase>::new())
            .service(ReturnHeartsLateRoute::<SqliteDatabase>::new())
            .service(VerifyReturnHeartRoute::<SqliteDatabase>::new());
        let admin_scope = web::scope("/admin")
            .service(AdminConfigRoute::<SqliteDatabase>::new())
            .service(TogglePermitRoute::<SqliteDatabase>::new())
            .service(SetModeRoute::<SqliteDatabase>::new())
            .service(PublishResultsRoute::<SqliteDatabase>::new())
            .service(ResetProfileRoute::<SqliteDatabase>::new());
        let api_scope = web::scope("/api/puppylove")
            .service(StatsRoute::<SqliteDatabase>::new())
            .service(users_scope)
            .service(admin_scope);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("plv::access_log"))
            .app_data(web::Data::new(apis.hearts.clone()))
            .app_data(web::Data::new(apis.profiles.clone()))
            .app_data(web::Data::new(apis.admin.clone()))
            .app_data(web::Data::new(admin_credentials.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ PuppyLove routes are mounted under /api/puppylove");
    Ok(srv)
}
