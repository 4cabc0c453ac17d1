//! Request handler definitions
//!
//! Each route is declared with the `route!` macro, followed by its handler. Handlers stay thin: they pull the identity
//! and payload out of the request, call one of the engine APIs and map the result onto a response. Anything longer
//! belongs in the engine.
//!
//! User routes sit under `/api/puppylove/users` and take the caller's identity from the headers set by the
//! authentication gateway (see [`crate::identity`]). Admin routes sit under `/api/puppylove/admin` and require the
//! admin token.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use puppylove_engine::{
    db_types::ClaimRequest,
    AdminApi,
    FirstLogin,
    HeartsApi,
    ProfileApi,
    PublishOutcome,
    PuppyLoveBackend,
    SubmitOutcome,
    VerifyOutcome,
};
use serde_json::json;

use crate::{
    data_objects::{
        AboutRequest,
        DraftCount,
        DraftRequest,
        FirstLoginRequest,
        InterestsRequest,
        JsonResponse,
        ModeRequest,
        PermitResponse,
        ReturnHeartsRequest,
        SendHeartsRequest,
        VerifyRequest,
    },
    errors::ServerError,
    identity::{Admin, RollNo, UserId},
    middleware::Gate,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where gated [$($gates:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::FeatureGateFactory::<A>::new(&[$($gates),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Stats  ----------------------------------------------------
route!(stats => Get "/stats" impl PuppyLoveBackend);
/// Registration and match statistics. These are only available once the results have been published.
pub async fn stats<B: PuppyLoveBackend>(api: web::Data<AdminApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET stats");
    match api.stats().await? {
        Some(stats) => Ok(HttpResponse::Ok().json(stats)),
        None => Ok(HttpResponse::Ok().json(JsonResponse::failure("Stats not yet published"))),
    }
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(first_login => Post "/login/first" impl PuppyLoveBackend where gated [Gate::Active]);
/// Completes registration: stores the key pair the client generated, and the user's gender.
pub async fn first_login<B: PuppyLoveBackend>(
    roll_no: RollNo,
    user_id: Option<UserId>,
    body: web::Json<FirstLoginRequest>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST first login for {}", roll_no.as_str());
    let FirstLoginRequest { gender, public_key, private_key, data } = body.into_inner();
    let login = FirstLogin {
        roll_no: roll_no.0,
        user_id: user_id.map(|id| id.0.to_string()),
        gender,
        public_key,
        private_key,
        data,
    };
    api.register(login).await?;
    Ok(HttpResponse::Created().json(JsonResponse::success("User Created Successfully.")))
}

route!(user_data => Get "/data" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn user_data<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET user data for {}", roll_no.as_str());
    let data = api.user_data(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(data))
}

route!(profile_access => Post "/access" impl PuppyLoveBackend where gated [Gate::Active]);
/// Called by the gateway once the user's password has been checked. Returns the follow-up action the client must take.
pub async fn profile_access<B: PuppyLoveBackend>(
    roll_no: RollNo,
    user_id: UserId,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST profile access for {}", roll_no.as_str());
    let action = api.request_profile_access(user_id.0, roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(json!({ "action": action })))
}

route!(active_users => Get "/activeusers" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn active_users<B: PuppyLoveBackend>(
    _roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let users = api.active_users().await?;
    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

route!(public_keys => Get "/fetchPublicKeys" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn public_keys<B: PuppyLoveBackend>(
    _roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let keys = api.public_keys().await?;
    Ok(HttpResponse::Ok().json(keys))
}

route!(all_users_info => Get "/alluserInfo" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn all_users_info<B: PuppyLoveBackend>(
    _roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let info = api.all_users_info().await?;
    Ok(HttpResponse::Ok().json(info))
}

route!(update_about => Post "/about" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn update_about<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<AboutRequest>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.update_about(roll_no.as_str(), &body.about).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("About updated")))
}

route!(update_interests => Post "/interests" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn update_interests<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<InterestsRequest>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.update_interests(roll_no.as_str(), &body.interests).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Interests updated")))
}

route!(publish_consent => Post "/publish" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn publish_consent<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.publish_consent(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Profile marked for publishing")))
}

route!(my_matches => Get "/mymatches" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn my_matches<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let matches = api.my_matches(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(matches))
}

//----------------------------------------------   Hearts  ----------------------------------------------------
route!(send_hearts => Post "/sendheart" impl PuppyLoveBackend where gated [Gate::Active, Gate::Permit]);
/// Final heart submission. Returns bundled with the submission are processed once the hearts are stored.
pub async fn send_hearts<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<SendHeartsRequest>,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST send hearts for {}", roll_no.as_str());
    let SendHeartsRequest { hearts, return_hearts } = body.into_inner();
    let response = match api.submit(roll_no.as_str(), &hearts, &return_hearts).await? {
        SubmitOutcome::Submitted(_) => JsonResponse::success("Hearts Sent Successfully !!"),
        SubmitOutcome::PartialSuccess { failed_returns, .. } => JsonResponse::failure(format!(
            "Hearts Sent Successfully !!, but found {} invalid claim requests. They will be recorded",
            failed_returns.len()
        )),
    };
    Ok(HttpResponse::Accepted().json(response))
}

route!(save_draft => Post "/sendheartVirtual" impl PuppyLoveBackend where gated [Gate::Active, Gate::Permit]);
pub async fn save_draft<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<DraftRequest>,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST save draft for {}", roll_no.as_str());
    let drafts = api.save_draft(roll_no.as_str(), body.into_inner().hearts).await?;
    Ok(HttpResponse::Accepted().json(drafts))
}

route!(draft_count => Get "/virtualHeartCount" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn draft_count<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let count = api.draft_count(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(DraftCount::new(count)))
}

route!(fetch_hearts => Get "/fetchall" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn fetch_hearts<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let hearts = api.fetch_hearts(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(hearts))
}

route!(fetch_return_hearts => Get "/fetchReturnHearts" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn fetch_return_hearts<B: PuppyLoveBackend>(
    roll_no: RollNo,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let hearts = api.fetch_return_hearts(roll_no.as_str()).await?;
    Ok(HttpResponse::Ok().json(hearts))
}

route!(claim_heart => Post "/claimheart" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn claim_heart<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<ClaimRequest>,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST claim heart for {}", roll_no.as_str());
    let claim = api.claim(roll_no.as_str(), &body).await?;
    trace!("💻️ Claim {} recorded for {}", claim.claim_id, roll_no.as_str());
    Ok(HttpResponse::Accepted().json(json!({ "message": "Heart Claim Success", "claim_status": "true" })))
}

route!(return_hearts_late => Post "/returnclaimedheartlate" impl PuppyLoveBackend where gated [Gate::Active, Gate::Permit]);
/// Returns claimed hearts outside of a submission.
pub async fn return_hearts_late<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<ReturnHeartsRequest>,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST late return for {}", roll_no.as_str());
    let report = api.late_return(roll_no.as_str(), &body.return_hearts).await;
    let response = if report.is_clean() {
        JsonResponse::success(format!("{} hearts returned", report.returned.len()))
    } else {
        JsonResponse::failure("Found invalid claim requests. They will be recorded")
    };
    Ok(HttpResponse::Accepted().json(response))
}

route!(verify_return_heart => Post "/verifyreturnhearts" impl PuppyLoveBackend where gated [Gate::Active]);
pub async fn verify_return_heart<B: PuppyLoveBackend>(
    roll_no: RollNo,
    body: web::Json<VerifyRequest>,
    api: web::Data<HeartsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST verify returned heart for {}", roll_no.as_str());
    let response = match api.verify(roll_no.as_str(), &body.secret, &body.enc).await? {
        VerifyOutcome::Matched(_) => JsonResponse::success("Heart Claim Success"),
        VerifyOutcome::AlreadyMatched => JsonResponse::success("Match Already Done from other side"),
    };
    Ok(HttpResponse::Accepted().json(response))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(admin_config => Get "/config" impl PuppyLoveBackend);
pub async fn admin_config<B: PuppyLoveBackend>(
    _admin: Admin,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let config = api.config().await?;
    Ok(HttpResponse::Ok().json(config))
}

route!(toggle_permit => Post "/permit" impl PuppyLoveBackend);
pub async fn toggle_permit<B: PuppyLoveBackend>(
    _admin: Admin,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let permit = api.toggle_permit().await?;
    Ok(HttpResponse::Ok().json(PermitResponse { permit }))
}

route!(set_mode => Post "/mode" impl PuppyLoveBackend);
pub async fn set_mode<B: PuppyLoveBackend>(
    _admin: Admin,
    body: web::Json<ModeRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.set_mode(body.mode).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("PuppyLove is now {}", body.mode))))
}

route!(publish_results => Post "/publish" impl PuppyLoveBackend);
pub async fn publish_results<B: PuppyLoveBackend>(
    _admin: Admin,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let response = match api.publish_results().await? {
        PublishOutcome::Published { matches, profiles_updated } => JsonResponse::success(format!(
            "Results published. {matches} matches were revealed to {profiles_updated} users"
        )),
        PublishOutcome::AlreadyPublished => JsonResponse::failure("Results have already been published"),
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(reset_profile => Post "/reset/{roll_no}" impl PuppyLoveBackend);
/// Returns a profile to the unregistered state, e.g. after the user reset their password and lost their private key.
pub async fn reset_profile<B: PuppyLoveBackend>(
    _admin: Admin,
    path: web::Path<String>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let roll_no = path.into_inner();
    info!("💻️ Resetting PuppyLove profile for {roll_no}");
    api.reset_profile(&roll_no).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Profile {roll_no} has been reset"))))
}
