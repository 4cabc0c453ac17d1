//! Phase gates for the PuppyLove routes.
//!
//! Every user route is closed while PuppyLove is inactive, and the heart-sending routes are additionally closed when
//! an admin has revoked the permit. The current settings are read from the [`AdminApi`] registered as app data, so a
//! change takes effect on the next request.

use std::{marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    web,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use puppylove_engine::{AdminApi, AdminApiError, PuppyLoveBackend};

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// PuppyLove mode must be `active`
    Active,
    /// The admin must permit sending hearts
    Permit,
}

pub struct FeatureGateFactory<B> {
    gates: Vec<Gate>,
    _backend: PhantomData<fn() -> B>,
}

impl<B> FeatureGateFactory<B> {
    pub fn new(gates: &[Gate]) -> Self {
        FeatureGateFactory { gates: gates.to_vec(), _backend: PhantomData }
    }
}

impl<S, Body, B> Transform<S, ServiceRequest> for FeatureGateFactory<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: PuppyLoveBackend + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<Body>;
    type Transform = FeatureGateService<S, B>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FeatureGateService { gates: self.gates.clone(), service: Rc::new(service), _backend: PhantomData })
    }
}

pub struct FeatureGateService<S, B> {
    gates: Vec<Gate>,
    service: Rc<S>,
    _backend: PhantomData<fn() -> B>,
}

impl<S, Body, B> Service<ServiceRequest> for FeatureGateService<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: PuppyLoveBackend + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<Body>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gates = self.gates.clone();
        let api = req.app_data::<web::Data<AdminApi<B>>>().cloned();
        Box::pin(async move {
            let api = api.ok_or_else(|| {
                warn!("💻️ No admin API is registered. Cannot check PuppyLove gates.");
                ErrorInternalServerError("PuppyLove settings are unavailable")
            })?;
            for gate in gates {
                let check = match gate {
                    Gate::Active => api.ensure_active().await,
                    Gate::Permit => api.ensure_permitted().await,
                };
                if let Err(e) = check {
                    if matches!(e, AdminApiError::Inactive | AdminApiError::NotPermitted) {
                        debug!("💻️ {} refused. {e}", req.path());
                    }
                    return Err(ServerError::from(e).into());
                }
            }
            service.call(req).await
        })
    }
}
