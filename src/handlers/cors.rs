// CORS middleware for TrackID API
//
// This module provides cross-origin response headers for the TrackID API.
// Every response carries Access-Control-Allow-Origin with the configured origin,
// so browser clients on the allowed origin can call both endpoints directly.
// Preflight OPTIONS requests are answered by the per-route OPTIONS handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::warn;

/// Middleware factory for CORS response headers
pub struct Cors {
    allow_origin: HeaderValue,
}

impl Cors {
    /// Build the middleware for the configured allowed origin
    ///
    /// An origin that is not a valid header value falls back to `*`.
    pub fn new(origin: &str) -> Self {
        let allow_origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            warn!(
                "Configured origin {:?} is not a valid header value, allowing any origin",
                origin
            );
            HeaderValue::from_static("*")
        });
        Self { allow_origin }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddleware {
            service,
            allow_origin: self.allow_origin.clone(),
        })
    }
}

/// CORS middleware implementation
pub struct CorsMiddleware<S> {
    service: S,
    allow_origin: HeaderValue,
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allow_origin = self.allow_origin.clone();
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin.clone());
            if allow_origin != "*" {
                // Responses differ per origin, caches must key on it
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
            }
            Ok(res)
        })
    }
}
