//! Federation gatekeeper middleware.
//!
//! Every inbound request is offered to a [`Resolver`] before the application
//! router sees it:
//!
//! - [`Resolution::Handled`] short-circuits with the resolver's response.
//! - [`Resolution::NotFound`] lets the request continue untouched.
//! - [`Resolution::NotAcceptable`] lets the request continue, then turns a
//!   `404` from the application into `406 Not Acceptable`. Any other status
//!   from the application is kept.
//!
//! The gatekeeper keeps no state between requests.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fedblog_common::AppError;
use tracing::{debug, info};

use crate::resolver::{RequestContext, Resolution, Resolver};

/// Body of the `406` written over an application `404`.
pub const NOT_ACCEPTABLE_BODY: &str = "Not Acceptable";

/// Routes requests through a federation resolver.
#[derive(Clone)]
pub struct Gatekeeper {
    resolver: Arc<dyn Resolver>,
}

impl Gatekeeper {
    /// Create a gatekeeper over a resolver.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Resolve `request`, calling `next` when the application should answer.
    pub async fn handle<F, Fut>(&self, request: Request, next: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let method = request.method().clone();
        let uri = request.uri().clone();
        info!(method = %method, uri = %uri, "Federation gatekeeper received request");

        let (parts, body) = request.into_parts();
        let context = || RequestContext {
            url: uri.to_string(),
        };

        let resolution = match self.resolver.resolve(&parts, &context).await {
            Ok(resolution) => resolution,
            Err(e) => return AppError::from(e).into_response(),
        };

        let request = Request::from_parts(parts, body);
        let response = match resolution {
            Resolution::Handled(response) => {
                info!(
                    method = %method,
                    uri = %uri,
                    status = %response.status(),
                    "Federation request handled"
                );
                response
            }
            Resolution::NotFound => {
                info!(uri = %uri, "Not a federation request, falling through");
                next(request).await
            }
            Resolution::NotAcceptable => {
                info!(uri = %uri, "Federation resource not acceptable, falling through");
                not_acceptable(next(request).await)
            }
        };

        debug!(uri = %uri, status = %response.status(), "Federation gatekeeper done");
        response
    }
}

/// Replace an application `404` with `406 Not Acceptable`.
fn not_acceptable(response: Response) -> Response {
    if response.status() != StatusCode::NOT_FOUND {
        return response;
    }

    (
        StatusCode::NOT_ACCEPTABLE,
        [(header::CONTENT_TYPE, "text/plain")],
        NOT_ACCEPTABLE_BODY,
    )
        .into_response()
}

/// Axum middleware entry point, for use with
/// [`axum::middleware::from_fn_with_state`].
pub async fn gatekeeper_middleware(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    request: Request,
    next: Next,
) -> Response {
    gatekeeper.handle(request, |request| next.run(request)).await
}
