//! Request pipeline
//!
//! Every middleware has the same shape, `(Request, Next) -> Response`, so an
//! ordered list composes by folding: the first entry is the outermost layer,
//! first on the way in and last on the way out.

mod admission;
mod auth;
mod body;
mod logging;
mod metrics;
mod recover;
mod request_id;

use std::{future::Future, sync::Arc};

use axum::{Router, extract::Request, middleware::Next, response::Response};
use futures_util::future::BoxFuture;

use crate::AppState;

pub use recover::install_panic_hook;

/// One step of the pipeline
pub type Middleware = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a [`Middleware`]
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request, next| Box::pin(f(request, next)))
}

/// Apply `middlewares` around `router`, first entry outermost
pub fn chain(router: Router, middlewares: Vec<Middleware>) -> Router {
    middlewares.into_iter().rev().fold(router, |router, middleware| {
        router.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            let middleware = Arc::clone(&middleware);
            async move { middleware(request, next).await }
        }))
    })
}

/// Production order: request id, panic recovery, metrics, canonical log,
/// authentication, admission control
pub fn pipeline(state: &AppState) -> Vec<Middleware> {
    let keys = Arc::clone(&state.keys);
    let limiter = Arc::clone(&state.limiter);

    vec![
        middleware(request_id::tag),
        middleware(recover::contain),
        middleware(metrics::capture),
        middleware(logging::canonical),
        middleware(move |request, next| auth::authenticate(Arc::clone(&keys), request, next)),
        middleware(move |request, next| admission::admit(Arc::clone(&limiter), request, next)),
    ]
}
