use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use futures::FutureExt;

use crate::errors::internal_server_error;

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>, expose_detail: bool) -> Router<S> {
    router.layer(from_fn(move |request: Request, next: Next| async move {
        match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(response) => response,
            Err(_) => internal_server_error(expose_detail, anyhow!("request handler panicked")),
        }
    }))
}
