use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{state::InMemoryState, state::NotKeyed, Quota, RateLimiter};

/// Process-wide request budget shared by all API routes.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>>,
}

impl RateLimitLayer {
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests))),
        }
    }

    pub fn check(&self) -> Result<(), Response> {
        self.limiter.check().map_err(|_| {
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.",
            )
                .into_response()
        })
    }
}

/// Middleware entry point; the shared limiter is provided as an extension
/// layer during router assembly.
pub async fn rate_limit_middleware(req: Request, next: Next) -> Result<Response, Response> {
    if let Some(layer) = req.extensions().get::<RateLimitLayer>() {
        layer.check()?;
    }
    Ok(next.run(req).await)
}
