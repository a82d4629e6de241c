use axum::http::{header, Method};
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;

use crate::middleware::wallet_auth::WALLET_ADDRESS_HEADER;

pub fn create_cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static(WALLET_ADDRESS_HEADER),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(60 * 60));

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => layer,
    }
}
