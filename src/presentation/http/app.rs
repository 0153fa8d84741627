use std::sync::Arc;

use poem::{
    Endpoint, EndpointExt, Route,
    http::Method,
    middleware::{Cors, Tracing},
};
use poem_openapi::OpenApiService;

use crate::{
    config::HttpConfig,
    presentation::http::{
        endpoints::{emails::EmailEndpoints, health::HealthEndpoints, root::ApiState},
        middleware::RateLimit,
    },
};

/// Assembles the full route tree: the API under `/api` and the Swagger UI
/// under `/docs`.
pub fn build_app(state: Arc<ApiState>, config: &HttpConfig) -> impl Endpoint + use<> {
    let api_service = OpenApiService::new(
        (
            HealthEndpoints::new(state.clone()),
            EmailEndpoints::new(state),
        ),
        "Booking Mailer API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", config.server_url()));
    let ui = api_service.swagger_ui();

    Route::new()
        .nest(
            "/api",
            api_service.with(RateLimit::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
        )
        .nest("/docs", ui)
        .with(cors(&config.cors_origins))
        .with(Tracing)
}

fn cors(origins: &[String]) -> Cors {
    let cors = Cors::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_header("content-type");

    origins
        .iter()
        .fold(cors, |cors, origin| cors.allow_origin(origin.as_str()))
}
