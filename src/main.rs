use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use actix_cors::Cors;
use actix_web::http::header;
use std::sync::Arc;

mod api;
mod config;
mod errors;
mod models;
mod services;

use services::{alkanes_client::JsonRpcAlkanesClient, session_service::SessionService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let provider = JsonRpcAlkanesClient::new(config.networks.clone(), config.rpc_timeout)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let sessions = web::Data::new(SessionService::new(
        Arc::new(provider),
        config.networks.clone(),
        config.default_network.clone(),
        config.session_ttl,
    ));

    log::info!(
        "Serving alkanes balances on {}:{} (default network {})",
        config.host,
        config.port,
        config.default_network
    );

    let allowed_origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .app_data(sessions.clone())
            .configure(api::config)
            .wrap(cors)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
