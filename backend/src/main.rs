mod config;
mod error;
mod lifecycle;
mod normalizer;
mod object_store;
mod repository;
mod services;
mod stamp;
#[cfg(test)]
mod testutil;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

use crate::config::AppConfig;
use crate::lifecycle::Lifecycle;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    let lifecycle = Lifecycle::new(&config);
    if let Err(e) = lifecycle.init() {
        return Err(std::io::Error::other(format!(
            "repository initialization failed: {e}"
        )));
    }

    let bind = (config.host.clone(), config.port);
    info!("server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(1024 * 1024)) // 1 MB
            .app_data(web::Data::new(lifecycle.clone()))
            .service(services::documents::configure_routes())
            .service(services::files::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
