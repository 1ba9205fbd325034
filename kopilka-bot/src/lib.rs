use actix_web::web;

pub mod bot;
pub mod config;
pub mod handlers;
pub mod integrations;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::Dispatcher;

/// Registers `GET /`, `GET /health` and `POST /webhook`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::status::index))
        .route("/health", web::get().to(handlers::status::health))
        .route("/webhook", web::post().to(handlers::webhook::webhook));
}
