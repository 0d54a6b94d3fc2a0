pub mod db;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;
pub mod utils;

use axum::Router;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::course::routes())
        .merge(handlers::enrollment::routes())
        .merge(handlers::attempt::routes())
        .merge(handlers::achievement::routes())
        .with_state(state)
}
