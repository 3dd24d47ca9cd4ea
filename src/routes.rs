use super::{controllers, models};
use axum::routing::{get, Router};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/api/hello", get(controllers::hello))
        .route("/test", get(controllers::test_database))
        .route("/api/properties", get(controllers::list_properties).post(controllers::add_property))
        .route("/api/properties/:property_id", get(controllers::get_property))
}
