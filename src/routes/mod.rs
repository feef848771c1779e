use axum::{routing::get, Router};

use crate::handlers::{cities, search};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // JSON API: city CRUD, search, and browsable history
    let api_routes = Router::new()
        .route("/cities/", get(cities::list_cities).post(cities::create_city))
        .route(
            "/cities/{id}",
            get(cities::get_city)
                .put(cities::update_city)
                .delete(cities::delete_city),
        )
        .route("/logs/", get(cities::list_logs))
        .route("/results/", get(search::list_results))
        .route("/search/", get(search::search_api));

    // HTML search form and its submission target
    Router::new()
        .route("/search/", get(search::search_page).post(search::search_submit))
        .nest("/api", api_routes)
        .with_state(state)
}
