//! Generic entity routes. The `:entity` segment is resolved and validated by the
//! `EntityPath` extractor, so any table in the configured schema is reachable.

use crate::handlers::entity::{create, delete, filter, list, update};
use crate::state::AppState;
use axum::{
    routing::{delete as delete_route, get, post, put},
    Router,
};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:entity", post(create))
        .route("/:entity/create", post(create))
        .route("/:entity/list", get(list))
        .route("/:entity/filter", post(filter))
        .route("/:entity/update/:id", put(update))
        .route("/:entity/delete/:id", delete_route(delete))
        .with_state(state)
}
