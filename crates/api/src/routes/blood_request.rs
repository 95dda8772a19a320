//! Route definitions for the `/blood-requests` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::blood_request;
use crate::state::AppState;

/// Routes mounted at `/blood-requests`.
///
/// ```text
/// GET    /                 -> list_blood_requests
/// POST   /                 -> create_blood_request
/// GET    /mine             -> list_my_blood_requests
/// GET    /{id}             -> get_blood_request
/// PUT    /{id}             -> update_blood_request
/// DELETE /{id}             -> delete_blood_request
/// PUT    /{id}/status      -> set_blood_request_status
/// POST   /{id}/volunteer   -> volunteer
/// PUT    /{id}/volunteer   -> set_volunteer_preference
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(blood_request::list_blood_requests).post(blood_request::create_blood_request),
        )
        .route("/mine", get(blood_request::list_my_blood_requests))
        .route(
            "/{id}",
            get(blood_request::get_blood_request)
                .put(blood_request::update_blood_request)
                .delete(blood_request::delete_blood_request),
        )
        .route("/{id}/status", put(blood_request::set_blood_request_status))
        .route(
            "/{id}/volunteer",
            post(blood_request::volunteer).put(blood_request::set_volunteer_preference),
        )
}
