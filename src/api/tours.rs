//! Tour endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        tour::{CreateTour, Tour, TourQuery},
        Page,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List tours with search and pagination
#[utoipa::path(
    get,
    path = "/tours",
    tag = "tours",
    params(TourQuery),
    responses(
        (status = 200, description = "List of tours", body = PaginatedResponse<Tour>),
        (status = 400, description = "Page out of range")
    )
)]
pub async fn list_tours(
    State(state): State<crate::AppState>,
    Query(query): Query<TourQuery>,
) -> AppResult<Json<PaginatedResponse<Tour>>> {
    let page = Page::new(query.page, query.per_page)?;
    let (items, total) = state.services.tours.list(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Get tour details by ID
#[utoipa::path(
    get,
    path = "/tours/{id}",
    tag = "tours",
    params(
        ("id" = i32, Path, description = "Tour ID")
    ),
    responses(
        (status = 200, description = "Tour details", body = Tour),
        (status = 404, description = "Tour not found")
    )
)]
pub async fn get_tour(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Tour>> {
    let tour = state.services.tours.get_by_id(id).await?;
    Ok(Json(tour))
}

/// Create a new tour (admin)
#[utoipa::path(
    post,
    path = "/tours",
    tag = "tours",
    security(("bearer_auth" = [])),
    request_body = CreateTour,
    responses(
        (status = 201, description = "Tour created", body = Tour),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Title already exists")
    )
)]
pub async fn create_tour(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(tour): Json<CreateTour>,
) -> AppResult<(StatusCode, Json<Tour>)> {
    claims.require_admin()?;

    let created = state.services.tours.create(&tour).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
