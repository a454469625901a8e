use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload},
    error::{Error, Result},
    AppState,
};

const REQUIRED_FIELDS_MESSAGE: &str = "firstName, lastName, and email are required";
const EMPTY_FIELDS_MESSAGE: &str = "firstName, lastName, and email cannot be empty";

/// Ids are UUIDs; anything else cannot name a stored candidate.
fn parse_candidate_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::candidate_not_found())
}

#[utoipa::path(
    post,
    path = "/candidates",
    request_body = CreateCandidatePayload,
    responses(
        (status = 201, description = "Candidate created", body = crate::models::candidate::Candidate),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "Email already in use")
    )
)]
#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateCandidatePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|_| Error::BadRequest(REQUIRED_FIELDS_MESSAGE.to_string()))?;
    let candidate = state.candidate_service.create_candidate(payload).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

#[utoipa::path(
    get,
    path = "/candidates",
    responses(
        (status = 200, description = "All candidates, newest first", body = [crate::models::candidate::Candidate])
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.get_all_candidates().await?;
    Ok(Json(candidates))
}

#[utoipa::path(
    get,
    path = "/candidates/{id}",
    params(
        ("id" = String, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate found", body = crate::models::candidate::Candidate),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_candidate_id(&id)?;
    let candidate = state.candidate_service.get_candidate_by_id(id).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    put,
    path = "/candidates/{id}",
    params(
        ("id" = String, Path, description = "Candidate ID")
    ),
    request_body = UpdateCandidatePayload,
    responses(
        (status = 200, description = "Candidate updated; child collections replaced", body = crate::models::candidate::Candidate),
        (status = 400, description = "Empty required field"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Email already in use")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateCandidatePayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_candidate_id(&id)?;
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|_| Error::BadRequest(EMPTY_FIELDS_MESSAGE.to_string()))?;
    let candidate = state.candidate_service.update_candidate(id, payload).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/candidates/{id}",
    params(
        ("id" = String, Path, description = "Candidate ID")
    ),
    responses(
        (status = 204, description = "Candidate deleted"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_candidate_id(&id)?;
    state.candidate_service.delete_candidate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
