use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::dto::candidate_dto::{
    CreateCandidatePayload, CvPayload, EducationPayload, UpdateCandidatePayload,
    WorkExperiencePayload,
};
use crate::models::candidate::{Candidate, Cv, Education, WorkExperience};
use crate::routes::{candidate_routes, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        candidate_routes::create_candidate,
        candidate_routes::list_candidates,
        candidate_routes::get_candidate,
        candidate_routes::update_candidate,
        candidate_routes::delete_candidate,
        health::health,
    ),
    components(schemas(
        Candidate,
        Education,
        WorkExperience,
        Cv,
        CreateCandidatePayload,
        UpdateCandidatePayload,
        EducationPayload,
        WorkExperiencePayload,
        CvPayload,
    )),
    tags((name = "candidates", description = "Candidate tracking"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
