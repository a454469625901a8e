pub mod children;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload};
use crate::error::Result;
use crate::models::candidate::Candidate;

pub use memory::InMemoryCandidateRepository;
pub use postgres::PgCandidateRepository;

/// Persistence boundary for the candidate aggregate.
///
/// Implementations translate request-shaped payloads into stored rows and return
/// the persisted aggregate with children and CV loaded. Store failures pass
/// through unchanged; nothing is retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn create(&self, payload: &CreateCandidatePayload) -> Result<Candidate>;

    /// All candidates, newest first.
    async fn find_all(&self) -> Result<Vec<Candidate>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>>;

    /// Patches the scalar fields and replaces every child collection and the CV
    /// with whatever the payload carries (absent means empty).
    async fn update(&self, id: Uuid, payload: &UpdateCandidatePayload) -> Result<Candidate>;

    /// Removes the candidate; owned children go with it.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
