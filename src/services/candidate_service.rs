use std::sync::Arc;

use uuid::Uuid;

use crate::dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::repositories::CandidateRepository;

#[derive(Clone)]
pub struct CandidateService {
    repository: Arc<dyn CandidateRepository>,
}

impl CandidateService {
    pub fn new(repository: Arc<dyn CandidateRepository>) -> Self {
        Self { repository }
    }

    /// Email must not match any existing candidate (exact, case-sensitive).
    pub async fn create_candidate(&self, payload: CreateCandidatePayload) -> Result<Candidate> {
        let existing = self.repository.find_all().await?;
        if existing.iter().any(|c| c.email == payload.email) {
            tracing::warn!(email = %payload.email, "rejected candidate with duplicate email");
            return Err(Error::duplicate_email());
        }

        let candidate = self.repository.create(&payload).await?;
        tracing::info!(candidate_id = %candidate.id, "candidate created");
        Ok(candidate)
    }

    pub async fn get_all_candidates(&self) -> Result<Vec<Candidate>> {
        self.repository.find_all().await
    }

    pub async fn get_candidate_by_id(&self, id: Uuid) -> Result<Candidate> {
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            tracing::debug!(candidate_id = %id, "candidate not found");
            Error::candidate_not_found()
        })
    }

    /// Patches scalars and replaces all child collections. A changed email is
    /// checked against every other candidate; keeping the current one is allowed.
    pub async fn update_candidate(
        &self,
        id: Uuid,
        payload: UpdateCandidatePayload,
    ) -> Result<Candidate> {
        let existing = self.get_candidate_by_id(id).await?;

        if let Some(email) = payload.email.as_deref() {
            if email != existing.email {
                let taken = self
                    .repository
                    .find_all()
                    .await?
                    .iter()
                    .any(|c| c.email == email && c.id != id);
                if taken {
                    tracing::warn!(candidate_id = %id, email, "rejected update to duplicate email");
                    return Err(Error::duplicate_email());
                }
            }
        }

        let candidate = self.repository.update(id, &payload).await?;
        tracing::info!(
            candidate_id = %candidate.id,
            educations = candidate.educations.len(),
            work_experiences = candidate.work_experiences.len(),
            "candidate updated"
        );
        Ok(candidate)
    }

    pub async fn delete_candidate(&self, id: Uuid) -> Result<()> {
        self.get_candidate_by_id(id).await?;
        self.repository.delete(id).await?;
        tracing::info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }
}
