use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::children::NewChildren;
use super::CandidateRepository;
use crate::dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::utils::time::now;

/// Process-local candidate store with the same observable behaviour as the
/// Postgres repository, including the unique email backstop. Candidates are
/// kept in creation order.
#[derive(Debug, Default)]
pub struct InMemoryCandidateRepository {
    candidates: Mutex<Vec<Candidate>>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Candidate>>> {
        self.candidates
            .lock()
            .map_err(|_| Error::Internal("candidate store lock poisoned".to_string()))
    }
}

/// Mirrors the `candidates_email_key` unique index. Checked under the lock.
fn ensure_email_free(
    candidates: &[Candidate],
    email: &str,
    except: Option<Uuid>,
) -> Result<()> {
    let taken = candidates
        .iter()
        .any(|c| c.email == email && Some(c.id) != except);
    if taken {
        return Err(Error::duplicate_email());
    }
    Ok(())
}

/// Replaces the candidate's educations, work experiences and CV wholesale.
fn replace_children(candidate: &mut Candidate, children: NewChildren) {
    let at = now();
    let id = candidate.id;
    tracing::debug!(
        candidate_id = %id,
        removed_educations = candidate.educations.len(),
        removed_experiences = candidate.work_experiences.len(),
        new_educations = children.educations.len(),
        new_experiences = children.work_experiences.len(),
        "replacing candidate children"
    );

    candidate.educations = children
        .educations
        .into_iter()
        .map(|e| e.into_education(id, at))
        .collect();
    candidate.work_experiences = children
        .work_experiences
        .into_iter()
        .map(|w| w.into_work_experience(id, at))
        .collect();
    candidate.cv = children.cv.map(|cv| cv.into_cv(id, at));
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn create(&self, payload: &CreateCandidatePayload) -> Result<Candidate> {
        let children = NewChildren::from_create(payload)?;
        let at = now();
        let mut candidate = Candidate {
            id: Uuid::new_v4(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            address: payload.address.clone(),
            educations: Vec::new(),
            work_experiences: Vec::new(),
            cv: None,
            created_at: at,
            updated_at: at,
        };
        replace_children(&mut candidate, children);

        let mut candidates = self.lock()?;
        ensure_email_free(&candidates, &candidate.email, None)?;
        candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn find_all(&self) -> Result<Vec<Candidate>> {
        Ok(self.lock()?.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.lock()?.iter().find(|c| c.id == id).cloned())
    }

    async fn update(&self, id: Uuid, payload: &UpdateCandidatePayload) -> Result<Candidate> {
        let children = NewChildren::from_update(payload)?;

        let mut candidates = self.lock()?;
        let index = candidates
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(Error::candidate_not_found)?;
        if let Some(email) = &payload.email {
            ensure_email_free(&candidates, email, Some(id))?;
        }
        let candidate = &mut candidates[index];

        replace_children(candidate, children);

        if let Some(first_name) = &payload.first_name {
            candidate.first_name = first_name.clone();
        }
        if let Some(last_name) = &payload.last_name {
            candidate.last_name = last_name.clone();
        }
        if let Some(email) = &payload.email {
            candidate.email = email.clone();
        }
        if let Some(phone) = &payload.phone {
            candidate.phone = phone.clone();
        }
        if let Some(address) = &payload.address {
            candidate.address = address.clone();
        }
        candidate.updated_at = now();

        Ok(candidate.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut candidates = self.lock()?;
        let before = candidates.len();
        candidates.retain(|c| c.id != id);
        if candidates.len() == before {
            return Err(Error::candidate_not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::candidate_dto::{CvPayload, EducationPayload};

    fn payload(email: &str) -> CreateCandidatePayload {
        CreateCandidatePayload {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn with_education(email: &str) -> CreateCandidatePayload {
        CreateCandidatePayload {
            educations: Some(vec![EducationPayload {
                institution: "MIT".into(),
                title: "CS".into(),
                start_date: "2020-01-01".into(),
                end_date: Some("2022-01-01".into()),
            }]),
            cv: Some(CvPayload {
                file_path: "/cv/john.pdf".into(),
                file_type: "application/pdf".into(),
            }),
            ..payload(email)
        }
    }

    #[tokio::test]
    async fn create_without_children_has_no_cv() {
        let repo = InMemoryCandidateRepository::new();
        let candidate = repo.create(&payload("john@x.com")).await.unwrap();

        assert!(candidate.educations.is_empty());
        assert!(candidate.work_experiences.is_empty());
        assert_eq!(candidate.cv, None);
    }

    #[tokio::test]
    async fn children_point_at_their_candidate() {
        let repo = InMemoryCandidateRepository::new();
        let candidate = repo.create(&with_education("john@x.com")).await.unwrap();

        assert_eq!(candidate.educations[0].candidate_id, candidate.id);
        assert_eq!(candidate.cv.as_ref().unwrap().candidate_id, candidate.id);
    }

    #[tokio::test]
    async fn find_all_is_newest_first() {
        let repo = InMemoryCandidateRepository::new();
        let first = repo.create(&payload("a@x.com")).await.unwrap();
        let second = repo.create(&payload("b@x.com")).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn scalar_only_update_wipes_children() {
        let repo = InMemoryCandidateRepository::new();
        let created = repo.create(&with_education("john@x.com")).await.unwrap();
        assert_eq!(created.educations.len(), 1);

        let update = UpdateCandidatePayload {
            first_name: Some("Johnny".into()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.first_name, "Johnny");
        assert_eq!(updated.last_name, "Doe");
        assert!(updated.educations.is_empty());
        assert_eq!(updated.cv, None);

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.educations.is_empty());
    }

    #[tokio::test]
    async fn update_distinguishes_null_from_absent() {
        let repo = InMemoryCandidateRepository::new();
        let created = repo
            .create(&CreateCandidatePayload {
                phone: Some("555".into()),
                address: Some("Main St".into()),
                ..payload("john@x.com")
            })
            .await
            .unwrap();

        let update = UpdateCandidatePayload {
            phone: Some(None),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.phone, None);
        assert_eq!(updated.address.as_deref(), Some("Main St"));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let repo = InMemoryCandidateRepository::new();
        let missing = Uuid::new_v4();

        let update = repo.update(missing, &UpdateCandidatePayload::default()).await;
        assert!(matches!(update, Err(Error::NotFound(_))));
        assert!(matches!(repo.delete(missing).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn store_rejects_duplicate_email_without_the_service() {
        let repo = InMemoryCandidateRepository::new();
        let first = repo.create(&payload("a@x.com")).await.unwrap();
        let second = repo.create(&payload("b@x.com")).await.unwrap();

        assert!(matches!(
            repo.create(&payload("a@x.com")).await,
            Err(Error::DuplicateEmail(_))
        ));
        assert_eq!(repo.find_all().await.unwrap().len(), 2);

        let steal = UpdateCandidatePayload {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(second.id, &steal).await,
            Err(Error::DuplicateEmail(_))
        ));

        let keep = UpdateCandidatePayload {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert_eq!(repo.update(first.id, &keep).await.unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn delete_removes_aggregate() {
        let repo = InMemoryCandidateRepository::new();
        let created = repo.create(&with_education("john@x.com")).await.unwrap();

        repo.delete(created.id).await.unwrap();

        assert_eq!(repo.find_by_id(created.id).await.unwrap(), None);
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_child_date_leaves_candidate_untouched() {
        let repo = InMemoryCandidateRepository::new();
        let created = repo.create(&with_education("john@x.com")).await.unwrap();

        let update = UpdateCandidatePayload {
            first_name: Some("Changed".into()),
            educations: Some(vec![EducationPayload {
                institution: "MIT".into(),
                title: "CS".into(),
                start_date: "soon".into(),
                end_date: None,
            }]),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(created.id, &update).await,
            Err(Error::BadRequest(_))
        ));

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }
}
