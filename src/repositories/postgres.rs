use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::children::NewChildren;
use super::CandidateRepository;
use crate::dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateRow, Cv, Education, WorkExperience};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgCandidateRepository {
    pool: PgPool,
}

/// Children of the persisted aggregate, as written or loaded.
#[derive(Debug, Default)]
struct PersistedChildren {
    educations: Vec<Education>,
    work_experiences: Vec<WorkExperience>,
    cv: Option<Cv>,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_children(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, PersistedChildren>> {
        let mut by_candidate: HashMap<Uuid, PersistedChildren> = HashMap::new();
        if ids.is_empty() {
            return Ok(by_candidate);
        }

        let educations = sqlx::query_as::<_, Education>(
            r#"
            SELECT id, candidate_id, institution, title, start_date, end_date, created_at, updated_at
            FROM educations
            WHERE candidate_id = ANY($1)
            ORDER BY candidate_id, sort_order
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let work_experiences = sqlx::query_as::<_, WorkExperience>(
            r#"
            SELECT id, candidate_id, company, position, description,
                   start_date, end_date, created_at, updated_at
            FROM work_experiences
            WHERE candidate_id = ANY($1)
            ORDER BY candidate_id, sort_order
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let cvs = sqlx::query_as::<_, Cv>(
            r#"
            SELECT id, candidate_id, file_path, file_type, created_at, updated_at
            FROM cvs
            WHERE candidate_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for education in educations {
            by_candidate
                .entry(education.candidate_id)
                .or_default()
                .educations
                .push(education);
        }
        for experience in work_experiences {
            by_candidate
                .entry(experience.candidate_id)
                .or_default()
                .work_experiences
                .push(experience);
        }
        for cv in cvs {
            let owner = cv.candidate_id;
            by_candidate.entry(owner).or_default().cv = Some(cv);
        }

        Ok(by_candidate)
    }

    async fn assemble(&self, rows: Vec<CandidateRow>) -> Result<Vec<Candidate>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut children = self.load_children(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let owned = children.remove(&row.id).unwrap_or_default();
                row.into_candidate(owned.educations, owned.work_experiences, owned.cv)
            })
            .collect())
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn create(&self, payload: &CreateCandidatePayload) -> Result<Candidate> {
        let children = NewChildren::from_create(payload)?;

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates (first_name, last_name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, phone, address, created_at, updated_at
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let persisted = insert_children(&mut *tx, row.id, &children).await?;
        tx.commit().await?;

        Ok(row.into_candidate(persisted.educations, persisted.work_experiences, persisted.cv))
    }

    async fn find_all(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, first_name, last_name, email, phone, address, created_at, updated_at
            FROM candidates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, first_name, last_name, email, phone, address, created_at, updated_at
            FROM candidates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, payload: &UpdateCandidatePayload) -> Result<Candidate> {
        let children = NewChildren::from_update(payload)?;

        let mut tx = self.pool.begin().await?;
        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM candidates WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(Error::candidate_not_found());
        }

        let persisted = replace_children(&mut *tx, id, &children).await?;

        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = CASE WHEN $5 THEN $6 ELSE phone END,
                address = CASE WHEN $7 THEN $8 ELSE address END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, address, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(payload.phone.is_some())
        .bind(payload.phone.clone().flatten())
        .bind(payload.address.is_some())
        .bind(payload.address.clone().flatten())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;

        Ok(row.into_candidate(persisted.educations, persisted.work_experiences, persisted.cv))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::candidate_not_found());
        }
        Ok(())
    }
}

/// Deletes every education, work experience and CV of the candidate, then writes
/// `children` in their place. Runs on the caller's connection so it shares the
/// update transaction.
async fn replace_children(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    children: &NewChildren,
) -> Result<PersistedChildren> {
    let removed_educations = sqlx::query("DELETE FROM educations WHERE candidate_id = $1")
        .bind(candidate_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    let removed_experiences = sqlx::query("DELETE FROM work_experiences WHERE candidate_id = $1")
        .bind(candidate_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM cvs WHERE candidate_id = $1")
        .bind(candidate_id)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(
        %candidate_id,
        removed_educations,
        removed_experiences,
        new_educations = children.educations.len(),
        new_experiences = children.work_experiences.len(),
        "replacing candidate children"
    );

    insert_children(conn, candidate_id, children).await
}

async fn insert_children(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    children: &NewChildren,
) -> Result<PersistedChildren> {
    let mut persisted = PersistedChildren::default();

    for (sort_order, education) in children.educations.iter().enumerate() {
        let row = sqlx::query_as::<_, Education>(
            r#"
            INSERT INTO educations (candidate_id, sort_order, institution, title, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, candidate_id, institution, title, start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(sort_order as i32)
        .bind(&education.institution)
        .bind(&education.title)
        .bind(education.start_date)
        .bind(education.end_date)
        .fetch_one(&mut *conn)
        .await?;
        persisted.educations.push(row);
    }

    for (sort_order, experience) in children.work_experiences.iter().enumerate() {
        let row = sqlx::query_as::<_, WorkExperience>(
            r#"
            INSERT INTO work_experiences
                (candidate_id, sort_order, company, position, description, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, candidate_id, company, position, description,
                      start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(sort_order as i32)
        .bind(&experience.company)
        .bind(&experience.position)
        .bind(&experience.description)
        .bind(experience.start_date)
        .bind(experience.end_date)
        .fetch_one(&mut *conn)
        .await?;
        persisted.work_experiences.push(row);
    }

    if let Some(cv) = &children.cv {
        let row = sqlx::query_as::<_, Cv>(
            r#"
            INSERT INTO cvs (candidate_id, file_path, file_type)
            VALUES ($1, $2, $3)
            RETURNING id, candidate_id, file_path, file_type, created_at, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(&cv.file_path)
        .bind(&cv.file_type)
        .fetch_one(&mut *conn)
        .await?;
        persisted.cv = Some(row);
    }

    Ok(persisted)
}

/// The email index backs up the service-level uniqueness scan.
fn map_write_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return Error::duplicate_email();
        }
    }
    Error::from(err)
}
