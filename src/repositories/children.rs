use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::candidate_dto::{
    CreateCandidatePayload, CvPayload, EducationPayload, UpdateCandidatePayload,
    WorkExperiencePayload,
};
use crate::error::{Error, Result};
use crate::models::candidate::{Cv, Education, WorkExperience};
use crate::utils::time::parse_form_date;

#[derive(Debug, Clone, PartialEq)]
pub struct NewEducation {
    pub institution: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkExperience {
    pub company: String,
    pub position: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCv {
    pub file_path: String,
    pub file_type: String,
}

/// Child records built from a request, ready to be written under one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewChildren {
    pub educations: Vec<NewEducation>,
    pub work_experiences: Vec<NewWorkExperience>,
    pub cv: Option<NewCv>,
}

impl NewChildren {
    pub fn from_create(payload: &CreateCandidatePayload) -> Result<Self> {
        Self::build(
            payload.educations.as_deref(),
            payload.work_experiences.as_deref(),
            payload.cv.as_ref(),
        )
    }

    pub fn from_update(payload: &UpdateCandidatePayload) -> Result<Self> {
        Self::build(
            payload.educations.as_deref(),
            payload.work_experiences.as_deref(),
            payload.cv.as_ref(),
        )
    }

    fn build(
        educations: Option<&[EducationPayload]>,
        work_experiences: Option<&[WorkExperiencePayload]>,
        cv: Option<&CvPayload>,
    ) -> Result<Self> {
        let educations = educations
            .unwrap_or_default()
            .iter()
            .map(NewEducation::try_from)
            .collect::<Result<Vec<_>>>()?;
        let work_experiences = work_experiences
            .unwrap_or_default()
            .iter()
            .map(NewWorkExperience::try_from)
            .collect::<Result<Vec<_>>>()?;
        let cv = cv.map(|cv| NewCv {
            file_path: cv.file_path.clone(),
            file_type: cv.file_type.clone(),
        });

        Ok(Self {
            educations,
            work_experiences,
            cv,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.educations.is_empty() && self.work_experiences.is_empty() && self.cv.is_none()
    }
}

impl TryFrom<&EducationPayload> for NewEducation {
    type Error = Error;

    fn try_from(entry: &EducationPayload) -> Result<Self> {
        Ok(Self {
            institution: entry.institution.clone(),
            title: entry.title.clone(),
            start_date: required_date("startDate", &entry.start_date)?,
            end_date: optional_date("endDate", entry.end_date.as_deref())?,
        })
    }
}

impl TryFrom<&WorkExperiencePayload> for NewWorkExperience {
    type Error = Error;

    fn try_from(entry: &WorkExperiencePayload) -> Result<Self> {
        Ok(Self {
            company: entry.company.clone(),
            position: entry.position.clone(),
            // Educations have no description; work experiences store "" rather than NULL.
            description: entry.description.clone().unwrap_or_default(),
            start_date: required_date("startDate", &entry.start_date)?,
            end_date: optional_date("endDate", entry.end_date.as_deref())?,
        })
    }
}

impl NewEducation {
    pub fn into_education(self, candidate_id: Uuid, at: DateTime<Utc>) -> Education {
        Education {
            id: Uuid::new_v4(),
            candidate_id,
            institution: self.institution,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: at,
            updated_at: at,
        }
    }
}

impl NewWorkExperience {
    pub fn into_work_experience(self, candidate_id: Uuid, at: DateTime<Utc>) -> WorkExperience {
        WorkExperience {
            id: Uuid::new_v4(),
            candidate_id,
            company: self.company,
            position: self.position,
            description: Some(self.description),
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: at,
            updated_at: at,
        }
    }
}

impl NewCv {
    pub fn into_cv(self, candidate_id: Uuid, at: DateTime<Utc>) -> Cv {
        Cv {
            id: Uuid::new_v4(),
            candidate_id,
            file_path: self.file_path,
            file_type: self.file_type,
            created_at: at,
            updated_at: at,
        }
    }
}

fn required_date(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_form_date(raw)
        .ok_or_else(|| Error::BadRequest(format!("Invalid {}: '{}'", field, raw)))
}

fn optional_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => required_date(field, raw).map(Some),
        _ => Ok(None),
    }
}
