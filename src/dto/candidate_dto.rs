use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::nullable::{double_option, null_as_default};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EducationPayload {
    pub institution: String,
    pub title: String,
    /// Calendar date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    pub start_date: String,
    /// Absent, `null` or empty means ongoing.
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperiencePayload {
    pub company: String,
    pub position: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CvPayload {
    pub file_path: String,
    pub file_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidatePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub educations: Option<Vec<EducationPayload>>,
    pub work_experiences: Option<Vec<WorkExperiencePayload>>,
    pub cv: Option<CvPayload>,
}

/// Partial update. Scalars patch only when present; child collections and the
/// CV are always replaced, so omitting `educations` clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(length(min = 1))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    pub educations: Option<Vec<EducationPayload>>,
    pub work_experiences: Option<Vec<WorkExperiencePayload>>,
    pub cv: Option<CvPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_fields_fail_validation() {
        let payload: CreateCandidatePayload =
            serde_json::from_str(r#"{"lastName":"Doe","email":"john@x.com"}"#).unwrap();
        assert!(payload.first_name.is_empty());
        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_payload_keeps_absent_children_as_none() {
        let payload: UpdateCandidatePayload =
            serde_json::from_str(r#"{"firstName":"Jane","address":null}"#).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.educations, None);
        assert_eq!(payload.phone, None);
        assert_eq!(payload.address, Some(None));
    }

    #[test]
    fn update_rejects_empty_email() {
        let payload = UpdateCandidatePayload {
            email: Some(String::new()),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }
}
