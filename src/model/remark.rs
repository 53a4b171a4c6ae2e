//! Free-form remarks attached to a profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "remark_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RemarkType {
    Suggestion,
    Complaint,
    Request,
}

impl RemarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::Complaint => "complaint",
            Self::Request => "request",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: RemarkType,
    pub date: DateTime<Utc>,
    pub made_by: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemark {
    pub profile_id: Uuid,
    #[serde(rename = "type")]
    pub kind: RemarkType,
    pub made_by: String,
    pub title: String,
    pub body: String,
}

/// Partial remark update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarkPatch {
    #[serde(rename = "type")]
    pub kind: Option<RemarkType>,
    pub made_by: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_remark_deserializes_wire_shape() {
        let payload = serde_json::json!({
            "profileId": "7f8b0f8e-59a9-4f3e-9a61-0b9f6f5f2f10",
            "type": "complaint",
            "madeBy": "front desk",
            "title": "Wrong frame",
            "body": "Subscriber got the plain frame instead of the ornate one."
        });
        let remark: NewRemark = serde_json::from_value(payload).unwrap();
        assert_eq!(remark.kind, RemarkType::Complaint);
        assert_eq!(remark.made_by, "front desk");
    }

    #[test]
    fn unknown_remark_type_is_rejected() {
        let payload = serde_json::json!({
            "profileId": "7f8b0f8e-59a9-4f3e-9a61-0b9f6f5f2f10",
            "type": "praise",
            "madeBy": "x",
            "title": "t",
            "body": "b"
        });
        assert!(serde_json::from_value::<NewRemark>(payload).is_err());
    }

    #[test]
    fn patch_defaults_to_no_changes() {
        let patch: RemarkPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.kind.is_none());
        assert!(patch.made_by.is_none());
        assert!(patch.title.is_none());
        assert!(patch.body.is_none());
    }
}
