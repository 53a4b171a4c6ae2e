//! Subscriber profile entity and the conditional field-update policy.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Picture URL used when no file was uploaded. Never deleted from disk.
pub const PLACEHOLDER_PICTURE_URL: &str = "/placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotPaid,
    Partial,
    Full,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_paid" => Some(Self::NotPaid),
            "partial" => Some(Self::Partial),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotPaid => "not_paid",
            Self::Partial => "partial",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Inactive,
}

impl ProfileStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub student_number: String,
    pub degree_program: String,
    pub picture_url: String,
    pub package: String,
    pub has_paid: bool,
    pub payment_status: PaymentStatus,
    pub partial_amount: Option<f64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_claimed: bool,
    pub claim_date: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub facebook_account: Option<String>,
    pub email: Option<String>,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated creation payload (parsed from the multipart form).
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub full_name: String,
    pub student_number: String,
    pub degree_program: String,
    pub package: String,
    pub payment_status: PaymentStatus,
    pub partial_amount: Option<f64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_claimed: bool,
    pub claim_date: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub facebook_account: Option<String>,
    pub email: Option<String>,
}

impl NewProfile {
    /// Build the full row. Claim fields follow the same policy as updates:
    /// claiming requires full payment, defaults the claim date to now, and
    /// marks the profile inactive.
    pub fn into_profile(
        self,
        id: Uuid,
        picture_url: String,
        now: DateTime<Utc>,
    ) -> Result<Profile, AppError> {
        let mut status = ProfileStatus::Active;
        let (claim_date, claimed_by) = if self.is_claimed {
            if self.payment_status != PaymentStatus::Full {
                return Err(AppError::Validation(
                    "cannot claim a profile without full payment".into(),
                ));
            }
            status = ProfileStatus::Inactive;
            (
                Some(self.claim_date.unwrap_or(now)),
                Some(self.claimed_by.unwrap_or_default()),
            )
        } else {
            (None, None)
        };
        Ok(Profile {
            id,
            full_name: self.full_name,
            student_number: self.student_number,
            degree_program: self.degree_program,
            picture_url,
            package: self.package,
            has_paid: self.payment_status == PaymentStatus::Full,
            payment_status: self.payment_status,
            partial_amount: self.partial_amount,
            payment_date: self.payment_date,
            is_claimed: self.is_claimed,
            claim_date,
            claimed_by,
            facebook_account: self.facebook_account,
            email: self.email,
            status,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update payload. `None` means "not supplied, leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub student_number: Option<String>,
    pub degree_program: Option<String>,
    pub package: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub partial_amount: Option<f64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_claimed: Option<bool>,
    pub claim_date: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub status: Option<ProfileStatus>,
    pub facebook_account: Option<String>,
    pub email: Option<String>,
    /// Set by the handler after a new picture has been stored.
    pub picture_url: Option<String>,
}

/// Apply a patch to an existing profile and return the new row state.
///
/// Field policy, in order:
/// - `payment_status` also derives `has_paid`.
/// - claiming requires the resulting payment status to be `full`, defaults
///   `claim_date`/`claimed_by`, and marks the profile inactive; unclaiming
///   clears both claim fields.
/// - an explicit `status` wins over the one implied by claiming.
pub fn apply_patch(
    existing: &Profile,
    patch: ProfilePatch,
    now: DateTime<Utc>,
) -> Result<Profile, AppError> {
    let mut next = existing.clone();

    if let Some(v) = patch.full_name {
        next.full_name = v;
    }
    if let Some(v) = patch.student_number {
        next.student_number = v;
    }
    if let Some(v) = patch.degree_program {
        next.degree_program = v;
    }
    if let Some(v) = patch.package {
        next.package = v;
    }
    if let Some(v) = patch.partial_amount {
        next.partial_amount = Some(v);
    }
    if let Some(v) = patch.payment_date {
        next.payment_date = Some(v);
    }
    if let Some(v) = patch.payment_status {
        next.payment_status = v;
        next.has_paid = v == PaymentStatus::Full;
    }

    match patch.is_claimed {
        Some(true) => {
            if next.payment_status != PaymentStatus::Full {
                return Err(AppError::Validation(
                    "cannot claim a profile without full payment".into(),
                ));
            }
            next.is_claimed = true;
            next.claim_date = Some(patch.claim_date.unwrap_or(now));
            next.claimed_by = Some(patch.claimed_by.unwrap_or_default());
            next.status = ProfileStatus::Inactive;
        }
        Some(false) => {
            next.is_claimed = false;
            next.claim_date = None;
            next.claimed_by = None;
        }
        None => {}
    }

    if let Some(v) = patch.status {
        next.status = v;
    }
    if let Some(v) = patch.facebook_account {
        next.facebook_account = Some(v);
    }
    if let Some(v) = patch.email {
        next.email = Some(v);
    }
    if let Some(v) = patch.picture_url {
        next.picture_url = v;
    }
    next.updated_at = now;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            full_name: "Maria Santos".into(),
            student_number: "2020-01234".into(),
            degree_program: "BS Computer Science".into(),
            picture_url: PLACEHOLDER_PICTURE_URL.into(),
            package: "With Frame".into(),
            has_paid: false,
            payment_status: PaymentStatus::NotPaid,
            partial_amount: None,
            payment_date: None,
            is_claimed: false,
            claim_date: None,
            claimed_by: None,
            facebook_account: None,
            email: None,
            status: ProfileStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payment_status_derives_has_paid() {
        let existing = sample_profile();
        let now = Utc::now();
        let full = apply_patch(
            &existing,
            ProfilePatch {
                payment_status: Some(PaymentStatus::Full),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert!(full.has_paid);

        let partial = apply_patch(
            &full,
            ProfilePatch {
                payment_status: Some(PaymentStatus::Partial),
                partial_amount: Some(250.0),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert!(!partial.has_paid);
        assert_eq!(partial.partial_amount, Some(250.0));
    }

    #[test]
    fn claiming_requires_full_payment() {
        let existing = sample_profile();
        let err = apply_patch(
            &existing,
            ProfilePatch {
                is_claimed: Some(true),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Paying in full and claiming in the same request is allowed.
        let claimed = apply_patch(
            &existing,
            ProfilePatch {
                payment_status: Some(PaymentStatus::Full),
                is_claimed: Some(true),
                claimed_by: Some("Tita Nena".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(claimed.is_claimed);
        assert!(claimed.claim_date.is_some());
        assert_eq!(claimed.claimed_by.as_deref(), Some("Tita Nena"));
        assert_eq!(claimed.status, ProfileStatus::Inactive);
    }

    #[test]
    fn claiming_defaults_claim_fields() {
        let mut existing = sample_profile();
        existing.payment_status = PaymentStatus::Full;
        existing.has_paid = true;
        let now = Utc::now();
        let claimed = apply_patch(
            &existing,
            ProfilePatch {
                is_claimed: Some(true),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(claimed.claim_date, Some(now));
        assert_eq!(claimed.claimed_by.as_deref(), Some(""));
    }

    #[test]
    fn unclaiming_clears_claim_fields() {
        let mut existing = sample_profile();
        existing.payment_status = PaymentStatus::Full;
        existing.has_paid = true;
        existing.is_claimed = true;
        existing.claim_date = Some(Utc::now());
        existing.claimed_by = Some("Kuya Ben".into());
        existing.status = ProfileStatus::Inactive;

        let unclaimed = apply_patch(
            &existing,
            ProfilePatch {
                is_claimed: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(!unclaimed.is_claimed);
        assert!(unclaimed.claim_date.is_none());
        assert!(unclaimed.claimed_by.is_none());
        // Status stays as it was unless explicitly changed.
        assert_eq!(unclaimed.status, ProfileStatus::Inactive);
    }

    #[test]
    fn explicit_status_wins_over_claim_implied_status() {
        let mut existing = sample_profile();
        existing.payment_status = PaymentStatus::Full;
        existing.has_paid = true;
        let updated = apply_patch(
            &existing,
            ProfilePatch {
                is_claimed: Some(true),
                status: Some(ProfileStatus::Active),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(updated.is_claimed);
        assert_eq!(updated.status, ProfileStatus::Active);
    }

    #[test]
    fn absent_fields_stay_untouched() {
        let existing = sample_profile();
        let now = Utc::now();
        let updated = apply_patch(
            &existing,
            ProfilePatch {
                full_name: Some("Maria Clara Santos".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(updated.full_name, "Maria Clara Santos");
        assert_eq!(updated.student_number, existing.student_number);
        assert_eq!(updated.payment_status, existing.payment_status);
        assert_eq!(updated.picture_url, existing.picture_url);
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.created_at, existing.created_at);
    }

    #[test]
    fn new_profile_claim_policy_matches_updates() {
        let base = NewProfile {
            full_name: "Jose Rizal".into(),
            student_number: "2019-00001".into(),
            degree_program: "BA History".into(),
            package: "Basic Package".into(),
            payment_status: PaymentStatus::NotPaid,
            partial_amount: None,
            payment_date: None,
            is_claimed: true,
            claim_date: None,
            claimed_by: None,
            facebook_account: None,
            email: None,
        };
        let err = base
            .clone()
            .into_profile(Uuid::new_v4(), PLACEHOLDER_PICTURE_URL.into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut paid = base;
        paid.payment_status = PaymentStatus::Full;
        let profile = paid
            .into_profile(Uuid::new_v4(), PLACEHOLDER_PICTURE_URL.into(), Utc::now())
            .unwrap();
        assert!(profile.has_paid);
        assert_eq!(profile.status, ProfileStatus::Inactive);
        assert!(profile.claim_date.is_some());
    }

    #[test]
    fn profile_serializes_camel_case() {
        let profile = sample_profile();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("studentNumber").is_some());
        assert!(json.get("pictureUrl").is_some());
        assert_eq!(json["paymentStatus"], "not_paid");
        assert_eq!(json["status"], "active");
    }
}
