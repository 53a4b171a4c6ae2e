//! Domain entities and request payloads.

pub mod profile;
pub mod remark;
pub mod user;

pub use profile::{NewProfile, PaymentStatus, Profile, ProfilePatch, ProfileStatus};
pub use remark::{NewRemark, Remark, RemarkPatch, RemarkType};
pub use user::{User, UserInfo};
