//! Database access, one store per table.

pub mod profiles;
pub mod remarks;
pub mod users;

pub use profiles::{ProfileListQuery, ProfileStore, SortOrder};
pub use remarks::RemarkStore;
pub use users::UserStore;
