//! Route handlers: auth, profile CRUD, remark CRUD.

pub mod auth;
pub mod profile;
pub mod remark;
