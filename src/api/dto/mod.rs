//! Data Transfer Objects for REST request/response serialization.

pub mod auth_dto;
pub mod waitlist_dto;

pub use auth_dto::*;
pub use waitlist_dto::*;
