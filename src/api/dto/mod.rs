//! Data Transfer Objects for REST request/response serialization.
//!
//! Service results that are already `Serialize` are returned as-is; the
//! types here cover request bodies, query strings and views that must
//! hide data (quiz answers).

pub mod common_dto;
pub mod learning_dto;
pub mod social_dto;
pub mod user_dto;

pub use common_dto::*;
pub use learning_dto::*;
pub use social_dto::*;
pub use user_dto::*;
