//! Domain layer - Pure business abstractions
//!
//! Error types, closed enums, validation rules, pagination and the image
//! storage trait. Nothing here knows about axum.

pub mod enums;
pub mod errors;
pub mod pagination;
pub mod storage;
pub mod validation;

pub use enums::{OrderStatus, UserRole};
pub use errors::DomainError;
pub use pagination::{Page, PageRequest};
pub use storage::{ImageStore, ImageUpload};
