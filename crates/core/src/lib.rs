//! `easyerp-core` — shared domain building blocks for the EasyERP ledger.
//!
//! Pure domain primitives only: errors, identifiers and the aggregate/entity
//! vocabulary the accounting crate is written against. No IO lives here.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, UserId};
pub use value_object::ValueObject;
