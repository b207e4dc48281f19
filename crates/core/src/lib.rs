//! `casedesk-core` — shared record types for the case-management client.
//!
//! This crate contains **plain data** mirrored from the upstream REST API plus
//! the inline validation rules the form screens apply before submitting. No IO.

pub mod error;
pub mod id;
pub mod models;
pub mod validation;

pub use error::DomainError;
pub use id::{CaseId, ClientId, CompanyId, DocumentId, FoiaCaseId, UserId, WorkflowId};
pub use models::*;
pub use validation::FieldError;
