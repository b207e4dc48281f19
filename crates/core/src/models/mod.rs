//! Records mirrored from API responses.
//!
//! Field names follow the upstream JSON (camelCase, `_id` accepted for `id`).
//! Almost everything is optional: the API omits fields freely and these types
//! carry no invariants beyond presence.

pub mod billing;
pub mod case;
pub mod client;
pub mod company;
pub mod document;
pub mod foia;
pub mod workflow;

pub use billing::{Plan, Subscription, SubscriptionStatus, SubscribeRequest};
pub use case::{Case, CaseInput, CaseStatus};
pub use client::{Client, ClientInput};
pub use company::{Company, CompanyInput};
pub use document::{Document, DocumentStatus, DocumentUpload, DownloadedDocument};
pub use foia::{FoiaCase, FoiaRequest, FoiaStatusReport};
pub use workflow::{ClientRef, Workflow, WorkflowInput};
