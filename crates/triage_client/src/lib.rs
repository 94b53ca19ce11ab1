//! Operator-side incident triage: the REST service client, the session it runs
//! under, the list store and the detail editor.

pub mod config;
pub mod detail;
pub mod error;
mod http;
pub mod service;
pub mod session;
pub mod store;

pub use config::ClientConfig;
pub use detail::IncidentEditor;
pub use error::ServiceError;
pub use service::{HttpIncidentService, IncidentService};
pub use session::{AccessToken, Session};
pub use store::{IncidentStore, LoadState, Ticket};
