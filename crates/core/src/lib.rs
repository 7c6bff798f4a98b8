//! Domain logic for the log-pattern trigger form.
//!
//! Everything in this crate is pure: request field validation, the trigger
//! expression constructor, severity and status enums, and audit message
//! formatting. I/O lives in `logtrigger-db` and `logtrigger-api`.

pub mod audit;
pub mod error;
pub mod expression;
pub mod form_fields;
pub mod roles;
pub mod trigger;
pub mod types;
