//! Shared wire definitions for the `TaskDesk` REST contract.
//!
//! Every type here mirrors a JSON body exchanged with the backend. Field
//! names follow the server (`_id`, `dueDate`, `createdAt`), not Rust style.

pub mod admin;
pub mod error;
pub mod feedback;
pub mod task;
pub mod user;
