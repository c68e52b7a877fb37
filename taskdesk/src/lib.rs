//! `TaskDesk`: terminal client for a REST task-management backend.
//!
//! Task changes are applied to the local list immediately and reconciled
//! with the server afterwards (see [`optimistic`] and [`tasks`]).

pub mod admin;
pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod feedback;
pub mod notify;
pub mod optimistic;
pub mod session;
pub mod tasks;
pub mod ui;
