//! Social support application wizard.
//!
//! A terminal application that walks an applicant through three validated
//! steps, keeps the draft on disk between sessions, offers AI drafting help
//! for the free-text answers and submits the finished application.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use application::*;
pub use domain::*;
