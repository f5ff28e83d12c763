//! Core business logic for myblog.

pub mod services;

pub use services::*;
