//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and notifier calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod bulk_service;
pub mod reminder_service;
pub mod selection;
pub mod space_service;
