//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn query results into live snapshots for the presentation layer.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod category_service;
pub mod clock;
pub mod onboarding;
pub mod statistics_service;
pub mod tracker_service;
