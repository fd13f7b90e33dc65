//! Core business logic for QR Pulse.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `session` - First-seen register deciding new vs returning visitors
//! - `analytics` - Region, cluster and branch roll-ups of visitor activity

pub mod analytics;
pub mod session;
