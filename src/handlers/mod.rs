//! HTTP handlers for entity CRUD and analytics.

pub mod analytics;
pub mod entity;
