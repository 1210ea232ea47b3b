//! Portfolio redirect service
//!
//! Accepts an uploaded image plus a target URL and produces a downloadable
//! document that shows the image and forwards the viewer to the target.

pub mod error;
pub mod generator;
pub mod models;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validation;
