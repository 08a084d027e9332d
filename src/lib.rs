//! Serve a pre-trained tabular classifier over HTTP.
/// Server configuration.
pub mod config;
/// Shared application state.
pub mod context;
/// HTML test form.
pub mod form;
/// Tracing setup.
pub mod logging;
/// Feature list and label map loading.
pub mod metadata;
/// Model artifacts and inference.
pub mod model;
/// Prediction and response shaping.
pub mod predict;
/// Per-request feature rows.
pub mod row;
/// Request validation.
pub mod schema;
/// HTTP routing and handlers.
pub mod server;
