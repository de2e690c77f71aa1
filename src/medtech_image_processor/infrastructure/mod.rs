pub mod axum_handler;
pub mod config;
pub mod error;
pub mod image_processor;
pub mod router;
