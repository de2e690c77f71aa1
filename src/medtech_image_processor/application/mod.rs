pub mod error;
pub mod phase_service;
