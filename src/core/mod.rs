//! Core gateway: quota, sessions, fallback orchestration

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod quota;
pub mod session;
