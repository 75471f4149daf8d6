// Core modules: path rules, persistence, export naming, launch, and the action itself.
pub mod action;
pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod launch;
pub mod platform;
pub mod resolve;
