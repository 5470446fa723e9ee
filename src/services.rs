pub mod auth;
pub mod consolidated_service;
pub mod login_gate;
pub mod scope_service;
