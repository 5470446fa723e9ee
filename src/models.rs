pub mod auth;
pub mod consolidated;
pub mod identity;
pub mod scope;
