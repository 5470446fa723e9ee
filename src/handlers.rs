pub mod auth;
pub mod overview;
pub mod scope;
