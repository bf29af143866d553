pub mod auth;
pub mod mail;
pub mod scheduling;
