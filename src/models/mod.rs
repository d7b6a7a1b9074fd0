pub mod address;
pub mod announcement;
pub mod auth;
pub mod notification;
pub mod registration;
pub mod user;
