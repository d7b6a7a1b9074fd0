pub mod announcements;
pub mod birthdays;
pub mod cleanup;
pub mod cleanup_scheduler;
pub mod metrics;
pub mod notifications;
pub mod password;
pub mod registrations;
pub mod users;
