//! SeaORM entities for the `users` and `outbox_messages` tables.

pub mod outbox_message;
pub mod user;
