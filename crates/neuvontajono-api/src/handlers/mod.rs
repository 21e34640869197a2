//! Request handlers

pub mod health;
pub mod queue;
pub mod statistics;
pub mod summary;
