//! Request handlers

pub mod forward;
