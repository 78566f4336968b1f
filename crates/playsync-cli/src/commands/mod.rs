//! Command handlers

pub mod config;
pub mod join;
pub mod room;
