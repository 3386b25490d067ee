//! API Module - CLI commands on top of the dashboard controller

pub mod commands;
