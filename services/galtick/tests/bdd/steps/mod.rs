//! BDD step definitions for galtick service

pub mod command_steps;
pub mod fetch_steps;
pub mod monitor_steps;
