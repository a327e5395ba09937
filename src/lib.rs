#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;
pub mod ui;
pub mod utils;

pub use config::Settings;
pub use error::{ApiError, ChatError, ConfigError};
