//! Majazamooz - Persian tutorial platform
//!
//! Tutorials, comments and categories with moderation, gamified likes and
//! votes, timed auto-graded exams, Jalali-month statistics and e-mail
//! notifications, served over actix-web with a SeaORM storage layer.
//!
//! # Architecture
//! - `storage`: SeaORM backend, one submodule per domain
//! - `services`: business rules, rewards and notifications
//! - `api`: HTTP handlers, middleware and response envelopes
//! - `interfaces`: CLI commands
//! - `config`: static (file/env) and runtime (database) configuration
//! - `runtime`: startup, shutdown and mode selection
//! - `system`: logging and panic hook

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
