//! Process-level plumbing: logging setup and the panic hook.

pub mod logging;
pub mod panic_handler;
