//! Label Server - HTTP front end for one thermal label printer
//!
//! # Modules
//!
//! ```text
//! label-server/src/
//! ├── core/       # configuration, state, server
//! ├── printing/   # job queue and worker
//! ├── api/        # HTTP routes and handlers
//! └── utils/      # errors, logging
//! ```
//!
//! Layout, command encoding and the device connection live in the
//! `label-printer` crate.

pub mod api;
pub mod core;
pub mod printing;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use printing::{JobRequest, JobStatus, PrintJob, PrintQueue};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};

/// Load `.env`, create the working directory and install the logger
pub fn setup_environment() -> anyhow::Result<()> {
    // a missing .env is normal
    let _ = dotenv::dotenv();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    std::fs::create_dir_all(&work_dir)?;

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty());
    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __          __         __
   / /   ____ _/ /_  ___  / /
  / /   / __ `/ __ \/ _ \/ /
 / /___/ /_/ / /_/ /  __/ /
/_____/\__,_/_.___/\___/_/
        "#
    );
}
