//! # EventHub Worker Library
//!
//! Background reminder delivery for the event-signup service.
//!
//! ## Modules
//!
//! - `config`: Worker configuration
//! - `mail`: Mail transport trait, SMTP and recording implementations
//! - `reminder`: Reminder window and message composition
//! - `scheduler`: Hourly Reminder Scheduler
//! - `ticks`: Top-of-hour tick source
//!
//! ## Example
//!
//! ```no_run
//! use eventhub_worker::mail::{Mailer, RecordingMailer};
//!
//! let mailer = RecordingMailer::new();
//! println!("Mailer: {}", mailer.name());
//! ```

pub mod config;
pub mod mail;
pub mod reminder;
pub mod scheduler;
pub mod ticks;
