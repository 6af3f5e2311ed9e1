use anyhow::{Context, Result};
use std::io::Write;

use crate::http::JsonObject;

pub mod config;
mod control;
mod devices;
mod features;

pub use config::Config;
pub use control::{power, reset_filter, set};
pub use devices::{device, devices, me, status};
pub use features::{schedules, timer};

/// Writes a response object as indented JSON followed by a newline.
pub(crate) fn print_json(out: &mut impl Write, value: &JsonObject) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to encode response")?;
    writeln!(out)?;
    Ok(())
}
