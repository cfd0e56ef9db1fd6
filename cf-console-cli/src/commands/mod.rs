//! Command handlers and shared output helpers
//!
//! Every command prints one pretty JSON envelope on stdout:
//! `{"success": true, "result": ...}` or `{"success": false, "errors": [...]}`.
//! Handlers return `Ok(false)` when the envelope reports a failure.

pub mod account;
pub mod pages;
pub mod resource;

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use cf_console_core::error::{CoreError, CoreResult};
use cf_console_core::types::{ApiMessage, ResourceRecord};

pub use account::AccountCommand;
pub use pages::PagesCommand;
pub use resource::ResourceArgs;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

/// Print a record and report whether it succeeded.
pub fn emit_record<T: Serialize>(record: &ResourceRecord<T>) -> anyhow::Result<bool> {
    print_json(record)?;
    Ok(record.success)
}

/// Print the outcome of a service call as an envelope.
pub fn emit<T: Serialize>(result: CoreResult<T>) -> anyhow::Result<bool> {
    let record = match result {
        Ok(value) => ResourceRecord::success(value),
        Err(e) => {
            log_failure(&e);
            ResourceRecord::failure(&e)
        }
    };
    emit_record(&record)
}

/// Print a failure envelope for an error raised before any command ran.
pub fn report_startup_failure(error: &anyhow::Error) -> anyhow::Result<bool> {
    let record: ResourceRecord<()> = match error.downcast_ref::<CoreError>() {
        Some(core) => {
            log_failure(core);
            ResourceRecord::failure(core)
        }
        None => {
            tracing::error!("{error:#}");
            ResourceRecord {
                success: false,
                result: None,
                errors: vec![ApiMessage::new(0, format!("{error:#}"))],
            }
        }
    };
    emit_record(&record)
}

fn log_failure(error: &CoreError) {
    if error.is_expected() {
        tracing::warn!("{error}");
    } else {
        tracing::error!("{error}");
    }
}

/// Parse `key=value`.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// `@path` reads the file, anything else is taken literally.
pub fn read_inline_or_file(raw: &str) -> anyhow::Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read {path}")),
        None => Ok(raw.to_string()),
    }
}
