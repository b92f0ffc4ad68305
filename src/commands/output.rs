use std::io::{self, Write};

use eyre::{Result, WrapErr};
use serde::Serialize;

/// Print the single JSON payload of this invocation on stdout
pub fn emit<T: Serialize>(summary: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).wrap_err("Failed to serialize output")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json).wrap_err("Failed to write output")?;
    stdout.flush().wrap_err("Failed to flush output")?;

    Ok(())
}
