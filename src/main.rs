//! The main entry point for the log console.
mod api;
mod app;
mod console;
mod logging;
mod types;
mod ui;

use anyhow::Result;

/// Parses the command line, installs logging and runs the terminal UI until
/// the user exits.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the terminal cannot be
/// set up.
#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
