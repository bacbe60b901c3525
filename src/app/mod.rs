pub mod args;
mod setup;

pub use args::AppArgs;
pub use setup::ConsoleConfig;

use std::sync::Arc;

use anyhow::Result;

use crate::api::HttpBackend;
use crate::ui::run_tui;

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp {
        config,
        diagnostics,
    } = setup::prepare(args)?;

    let backend = Arc::new(HttpBackend::new(&config.base_url)?);
    run_tui(backend, config, diagnostics).await
}
