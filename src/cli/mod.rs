pub mod args;
pub mod commands;
pub mod error;
pub mod output;

use std::io;

use tracing::debug;

pub use args::{Cli, Commands, Format};
pub use commands::CommandRunner;
pub use error::CliError;
pub use output::OutputFormat;

use crate::cloudstack::create_cloudstack_api;
use crate::core::config::ClientConfig;

/// Load the profile, build the client and run the parsed command.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::discover(cli.config.as_deref(), cli.profile.as_deref())?;
    if cli.project_id.is_some() {
        config = config.project_id(cli.project_id.clone());
    }
    debug!(endpoint = %config.endpoint, project = ?config.project_id, "configuration loaded");

    let api = create_cloudstack_api(config)?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();

    CommandRunner::new(&api)
        .execute(&mut stdout, &mut stderr, &format, &cli.command)
        .await
}
