//! `lm schema` command implementation.

use std::io::{self, Write};

use clap::Args;
use lm_renderer::Schema;

use crate::error::CliError;

/// Arguments for the schema command.
#[derive(Args)]
pub(crate) struct SchemaArgs {
    /// Print the base allow-list instead of the rendering one.
    #[arg(long)]
    base: bool,
}

impl SchemaArgs {
    /// Execute the schema command.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be built or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let schema = if self.base {
            Schema::base()
        } else {
            Schema::for_rendering()?
        };
        let json = serde_json::to_string_pretty(&schema)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}")?;
        Ok(())
    }
}
