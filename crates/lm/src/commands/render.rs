//! `lm render` command implementation.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use lm_config::{CliSettings, Config};
use lm_renderer::{PipelineMode, Renderer};

use crate::error::CliError;
use crate::output::Output;

/// Pipeline choice on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum PipelineArg {
    /// Structured pipeline with fallback on failure.
    Auto,
    /// Fallback pipeline only.
    Fallback,
}

impl From<PipelineArg> for PipelineMode {
    fn from(arg: PipelineArg) -> Self {
        match arg {
            PipelineArg::Auto => Self::Auto,
            PipelineArg::Fallback => Self::Fallback,
        }
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: read stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover lm.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendering pipeline (overrides config).
    #[arg(long, value_enum)]
    pipeline: Option<PipelineArg>,

    /// Largest accepted input in bytes (overrides config).
    #[arg(long)]
    max_input_bytes: Option<usize>,

    /// Enable verbose output (pipeline selection and fallback logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read or
    /// exceeds the configured size limit.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            pipeline: self.pipeline.map(PipelineMode::from),
            max_input_bytes: self.max_input_bytes,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let limit = config.renderer.max_input_bytes;

        let markdown = match &self.file {
            Some(path) => read_limited(File::open(path)?, limit)?,
            None => read_limited(io::stdin().lock(), limit)?,
        };

        let renderer = Renderer::new(config.renderer.pipeline);
        if renderer.mode() != config.renderer.pipeline {
            output.warning("Structured pipeline unavailable, rendering with fallback");
        }
        tracing::info!(
            pipeline = ?renderer.mode(),
            bytes = markdown.len(),
            "Rendering markdown"
        );

        let html = renderer.render(&markdown);
        let mut stdout = io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Read UTF-8 text, failing once more than `limit` bytes arrive.
fn read_limited(reader: impl Read, limit: usize) -> Result<String, CliError> {
    let mut bytes = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(cap).read_to_end(&mut bytes)?;
    if bytes.len() > limit {
        return Err(CliError::Validation(format!(
            "input exceeds renderer.max_input_bytes ({limit} bytes)"
        )));
    }
    String::from_utf8(bytes)
        .map_err(|e| CliError::Validation(format!("input is not valid UTF-8: {e}")))
}
