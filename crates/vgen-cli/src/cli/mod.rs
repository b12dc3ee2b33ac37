//! CLI for the vgen generation client.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use vgen_core::api::BackendClient;
use vgen_core::config::{self, VgenConfig};
use vgen_core::model::{GenerationOptions, GenerationRequest, SourceRef};
use vgen_core::transport::CurlTransport;

use commands::{
    run_completions, run_generate, run_health, run_manpage, run_status, run_submit, run_video,
    run_watch,
};

/// Top-level CLI for the vgen generation client.
#[derive(Debug, Parser)]
#[command(name = "vgen")]
#[command(about = "vgen: submit video generation jobs and follow them to completion", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config and VGEN_BASE_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit a generation job and print its ID without waiting.
    Submit(GenerationArgs),

    /// Submit a generation job and follow it until it finishes.
    Generate(GenerationArgs),

    /// Query the current status of a job once.
    Status {
        /// Job identifier.
        job_id: String,
    },

    /// Follow one or more already-submitted jobs until they finish.
    Watch {
        /// Job identifiers.
        #[arg(required = true)]
        job_ids: Vec<String>,
    },

    /// Show details of a completed video.
    Video {
        /// Job identifier.
        job_id: String,
    },

    /// Check that the backend is up.
    Health,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page to stdout.
    Manpage,
}

/// What to generate a video from, and how.
#[derive(Debug, Clone, Args)]
pub struct GenerationArgs {
    /// Identifier of the source post.
    pub post_id: String,

    /// Caption of the source post.
    #[arg(long, default_value = "")]
    pub caption: String,

    /// Image of the source post.
    #[arg(long, default_value = "")]
    pub image_url: String,

    /// Video style.
    #[arg(long, default_value = "comedy")]
    pub style: String,

    /// Target length in seconds (10-120).
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub duration: u32,

    /// Narration voice.
    #[arg(long, default_value = "male")]
    pub voice: String,

    /// Do not burn captions into the video.
    #[arg(long)]
    pub no_captions: bool,

    /// Background music style.
    #[arg(long)]
    pub music_style: Option<String>,
}

impl GenerationArgs {
    pub fn to_request(&self) -> Result<GenerationRequest> {
        let source = SourceRef::new(&self.post_id, &self.caption, &self.image_url);
        let options = GenerationOptions {
            style: self.style.clone(),
            duration: self.duration,
            voice_type: self.voice.clone(),
            include_captions: !self.no_captions,
            music_style: self.music_style.clone(),
        };
        GenerationRequest::new(source, options).context("invalid generation request")
    }
}

fn build_client(cfg: &VgenConfig) -> Result<BackendClient<CurlTransport>> {
    BackendClient::new(
        CurlTransport::new(cfg.connect_timeout()),
        &cfg.base_url,
        cfg.timeouts(),
    )
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // Commands that never touch the backend.
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Manpage => return run_manpage(),
            _ => {}
        }

        let mut cfg = config::load_or_init()?;
        if let Some(url) = cli.base_url {
            cfg.base_url = url;
        }
        tracing::debug!("loaded config: {:?}", cfg);
        let client = build_client(&cfg)?;
        let retry = cfg.retry_policy();

        match cli.command {
            CliCommand::Submit(args) => run_submit(&client, &args.to_request()?, &retry).await?,
            CliCommand::Generate(args) => {
                run_generate(client, cfg.poll_config(), args.to_request()?).await?
            }
            CliCommand::Status { job_id } => run_status(&client, &job_id, &retry).await?,
            CliCommand::Watch { job_ids } => {
                run_watch(client, cfg.poll_config(), &job_ids).await?
            }
            CliCommand::Video { job_id } => run_video(&client, &job_id, &retry).await?,
            CliCommand::Health => run_health(&client, &retry).await?,
            CliCommand::Completions { .. } | CliCommand::Manpage => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
