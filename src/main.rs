use std::time::Duration;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use sporlme::{cli, config, config::Config, error, spotify::profile::MAX_TOP_TRACKS, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with Spotify and show your profile
    Auth(AuthOptions),

    /// Serve the sign-in page at the redirect URI
    Serve(ServeOptions),

    /// Print a fresh authorization URL
    Url,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Also fetch your top tracks (needs the user-top-read scope)
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=MAX_TOP_TRACKS as i64))]
    pub top_tracks: Option<u32>,

    /// Seconds to wait for the browser callback
    #[clap(long, default_value_t = 120)]
    pub timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Also fetch your top tracks (needs the user-top-read scope)
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=MAX_TOP_TRACKS as i64))]
    pub top_tracks: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn load_config() -> Config {
    match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => {
            cli::auth(load_config(), opt.top_tracks, Duration::from_secs(opt.timeout)).await
        }
        Command::Serve(opt) => cli::serve(load_config(), opt.top_tracks).await,
        Command::Url => cli::url(load_config()).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
