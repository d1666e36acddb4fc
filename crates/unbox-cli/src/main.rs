//! unbox CLI - Unpack project template boxes

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use unbox_core::tui::UnboxArgs;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "unbox")]
#[command(about = "Unpack a template box into a directory")]
#[command(version)]
pub struct Args {
    /// Box source: a local directory or an http(s) zip URL
    pub source: String,

    /// Destination directory (prompted when omitted)
    pub directory: Option<PathBuf>,

    /// Comma-separated recipe options, e.g. --options ts,esm
    #[arg(short, long)]
    pub options: Option<String>,

    /// Overwrite colliding files without asking
    #[arg(short, long)]
    pub force: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<Args> for UnboxArgs {
    fn from(args: Args) -> Self {
        UnboxArgs {
            source: args.source,
            directory: args.directory,
            options: args.options,
            force: args.force,
            yes: args.yes,
        }
    }
}

#[tokio::main]
async fn main() {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let result = unbox_core::run(args.into(), CLI_VERSION).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
