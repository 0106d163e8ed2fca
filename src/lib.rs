//! nook - HTML notes with bracketed group filenames

pub mod cli;
pub mod domain;
pub mod index;
pub mod infra;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_edit, handle_group, handle_groups, handle_list, handle_mv, handle_new, handle_rm,
        handle_search, handle_show, handle_tag, handle_tags, handle_untag, handle_watch,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let notes_dir = config.notes_dir(cli.dir.as_ref());

    match &cli.command {
        Command::List(args) => handle_list(args, &notes_dir, &config),
        Command::New(args) => handle_new(args, &notes_dir, &config),
        Command::Show(args) => handle_show(args, &notes_dir, &config),
        Command::Edit(args) => handle_edit(args, &notes_dir, &config),
        Command::Mv(args) => handle_mv(args, &notes_dir, &config),
        Command::Rm(args) => handle_rm(args, &notes_dir, &config),
        Command::Search(args) => handle_search(args, &notes_dir, &config),
        Command::Groups(args) => handle_groups(args, &notes_dir, &config),
        Command::Group(command) => handle_group(command, &notes_dir, &config),
        Command::Tags(args) => handle_tags(args, &notes_dir, &config),
        Command::Tag(args) => handle_tag(args, &notes_dir, &config),
        Command::Untag(args) => handle_untag(args, &notes_dir, &config),
        Command::Watch(args) => handle_watch(args, &notes_dir, &config),
        Command::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(
                args.shell,
                &mut command,
                "nook",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Initializes the fmt subscriber with a verbosity-derived filter.
///
/// `RUST_LOG` wins when set; otherwise `-v` maps to info, `-vv` to debug,
/// `-vvv` to trace.
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
