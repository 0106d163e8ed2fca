//! CLI command definitions and handlers.

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// nook - HTML notes with bracketed group filenames
#[derive(Parser, Debug)]
#[command(name = "nook", version, about, long_about = None)]
pub struct Cli {
    /// Notes directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List notes, optionally filtered by group or tag
    #[command(name = "ls")]
    List(ListArgs),

    /// Create a new note
    New(NewArgs),

    /// Show a note's body
    Show(ShowArgs),

    /// Edit a note in your editor
    Edit(EditArgs),

    /// Rename a note or move it to another group
    Mv(MvArgs),

    /// Delete a note
    Rm(RmArgs),

    /// Linear text search across note bodies
    Search(SearchArgs),

    /// List groups with note counts
    Groups(GroupsArgs),

    /// Create, rename, or delete a group
    #[command(subcommand)]
    Group(GroupCommand),

    /// List label tags with note counts
    Tags(TagsArgs),

    /// Add a label tag to a note
    Tag(TagArgs),

    /// Remove a label tag from a note
    Untag(UntagArgs),

    /// Watch the notes directory and print filesystem events
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Group path to filter by (e.g. "work/projects"; "-" for ungrouped)
    pub group: Option<String>,

    /// Filter by label tag (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Only this exact group, not its sub-groups
    #[arg(long)]
    pub exact: bool,

    /// Include notes in the archive
    #[arg(short = 'a', long)]
    pub include_archived: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Name of the note
    pub name: String,

    /// Group path to file the note under
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note name or filename
    pub note: String,
}

/// Arguments for the `edit` command
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Note name or filename
    pub note: String,
}

/// Arguments for the `mv` command
#[derive(Parser, Debug)]
pub struct MvArgs {
    /// Note name or filename
    pub note: String,

    /// New name for the note
    #[arg(short, long)]
    pub name: Option<String>,

    /// Group path to move the note to
    #[arg(short, long)]
    pub group: Option<String>,

    /// Move the note out of any group
    #[arg(long)]
    pub ungroup: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `rm` command
#[derive(Parser, Debug)]
pub struct RmArgs {
    /// Note name or filename
    pub note: String,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Text to search for (case-insensitive)
    pub text: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `groups` command
#[derive(Parser, Debug)]
pub struct GroupsArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Group management subcommands
#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create an empty group
    New(GroupNewArgs),

    /// Rename a group, cascading to every member note file
    Rename(GroupRenameArgs),

    /// Delete a group; its notes are kept and un-grouped
    Rm(GroupRmArgs),
}

/// Arguments for `group new`
#[derive(Parser, Debug)]
pub struct GroupNewArgs {
    /// Group path to create (intermediate groups are created too)
    pub path: String,
}

/// Arguments for `group rename`
#[derive(Parser, Debug)]
pub struct GroupRenameArgs {
    /// Existing group path
    pub group: String,

    /// New name for the final path segment
    pub new_name: String,
}

/// Arguments for `group rm`
#[derive(Parser, Debug)]
pub struct GroupRmArgs {
    /// Group path to delete
    pub group: String,
}

/// Arguments for the `tags` command
#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tag` command
#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Note name or filename
    pub note: String,

    /// Tag name to add
    pub tag: String,
}

/// Arguments for the `untag` command
#[derive(Parser, Debug)]
pub struct UntagArgs {
    /// Note name or filename
    pub note: String,

    /// Tag name to remove
    pub tag: String,
}

/// Arguments for the `watch` command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Stop after this many events (useful for scripting)
    #[arg(long)]
    pub count: Option<usize>,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
