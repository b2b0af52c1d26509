use crate::config::OutputFormat;
use crate::git::Selection;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// arbre - browse a git repository as a directories-first file tree
#[derive(Parser, Debug)]
#[command(name = "arbre", version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_hint = ValueHint::DirPath)]
    pub directory: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Do not annotate entries with their status
    #[arg(long, global = true)]
    pub no_status: bool,

    /// List folders deeper than this collapsed
    #[arg(long, global = true)]
    pub depth: Option<usize>,

    /// Fail on the first malformed listing entry instead of skipping it
    #[arg(long, global = true)]
    pub strict: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse the tree of a revision
    Tree {
        /// Revision to browse (defaults to the configured rev, usually HEAD)
        #[arg(value_hint = ValueHint::Other)]
        rev: Option<String>,

        /// Read a raw `git ls-tree -r -t -z` listing instead ("-" for stdin)
        #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "rev")]
        listing: Option<String>,
    },
    /// Browse the working tree with status annotations
    Worktree {
        /// Only show paths in this subset
        #[arg(long, value_enum)]
        filter: Option<Selection>,
    },
    /// Build a tree from a list of paths (read from stdin when none are given)
    Files {
        #[arg(value_hint = ValueHint::FilePath)]
        paths: Vec<String>,
    },
    /// Classify paths against the working tree status
    Classify {
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        paths: Vec<String>,
    },
    /// Print a file as it exists in a revision
    Show {
        #[arg(value_hint = ValueHint::Other)]
        rev: String,

        #[arg(value_hint = ValueHint::FilePath)]
        path: String,

        /// Save to this file instead of printing
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Where a revision tree listing comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// Walk a revision in the repository
    Rev(String),
    /// Raw listing on stdin
    Stdin,
    /// Raw listing in a file
    File(PathBuf),
}

impl ListingSource {
    /// Resolve the `tree` arguments, falling back to `default_rev`
    pub fn parse(rev: Option<&str>, listing: Option<&str>, default_rev: &str) -> Self {
        match (rev, listing) {
            (_, Some("-")) => ListingSource::Stdin,
            (_, Some(file)) => ListingSource::File(PathBuf::from(file)),
            (Some(rev), None) => ListingSource::Rev(rev.to_string()),
            (None, None) => ListingSource::Rev(default_rev.to_string()),
        }
    }
}

/// Generate shell completions to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    generate(shell, &mut cmd, "arbre", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_rev() {
        assert_eq!(
            ListingSource::parse(None, None, "HEAD"),
            ListingSource::Rev("HEAD".to_string())
        );
    }

    #[test]
    fn test_parse_rev() {
        assert!(matches!(
            ListingSource::parse(Some("v1.0"), None, "HEAD"),
            ListingSource::Rev(s) if s == "v1.0"
        ));
    }

    #[test]
    fn test_parse_stdin() {
        assert_eq!(
            ListingSource::parse(None, Some("-"), "HEAD"),
            ListingSource::Stdin
        );
    }

    #[test]
    fn test_parse_listing_file() {
        assert!(matches!(
            ListingSource::parse(None, Some("tree.bin"), "HEAD"),
            ListingSource::File(p) if p == PathBuf::from("tree.bin")
        ));
    }

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["arbre", "-vv", "worktree", "--filter", "unstaged"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(
            args.command,
            Some(Command::Worktree {
                filter: Some(Selection::Unstaged)
            })
        ));

        let args = Args::try_parse_from(["arbre", "tree", "main", "--format", "json"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Json));

        assert!(Args::try_parse_from(["arbre", "classify"]).is_err());

        let args = Args::try_parse_from(["arbre", "show", "v1.0", "src/main.rs", "-o", "main.rs"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Show { rev, path, output: Some(output) })
                if rev == "v1.0" && path == "src/main.rs" && output == PathBuf::from("main.rs")
        ));
    }
}
