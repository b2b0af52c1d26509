use crate::cli::{Args, Command, ListingSource};
use crate::config::{self, Config, OutputFormat};
use crate::git::{
    first_file, flatten_tree, parse_ls_tree, Classifier, FileTreeNode, Repository, Selection,
    StatusSets, TreeAssembler, TreeEntry,
};
use crate::models::{FileEntryModel, RenderOptions};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

pub struct App {
    command: Command,
    directory: PathBuf,
    strict: bool,
    config: Config,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        // Load persisted settings, then let flags override them
        let mut config = config::load();
        if let Some(format) = args.format {
            config.format = format;
        }
        if args.no_status {
            config.show_status = false;
        }
        if args.depth.is_some() {
            config.max_depth = args.depth;
        }

        let command = args.command.unwrap_or(Command::Worktree { filter: None });
        let directory = args.directory.unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            command,
            directory,
            strict: args.strict,
            config,
        })
    }

    pub fn run(self) -> Result<()> {
        match &self.command {
            Command::Tree { rev, listing } => {
                let source =
                    ListingSource::parse(rev.as_deref(), listing.as_deref(), &self.config.default_rev);
                self.browse_listing(&source)
            }
            Command::Worktree { filter } => self.browse_worktree(*filter),
            Command::Files { paths } => self.browse_files(paths),
            Command::Classify { paths } => self.classify(paths),
            Command::Show { rev, path, output } => self.show(rev, path, output.as_deref()),
            Command::Config { save } => self.show_config(*save),
        }
    }

    fn repo(&self) -> Result<Repository> {
        Repository::discover(&self.directory)
    }

    fn classifier(&self, status: &StatusSets) -> Classifier {
        Classifier::new(status).with_fallback(self.config.fallback_bucket)
    }

    fn browse_listing(&self, source: &ListingSource) -> Result<()> {
        let entries = match source {
            ListingSource::Rev(rev) => self.repo()?.tree_listing(rev)?,
            ListingSource::Stdin => {
                let mut bytes = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .context("Failed to read listing from stdin")?;
                parse_ls_tree(&bytes)?
            }
            ListingSource::File(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read listing {}", path.display()))?;
                parse_ls_tree(&bytes)?
            }
        };
        log::debug!("{} listing entries from {:?}", entries.len(), source);

        let tree = self.ingest(&entries)?;
        self.print_tree(tree.into_tree())
    }

    fn browse_worktree(&self, filter: Option<Selection>) -> Result<()> {
        let repo = self.repo()?;
        let status = repo.status_sets()?;
        if status.is_empty() {
            log::debug!("working tree is clean");
        }
        let classifier = self.classifier(&status);

        let mut files = repo.worktree_files(&status)?;
        if let Some(filter) = filter {
            files = classifier.selected_by_bucket(&files, filter);
        }

        let mut tree = self.assemble(&files)?;
        if self.config.show_status {
            tree.annotate(&classifier);
        }
        self.print_tree(tree.into_tree())
    }

    fn browse_files(&self, paths: &[String]) -> Result<()> {
        let paths = if paths.is_empty() {
            read_lines(io::stdin().lock())?
        } else {
            paths.to_vec()
        };

        let mut tree = self.assemble(&paths)?;
        if self.config.show_status {
            match self.repo().and_then(|repo| repo.status_sets()) {
                Ok(status) => tree.annotate(&self.classifier(&status)),
                Err(err) => log::debug!("no status annotations: {:#}", err),
            }
        }
        self.print_tree(tree.into_tree())
    }

    fn classify(&self, paths: &[String]) -> Result<()> {
        #[derive(Serialize)]
        struct Classification {
            paths: Vec<crate::git::ClassifiedPath>,
            actions: crate::git::ActionState,
        }

        let status = self.repo()?.status_sets()?;
        let classifier = self.classifier(&status);
        let result = Classification {
            paths: paths.iter().map(|p| classifier.classify_path(p)).collect(),
            actions: classifier.actions(paths),
        };

        let mut out = io::stdout().lock();
        match self.config.format {
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            }
            OutputFormat::Tree => {
                for classified in &result.paths {
                    writeln!(out, "{}\t{}", classified.bucket.as_str(), classified.path)?;
                }
            }
        }
        Ok(())
    }

    fn show(&self, rev: &str, path: &str, output: Option<&std::path::Path>) -> Result<()> {
        let contents = self.repo()?.blob_contents(rev, path)?;

        match output {
            Some(file) => {
                std::fs::write(file, &contents)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                log::info!("saved {}:{} to {}", rev, path, file.display());
            }
            None => io::stdout().lock().write_all(&contents)?,
        }
        Ok(())
    }

    fn show_config(&self, save: bool) -> Result<()> {
        print!("{}", toml::to_string_pretty(&self.config)?);
        if save {
            config::save(&self.config).context("Failed to save config")?;
            if let Some(path) = config::config_path() {
                log::info!("saved {}", path.display());
            }
        }
        Ok(())
    }

    /// Build a tree from a listing, stopping at the first bad entry in
    /// strict mode
    fn ingest(&self, entries: &[TreeEntry]) -> Result<TreeAssembler> {
        let mut tree = TreeAssembler::new();
        if self.strict {
            for entry in entries {
                tree.ingest_entry(entry)?;
            }
            return Ok(tree);
        }

        let report = tree.ingest_tree_listing(entries);
        if !report.errors.is_empty() {
            log::warn!("skipped {} malformed listing entries", report.errors.len());
        }
        Ok(tree)
    }

    fn assemble(&self, paths: &[String]) -> Result<TreeAssembler> {
        let mut tree = TreeAssembler::new();
        let errors = tree.add_files(paths);
        if self.strict {
            if let Some(err) = errors.into_iter().next() {
                return Err(err.into());
            }
        }
        Ok(tree)
    }

    fn print_tree(&self, nodes: Vec<FileTreeNode>) -> Result<()> {
        if let Some(file) = first_file(&nodes) {
            log::debug!("first file: {}", file.path);
        }

        let mut models: Vec<FileEntryModel> = flatten_tree(&nodes, 0, self.config.max_depth)
            .iter()
            .map(FileEntryModel::from)
            .collect();
        if !self.config.show_status {
            for model in &mut models {
                model.status = None;
            }
        }

        let mut out = io::stdout().lock();
        match self.config.format {
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&models)?)?;
            }
            OutputFormat::Tree => {
                let opts = RenderOptions {
                    indent_width: self.config.indent_width,
                    status_markers: self.config.show_status && self.config.status_markers,
                };
                for model in &models {
                    writeln!(out, "{}", model.render(opts))?;
                }
            }
        }
        Ok(())
    }
}

/// Non-empty lines, trimmed of trailing whitespace
fn read_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read paths")?;
        let line = line.trim_end();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines() {
        let input = "src/main.rs\n\nREADME.md  \r\n";
        let lines = read_lines(input.as_bytes()).unwrap();
        assert_eq!(lines, vec!["src/main.rs", "README.md"]);
    }

    #[test]
    fn test_strict_ingest_stops_at_bad_entry() {
        let app = App {
            command: Command::Config { save: false },
            directory: PathBuf::from("."),
            strict: true,
            config: Config::default(),
        };
        let entries = [
            TreeEntry::new(crate::git::ObjectKind::Tree, "a/b"),
            TreeEntry::new(crate::git::ObjectKind::Blob, "c"),
        ];
        assert!(app.ingest(&entries).is_err());

        let lenient = App {
            strict: false,
            ..app
        };
        let tree = lenient.ingest(&entries).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_strict_assemble_rejects_empty_component() {
        let app = App {
            command: Command::Config { save: false },
            directory: PathBuf::from("."),
            strict: true,
            config: Config::default(),
        };
        assert!(app.assemble(&["ok.txt".to_string(), "bad//x".to_string()]).is_err());
    }
}
