use crate::git::{Bucket, FlatFileEntry};
use serde::Serialize;

/// Model for a file entry as printed by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntryModel {
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub is_folder: bool,
    pub is_expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Bucket>,
}

impl From<&FlatFileEntry> for FileEntryModel {
    fn from(entry: &FlatFileEntry) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            depth: entry.depth,
            is_folder: entry.is_folder,
            is_expanded: entry.is_expanded,
            status: entry.status,
        }
    }
}

/// Display settings for [`FileEntryModel::render`]
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub indent_width: usize,
    pub status_markers: bool,
}

impl FileEntryModel {
    /// One line of the indented tree view
    pub fn render(&self, opts: RenderOptions) -> String {
        let mut line = String::new();

        if opts.status_markers {
            let marker = self.status.and_then(|s| s.marker()).unwrap_or(' ');
            line.push(marker);
            line.push(' ');
        }

        line.push_str(&" ".repeat(self.depth * opts.indent_width));
        line.push_str(&self.name);
        if self.is_folder {
            line.push('/');
            if !self.is_expanded {
                line.push_str(" …");
            }
        }
        line
    }
}
