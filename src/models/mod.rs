mod file_tree_model;

pub use file_tree_model::{FileEntryModel, RenderOptions};
