mod error;
mod file_tree;
mod ls_tree;
mod repository;
mod status;

pub use error::{ListingError, TreeError};
pub use file_tree::{
    first_file, flatten_tree, FileTreeNode, FlatFileEntry, IngestReport, Node, NodeId, ObjectKind,
    TreeAssembler, TreeEntry, ROOT,
};
pub use ls_tree::parse_ls_tree;
pub use repository::Repository;
pub use status::{
    classify, expand_with_ancestors, selected_by_bucket, ActionState, Bucket, ClassifiedPath,
    Classifier, Selection, SelectionState, StatusSets,
};
