//! Decoding of `git ls-tree -r -t -z` output.
//!
//! Each record is `<mode> SP <type> SP <object> TAB <path>` terminated by a
//! NUL byte. The object id is not assumed to be any particular length.

use super::error::ListingError;
use super::file_tree::{ObjectKind, TreeEntry};

pub fn parse_ls_tree(bytes: &[u8]) -> Result<Vec<TreeEntry>, ListingError> {
    let bytes = bytes.strip_suffix(b"\0").unwrap_or(bytes);
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    bytes
        .split(|&b| b == 0)
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

fn parse_record(index: usize, record: &[u8]) -> Result<TreeEntry, ListingError> {
    let invalid = |reason: &str| ListingError::InvalidRecord {
        index,
        reason: reason.to_string(),
    };

    let record = std::str::from_utf8(record).map_err(|_| invalid("not valid UTF-8"))?;
    let (meta, path) = record
        .split_once('\t')
        .ok_or_else(|| invalid("missing tab before path"))?;

    let mut fields = meta.split(' ');
    let (Some(_mode), Some(kind), Some(_object), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid("expected <mode> <type> <object>"));
    };

    let kind = ObjectKind::parse(kind)
        .ok_or_else(|| invalid(&format!("unknown object type {:?}", kind)))?;

    Ok(TreeEntry::new(kind, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &[u8] = b"040000 tree c127cde9a0c644a3a8fef449a244f47d5272dfa6\trelative\0\
100644 blob 139e42bf4acaa4927ec9be1ec55a252b97d3f1e2\trelative/path\0";

    #[test]
    fn test_parse_listing() {
        let entries = parse_ls_tree(LISTING).unwrap();
        assert_eq!(
            entries,
            vec![
                TreeEntry::new(ObjectKind::Tree, "relative"),
                TreeEntry::new(ObjectKind::Blob, "relative/path"),
            ]
        );
    }

    #[test]
    fn test_parse_without_trailing_nul() {
        let entries = parse_ls_tree(&LISTING[..LISTING.len() - 1]).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_ls_tree(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_path_with_spaces() {
        let entries = parse_ls_tree(b"100644 blob abc123\tdocs/read me.md\0").unwrap();
        assert_eq!(entries[0].path, "docs/read me.md");
    }

    #[test]
    fn test_parse_submodule() {
        let entries = parse_ls_tree(b"160000 commit abc123\tvendor/dep\0").unwrap();
        assert_eq!(entries[0].kind, ObjectKind::Commit);
    }

    #[test]
    fn test_missing_tab() {
        let err = parse_ls_tree(b"100644 blob abc\tok\0100644 blob abc no-tab\0").unwrap_err();
        assert!(matches!(err, ListingError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_unknown_type() {
        let err = parse_ls_tree(b"100644 tag abc\tx\0").unwrap_err();
        assert!(matches!(err, ListingError::InvalidRecord { index: 0, .. }));
    }
}
