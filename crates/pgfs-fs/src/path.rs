//! Validation of catalog names used as path components

/// Check whether `name` can be used verbatim as one path component.
///
/// Catalog identifiers may legally contain characters that would escape
/// or split a directory entry (`/`, `..`). Those names are not mirrored.
pub fn is_valid_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\0')
        && !(cfg!(windows) && name.contains('\\'))
}
