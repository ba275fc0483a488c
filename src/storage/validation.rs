//! Path validation
//!
//! Maps remote entry names onto local paths without escaping the target root.

use std::path::{Path, PathBuf};

use crate::utils::validation::is_safe_component;

/// Local path for a remote child entry, `None` when the name is not a single
/// safe path component.
pub fn local_child_path(local_dir: &Path, name: &str) -> Option<PathBuf> {
    is_safe_component(name).then(|| local_dir.join(name))
}
