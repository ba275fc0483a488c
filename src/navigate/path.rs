//! Remote path helpers
//!
//! Remote paths are plain strings using `/` as separator, either absolute or
//! relative to the session's working directory.

/// Separator used by every supported remote store
pub const SEPARATOR: char = '/';

/// Joins a parent path and a child name with the separator.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return child.to_string();
    }
    let child = child.trim_start_matches(SEPARATOR);
    if parent.ends_with(SEPARATOR) {
        format!("{}{}", parent, child)
    } else {
        format!("{}{}{}", parent, SEPARATOR, child)
    }
}

/// Resolves `path` against `cwd` and normalizes `.` and `..` segments.
///
/// Absolute paths ignore `cwd`. `..` never climbs above the root.
pub fn resolve(cwd: &str, path: &str) -> String {
    if path.starts_with(SEPARATOR) {
        normalize(path)
    } else {
        normalize(&join(if cwd.is_empty() { "/" } else { cwd }, path))
    }
}

/// Collapses duplicate separators, `.` and `..` in an absolute or relative path.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with(SEPARATOR);
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => continue,
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Last segment of a path, if any.
pub fn file_name(path: &str) -> Option<&str> {
    path.trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .filter(|name| !name.is_empty())
}

/// Parent of an absolute path; `None` for the root.
pub fn parent(path: &str) -> Option<String> {
    let normalized = normalize(path);
    if normalized == "/" || normalized == "." {
        return None;
    }
    match normalized.rfind(SEPARATOR) {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(normalized[..idx].to_string()),
        None => Some(".".to_string()),
    }
}
