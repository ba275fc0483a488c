//! Listing operations
//!
//! Queries the store for the entries under a path and normalizes them.

use log::{debug, info, warn};
use std::collections::HashMap;

use crate::error::{RemoteOp, TransferError};
use crate::listing::results::{EntryType, RemoteEntry};
use crate::navigate::{is_directory, path};
use crate::protocol::RemoteStore;

/// Self and parent pseudo-entries
fn is_pseudo_entry(name: &str) -> bool {
    name == "." || name == ".."
}

/// Lists the contents of a directory in raw listing order.
///
/// Each entry's type comes from an explicit stat of the joined child path,
/// not from the listing record; a record whose type flag disagrees with the
/// stat is logged. A duplicated name keeps its first position and takes the
/// values of the last record.
pub fn list_directory(
    store: &mut dyn RemoteStore,
    remote_path: &str,
) -> Result<Vec<RemoteEntry>, TransferError> {
    let records = store
        .list(remote_path)
        .map_err(|e| TransferError::remote(RemoteOp::List, remote_path, e))?;

    let mut entries: Vec<RemoteEntry> = Vec::with_capacity(records.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        if record.name.is_empty() || is_pseudo_entry(&record.name) {
            continue;
        }

        let child = path::join(remote_path, &record.name);
        let is_dir = is_directory(store, &child)?;
        if record.attrs.is_dir != is_dir {
            warn!(
                "{} is listed as a {} but stat reports otherwise",
                child,
                if record.attrs.is_dir { "directory" } else { "file" }
            );
        }
        let entry_type = if is_dir {
            EntryType::Directory
        } else {
            EntryType::File
        };

        debug!("fileName:{} ({})", record.name, entry_type);

        let entry = RemoteEntry::new(
            record.name,
            entry_type,
            record.attrs.size,
            record.attrs.modified,
        );

        match positions.get(entry.name()) {
            Some(&idx) => {
                warn!("Duplicate entry {} in listing of {}", entry.name(), remote_path);
                entries[idx] = entry;
            }
            None => {
                positions.insert(entry.name().to_string(), entries.len());
                entries.push(entry);
            }
        }
    }

    info!(
        "Listed remote directory {} - {} entries",
        remote_path,
        entries.len()
    );
    Ok(entries)
}

/// Lists the contents of a directory keyed by entry name.
pub fn list_directory_map(
    store: &mut dyn RemoteStore,
    remote_path: &str,
) -> Result<HashMap<String, RemoteEntry>, TransferError> {
    Ok(list_directory(store, remote_path)?
        .into_iter()
        .map(|entry| (entry.name().to_string(), entry))
        .collect())
}
