//! Loading and merging manifest documents.

use std::fs;
use std::path::Path;

use super::schema::Manifest;
use crate::error::ProvisionError;

/// Parse a single manifest document.
pub fn load_document(path: &Path) -> Result<Manifest, ProvisionError> {
    if !path.exists() {
        return Err(ProvisionError::not_found(
            "manifest",
            path.display().to_string(),
        ));
    }
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| ProvisionError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the given documents in order and merge them into one manifest.
///
/// Later documents override earlier ones at the package/category/profile
/// key level: a redefined entry replaces the prior one wholesale.
pub fn load_and_merge<P: AsRef<Path>>(paths: &[P]) -> Result<Manifest, ProvisionError> {
    let mut merged = Manifest::default();
    for path in paths {
        let document = load_document(path.as_ref())?;
        merge_into(&mut merged, document);
    }
    Ok(merged)
}

fn merge_into(base: &mut Manifest, overlay: Manifest) {
    if overlay.version.is_some() {
        base.version = overlay.version;
    }
    base.profiles.extend(overlay.profiles);
    base.categories.extend(overlay.categories);
    base.packages.extend(overlay.packages);
    match (&mut base.mise, overlay.mise) {
        (Some(existing), Some(incoming)) => existing.tools.extend(incoming.tools),
        (slot @ None, incoming @ Some(_)) => *slot = incoming,
        _ => {}
    }
}
