//! Destination paths for product files.
//!
//! The flat layout writes `output_dir/<file name>`. The volume layout mirrors
//! the CRISM archive tree for `FRT`, `HRL` and `HRS` observations:
//!
//! ```text
//! HRL0000CA5C_07_IF183L_TRR3.IMG -> HRLCA/HRLCA5C/DATA/HRL0000CA5C_07_IF183L_TRR3.IMG
//! FRT00012345_07_DE166L_DDR1.IMG -> FRT123/FRT12345/DDR/FRT00012345_07_DE166L_DDR1.IMG
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use super::DownloadError;
use crate::config::OutputLayout;
use crate::pattern::Glob;

/// Observation types the volume layout knows how to place.
const VOLUME_OBSERVATION_TYPES: [&str; 3] = ["frt", "hrl", "hrs"];

/// Reduces a catalog-supplied name to a single safe path component.
///
/// Anything before the last `/` or `\` is dropped; names that end up empty,
/// `.` or `..`, or that contain control characters, are rejected.
#[must_use]
pub fn safe_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if name.is_empty() || name == "." || name == ".." || name.chars().any(char::is_control) {
        return None;
    }
    Some(name.to_string())
}

/// Returns the local path for `file_name` under `output_dir`.
///
/// # Errors
///
/// Returns [`DownloadError::Layout`] when the volume layout has no directory
/// for this file.
pub fn destination_for(
    output_dir: &Path,
    layout: OutputLayout,
    file_name: &str,
) -> Result<PathBuf, DownloadError> {
    match layout {
        OutputLayout::Flat => Ok(output_dir.join(file_name)),
        OutputLayout::Volume => {
            let directory = volume_directory(output_dir, file_name)
                .map_err(|reason| DownloadError::layout(file_name, reason))?;
            debug!(file = file_name, directory = %directory.display(), "placed in volume layout");
            Ok(directory.join(file_name))
        }
    }
}

fn volume_directory(base: &Path, file_name: &str) -> Result<PathBuf, String> {
    let lower = file_name.to_ascii_lowercase();
    let Some(obs_type) = VOLUME_OBSERVATION_TYPES
        .iter()
        .find(|obs_type| lower.starts_with(*obs_type))
    else {
        return Err("only FRT, HRL and HRS products are supported".to_string());
    };

    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);

    // Observation ids are zero padded to 8 hex digits after the type prefix.
    let (sub, subsub) = if lower.starts_with(&format!("{obs_type}0000")) {
        (stem.get(7..9), stem.get(7..11))
    } else if lower.starts_with(&format!("{obs_type}000")) {
        (stem.get(6..9), stem.get(6..11))
    } else {
        (None, None)
    };
    let (Some(sub), Some(subsub)) = (sub, subsub) else {
        return Err("observation id does not match any case".to_string());
    };

    let kind = if glob_matches("*_if*_trr3.*", &lower) {
        "DATA"
    } else if glob_matches("*_de*_ddr1.*", &lower) {
        "DDR"
    } else {
        return Err("neither a TRR3 I/F nor a DDR1 product".to_string());
    };

    let prefix = obs_type.to_ascii_uppercase();
    Ok(base
        .join(format!("{prefix}{}", sub.to_ascii_uppercase()))
        .join(format!("{prefix}{}", subsub.to_ascii_uppercase()))
        .join(kind))
}

fn glob_matches(glob: &str, candidate: &str) -> bool {
    Glob::new(glob).is_ok_and(|glob| glob.is_match(candidate))
}
