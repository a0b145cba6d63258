//! Third-party binaries used by a solution
//!
//! The sidecar written next to a solution lists every binary the solution's
//! projects load from third-party folders, relative to the source root:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
//! 	<ItemGroup>
//! 		<ThirdPartyFiles Include="$(RootDir)\packages\log4net\log4net.dll" />
//! 	</ItemGroup>
//! </Project>
//! ```

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::relative_path;
use crate::constants::{
    DEPENDENCY_COMPANION_EXTENSION, MSBUILD_NAMESPACE, ROOT_DIR_PROPERTY, SOLUTION_LINE_ENDING,
    THIRD_PARTIES_SUFFIX,
};
use crate::resolver::ThirdPartyUsage;
use crate::utils::fs::{copy_if_changed, ensure_dir};
use crate::utils::path::path_key;

/// `<solution>.thirdparties`.
#[must_use]
pub fn sidecar_path(solution: &Path) -> PathBuf {
    let mut name = solution.as_os_str().to_os_string();
    name.push(THIRD_PARTIES_SUFFIX);
    PathBuf::from(name)
}

/// Every used binary plus its `.dep` companion when one exists, sorted
/// case-insensitively.
#[must_use]
pub fn with_companions(used: &ThirdPartyUsage) -> Vec<PathBuf> {
    let mut files = BTreeMap::new();
    for binary in used.iter() {
        let companion = binary.with_extension(DEPENDENCY_COMPANION_EXTENSION);
        if companion.is_file() {
            files.insert(path_key(&companion), companion);
        }
        files.insert(path_key(binary), binary.clone());
    }
    files.into_values().collect()
}

/// Render the sidecar document for `files`, relative to `source_root`.
#[must_use]
pub fn render_third_parties(source_root: &Path, files: &[PathBuf]) -> String {
    let mut xml = String::new();
    let _ = write_third_parties(&mut xml, source_root, files);
    xml
}

fn write_third_parties(xml: &mut String, source_root: &Path, files: &[PathBuf]) -> fmt::Result {
    let anchor = source_root.join("file.txt");
    let nl = SOLUTION_LINE_ENDING;

    write!(xml, "<?xml version=\"1.0\" encoding=\"utf-8\"?>{nl}")?;
    write!(xml, "<Project xmlns=\"{MSBUILD_NAMESPACE}\">{nl}")?;
    write!(xml, "\t<ItemGroup>{nl}")?;
    for file in files {
        let include = format!("{ROOT_DIR_PROPERTY}\\{}", relative_path(&anchor, file));
        write!(xml, "\t\t<ThirdPartyFiles Include=\"{}\" />{nl}", escape_attribute(&include))?;
    }
    write!(xml, "\t</ItemGroup>{nl}</Project>")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Outcome of copying third-party binaries to an output folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: usize,
    pub up_to_date: usize,
    pub failed: Vec<PathBuf>,
}

/// Copy `files` flat into `output`, skipping files whose size and
/// modification time already match.
///
/// A file that cannot be copied is logged and reported; the rest still copy.
pub fn copy_to_folder(files: &[PathBuf], output: &Path) -> Result<CopyReport> {
    ensure_dir(output)?;

    let mut report = CopyReport::default();
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = output.join(name);
        match copy_if_changed(file, &target) {
            Ok(true) => {
                info!("Copied to target: {}", target.display());
                report.copied += 1;
            }
            Ok(false) => report.up_to_date += 1,
            Err(e) => {
                error!("Unable to copy to target: {}. Error: {e:#}", target.display());
                report.failed.push(file.clone());
            }
        }
    }
    Ok(report)
}
