use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// File names (not paths), sorted lexicographically.
    pub names: Vec<String>,
    pub skipped: Vec<String>,
}

/// Lists image files directly under `dir` whose extension matches `ext`
/// (case-insensitive). `exclude` keeps the manifest itself out of the
/// listing when it shares the directory and extension.
pub fn list_images(dir: &Path, ext: &str, exclude: Option<&Path>) -> Result<ScanOutcome> {
    if !dir.is_dir() {
        bail!("input directory {:?} does not exist or is not a directory", dir);
    }
    let want = normalize_extension(ext);
    let exclude = exclude.and_then(canonical_or_none);

    let mut out = ScanOutcome::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let e = match entry {
            Ok(e) => e,
            // Dangling symlinks and the like; the root itself was checked above.
            Err(err) if err.depth() > 0 => {
                out.skipped.push(format!("skipping entry: {}", err));
                continue;
            }
            Err(err) => return Err(err).with_context(|| format!("failed to list {:?}", dir)),
        };
        if !e.file_type().is_file() {
            continue;
        }
        let p = e.path();
        if !has_extension(p, &want) {
            continue;
        }
        if let Some(ex) = &exclude {
            if canonical_or_none(p).as_ref() == Some(ex) {
                continue;
            }
        }

        let Some(name) = e.file_name().to_str() else {
            out.skipped.push(format!(
                "skipping {:?}: file name is not valid UTF-8",
                e.file_name()
            ));
            continue;
        };
        if name.contains('\n') || name.contains('\r') {
            out.skipped
                .push(format!("skipping {:?}: file name contains a line break", name));
            continue;
        }
        out.names.push(name.to_string());
    }

    // walkdir orders by OsStr; re-sort on the UTF-8 text so the order is
    // plain code-point order on every platform.
    out.names.sort();
    Ok(out)
}

pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

// Case-insensitive, and a bare dotfile such as `.png` has no extension.
fn has_extension(p: &Path, want: &str) -> bool {
    p.extension()
        .map(|e| e.to_string_lossy().to_lowercase() == want)
        .unwrap_or(false)
}

fn canonical_or_none(p: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(p).ok()
}

pub fn folder_display(p: &Path) -> String {
    std::fs::canonicalize(p)
        .unwrap_or_else(|_| p.to_path_buf())
        .display()
        .to_string()
}
