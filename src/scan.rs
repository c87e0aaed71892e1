use std::collections::HashSet;
use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use log::{debug, error, info};
use walkdir::WalkDir;

use crate::candidate::{Candidate, FileId};

/// Traversal and filtering knobs for one scan.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Expand directory arguments recursively; otherwise only their
    /// immediate regular files are considered.
    pub recurse: bool,
    /// Follow symlinks; a link to a regular file becomes a candidate whose
    /// content is read through the link.
    pub follow_symlinks: bool,
    pub min_size: u64,
    /// Basenames (files and directories) skipped during traversal.
    pub exclude: Vec<OsString>,
}


/// Walks the given roots and yields one candidate per regular file that
/// passes the filters. The root index of a candidate is the 1-based
/// position of the argument that introduced it, whether that argument was
/// a file or a directory.
pub fn scan_roots(roots: &[PathBuf], opt: &ScanOptions) -> Vec<Candidate>
{
    let excluded: HashSet<&OsString> = opt.exclude.iter().collect();
    let mut seen_paths = HashSet::new();
    let mut candidates = Vec::new();

    for (i, root) in roots.iter().enumerate() {
        let root_index = i as u32 + 1;

        let mut walker = WalkDir::new(root)
            .follow_links(opt.follow_symlinks)
            .sort_by_file_name();
        if !opt.recurse {
            walker = walker.max_depth(1);
        }

        // Exclusion applies to discovered entries, never to the argument
        // itself.
        let entries = walker.into_iter().filter_entry(|e| {
            e.depth() == 0 || !excluded.contains(&e.file_name().to_os_string())
        });

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    error!("scan: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    error!("scan: {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if meta.len() < opt.min_size {
                debug!("scan: skipping {} (below minimum size)", entry.path().display());
                continue;
            }

            let path = entry.path().to_path_buf();
            // The same path may be reachable through several arguments;
            // count it once, for the argument that saw it first.
            if !seen_paths.insert(path.clone()) {
                continue;
            }

            let id = FileId { dev: meta.dev(), ino: meta.ino() };
            let mtime_ns = meta.mtime() * 1_000_000_000 + meta.mtime_nsec();
            candidates.push(Candidate::new(path, meta.len(), id, root_index, mtime_ns));
        }
    }

    info!("scan: {} candidate file(s)", candidates.len());
    candidates
}


// Tests.
