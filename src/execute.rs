use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail};
use log::{error, info, warn};

use crate::candidate::Mark;
use crate::report::read_report;

/// What to do with the non-preferred files of a report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Delete them.
    Delete,
    /// Replace them with hard links to the preferred file.
    Coalesce,
}


/// Executes a previously written report. Only groups with exactly one
/// preferred line are acted on; groups left ambiguous or unmarked are
/// skipped with a diagnostic. With `dry_run` every action is printed
/// instead of performed, and the run always succeeds once the report
/// parses.
pub fn run(report_path: &Path, action: Action, dry_run: bool) -> anyhow::Result<()>
{
    let groups = read_report(report_path)?;

    let mut acted = 0u64;
    let mut skipped = 0u64;
    let mut failures = 0u64;

    for (i, group) in groups.iter().enumerate() {
        let mut preferred = group.entries.iter().filter(|e| e.mark == Mark::Preferred);
        let keep = match (preferred.next(), preferred.next()) {
            (Some(entry), None) => &entry.path,
            (None, _) => {
                warn!("group {}: no preferred file, skipping", i + 1);
                skipped += 1;
                continue;
            }
            (Some(_), Some(_)) => {
                warn!("group {}: more than one preferred file, skipping", i + 1);
                skipped += 1;
                continue;
            }
        };

        for entry in group.entries.iter().filter(|e| e.mark != Mark::Preferred) {
            let outcome = match action {
                Action::Delete => remove(&entry.path, dry_run),
                Action::Coalesce => relink(keep, &entry.path, dry_run),
            };
            match outcome {
                Ok(()) => acted += 1,
                Err(e) => {
                    error!("{}: {}", entry.path.display(), e);
                    failures += 1;
                }
            }
        }
    }

    info!(
        "execute: {} action(s), {} group(s) skipped, {} failure(s)",
        acted, skipped, failures,
    );
    if failures > 0 {
        bail!("{} destructive action(s) failed", failures);
    }

    Ok(())
}


fn remove(path: &Path, dry_run: bool) -> anyhow::Result<()>
{
    if dry_run {
        println!("would remove {}", path.display());
        return Ok(());
    }

    fs::remove_file(path)?;
    info!("removed {}", path.display());
    Ok(())
}


fn relink(keep: &Path, dupe: &Path, dry_run: bool) -> anyhow::Result<()>
{
    if dry_run {
        println!("would replace {} with a hard link to {}", dupe.display(), keep.display());
        return Ok(());
    }

    // Link under a temporary sibling name, then rename over the
    // duplicate, so the duplicate never disappears without its
    // replacement being in place.
    let tmp = temp_sibling(dupe)?;
    fs::hard_link(keep, &tmp)?;
    if let Err(e) = fs::rename(&tmp, dupe) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!("replaced {} with a hard link to {}", dupe.display(), keep.display());
    Ok(())
}


fn temp_sibling(path: &Path) -> anyhow::Result<PathBuf>
{
    let name = path.file_name()
        .ok_or_else(|| anyhow!("{}: not a linkable path", path.display()))?;

    Ok(path.with_file_name(format!(".{}.dupefind", name.to_string_lossy())))
}


// Tests.
