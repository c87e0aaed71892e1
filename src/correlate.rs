use std::io::Write;
use clap::ArgEnum;
use colored::Colorize;
use log::error;

use crate::bucket::bucket_by_size;
use crate::candidate::Candidate;
use crate::partition::{partition, Limits};
use crate::scan::{scan_roots, ScanOptions};
use crate::util::human_bytes;
use crate::CorrelateConfig;

/// When the correlate listing is colorized.
#[derive(Copy, Clone, Debug, ArgEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    Match,
    Remove,
    Add,
}


#[derive(Copy, Clone, Debug, Default)]
struct Tally {
    files: u64,
    bytes: u64,
}


/// The correlate pipeline: scan both trees, partition the combined
/// candidate set by content, and classify every content class by which
/// tree(s) it appears in.
pub fn run<W: Write>(cfg: &CorrelateConfig, out: &mut W) -> anyhow::Result<()>
{
    configure_color(cfg.color);

    let options = ScanOptions {
        recurse: true,
        follow_symlinks: false,
        min_size: 0,
        exclude: Vec::new(),
    };
    let roots = [cfg.left.clone(), cfg.right.clone()];
    let candidates = scan_roots(&roots, &options);

    let limits = Limits { max_memory: cfg.max_memory, max_buffer: cfg.max_buffer };

    let mut matched = Tally::default();
    let mut removed = Tally::default();
    let mut added = Tally::default();

    for bucket in bucket_by_size(candidates, 1) {
        let size = bucket.size;
        let mut classes = match partition(size, bucket.candidates, &limits, true) {
            Ok(classes) => classes,
            Err(e) => {
                error!("skipping {}-byte files: {}", size, e);
                continue;
            }
        };

        for class in classes.iter_mut() {
            class.sort_by(|a, b| a.primary_path().cmp(b.primary_path()));
        }
        classes.sort_by(|a, b| a[0].primary_path().cmp(b[0].primary_path()));

        for class in classes {
            let kind = classify(&class);

            // The match count tracks left files confirmed present on the
            // right; remove and add counts are one-sided by definition.
            let counted = match kind {
                Kind::Match | Kind::Remove => class.iter().filter(|c| c.root_index == 1).count(),
                Kind::Add => class.len(),
            } as u64;
            let tally = match kind {
                Kind::Match => &mut matched,
                Kind::Remove => &mut removed,
                Kind::Add => &mut added,
            };
            tally.files += counted;
            tally.bytes += size * counted;

            let listed = match kind {
                Kind::Match => cfg.matches,
                Kind::Remove => cfg.removes,
                Kind::Add => cfg.adds,
            };
            if listed {
                for candidate in &class {
                    writeln!(out, "{}", line_for(kind, candidate))?;
                }
            }
        }
    }

    if cfg.summary {
        writeln!(out)?;
        writeln!(out, "matched: {} file(s) ({})", matched.files, human_bytes(matched.bytes))?;
        writeln!(out, "removed: {} file(s) ({})", removed.files, human_bytes(removed.bytes))?;
        writeln!(out, "added:   {} file(s) ({})", added.files, human_bytes(added.bytes))?;
    }

    Ok(())
}


fn classify(class: &[Candidate]) -> Kind
{
    let left = class.iter().any(|c| c.root_index == 1);
    let right = class.iter().any(|c| c.root_index == 2);

    match (left, right) {
        (true, true) => Kind::Match,
        (true, false) => Kind::Remove,
        (false, _) => Kind::Add,
    }
}


fn line_for(kind: Kind, candidate: &Candidate) -> String
{
    let path = candidate.primary_path().display();

    match kind {
        Kind::Match => format!("= {}", path),
        Kind::Remove => format!("- {}", path).red().to_string(),
        Kind::Add => format!("+ {}", path).green().to_string(),
    }
}


fn configure_color(mode: ColorMode)
{
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {
            if !atty::is(atty::Stream::Stdout) {
                colored::control::set_override(false);
            }
        }
    }
}


// Tests.


#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use super::{run, ColorMode};
    use crate::CorrelateConfig;

    fn config(left: &Path, right: &Path) -> CorrelateConfig
    {
        CorrelateConfig {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
            matches: true,
            removes: true,
            adds: true,
            color: ColorMode::Never,
            summary: true,
            max_buffer: 1 << 20,
            max_memory: 64 << 20,
        }
    }

    fn run_to_string(cfg: &CorrelateConfig) -> String
    {
        let mut out = Vec::new();
        run(cfg, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn write(path: &Path, content: &[u8])
    {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn trees() -> (tempfile::TempDir, tempfile::TempDir)
    {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        // Present in both, under different names.
        write(&left.path().join("kept"), b"same payload");
        write(&right.path().join("renamed"), b"same payload");
        // Only on the left.
        write(&left.path().join("gone"), b"left only");
        // Only on the right.
        write(&right.path().join("fresh"), b"right only!");
        (left, right)
    }

    #[test]
    fn classifies_matches_removes_and_adds()
    {
        let (left, right) = trees();
        let text = run_to_string(&config(left.path(), right.path()));

        assert!(text.lines().any(|l| l.starts_with("= ") && l.ends_with("kept")));
        assert!(text.lines().any(|l| l.starts_with("= ") && l.ends_with("renamed")));
        assert!(text.lines().any(|l| l.starts_with("- ") && l.ends_with("gone")));
        assert!(text.lines().any(|l| l.starts_with("+ ") && l.ends_with("fresh")));
    }

    #[test]
    fn matching_is_by_content_not_by_name()
    {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        // Same name, different bytes of equal length.
        write(&left.path().join("config"), b"alpha");
        write(&right.path().join("config"), b"bravo");

        let text = run_to_string(&config(left.path(), right.path()));

        assert!(text.lines().any(|l| l.starts_with("- ")));
        assert!(text.lines().any(|l| l.starts_with("+ ")));
        assert!(!text.lines().any(|l| l.starts_with("= ")));
    }

    #[test]
    fn summary_counts_files_and_bytes()
    {
        let (left, right) = trees();
        let text = run_to_string(&config(left.path(), right.path()));

        assert!(text.contains("matched: 1 file(s) (12 B)"));
        assert!(text.contains("removed: 1 file(s) (9 B)"));
        assert!(text.contains("added:   1 file(s) (11 B)"));
    }

    #[test]
    fn sections_are_independently_suppressible()
    {
        let (left, right) = trees();

        let mut cfg = config(left.path(), right.path());
        cfg.matches = false;
        cfg.adds = false;
        cfg.summary = false;
        let text = run_to_string(&cfg);

        assert!(text.lines().all(|l| l.is_empty() || l.starts_with("- ")));
        // Suppressing the listing does not change the counts.
        let mut cfg = config(left.path(), right.path());
        cfg.matches = false;
        let text = run_to_string(&cfg);
        assert!(text.contains("matched: 1 file(s)"));
    }

    #[test]
    fn empty_files_match_across_trees()
    {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        write(&left.path().join("empty"), b"");
        write(&right.path().join("void"), b"");

        let text = run_to_string(&config(left.path(), right.path()));

        assert!(text.lines().any(|l| l.starts_with("= ") && l.ends_with("empty")));
        assert!(text.lines().any(|l| l.starts_with("= ") && l.ends_with("void")));
    }

    #[test]
    fn identical_trees_have_no_removes_or_adds()
    {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        write(&left.path().join("a/deep/file"), b"data");
        write(&right.path().join("a/deep/file"), b"data");

        let text = run_to_string(&config(left.path(), right.path()));

        assert!(text.contains("removed: 0 file(s)"));
        assert!(text.contains("added:   0 file(s)"));
        assert!(text.contains("matched: 1 file(s)"));
    }
}
