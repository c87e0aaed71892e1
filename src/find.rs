use std::io::Write;
use anyhow::anyhow;
use log::{error, info};

use crate::alias::fold_aliases;
use crate::bucket::bucket_by_size;
use crate::candidate::{Candidate, Group, Mark};
use crate::criteria::Criteria;
use crate::partition::{partition, Limits};
use crate::report;
use crate::scan::{scan_roots, ScanOptions};
use crate::util::human_bytes;
use crate::FindConfig;

/// The find pipeline: scan, fold aliases, bucket by size, partition by
/// content, mark preferred members, emit the report.
pub fn run<W: Write>(cfg: &FindConfig, out: &mut W) -> anyhow::Result<()>
{
    // A bad criteria string must fail before any file is opened.
    let criteria = match &cfg.prefer {
        Some(text) => Some(Criteria::parse(text).map_err(|e| anyhow!("criteria: {}", e))?),
        None => None,
    };

    let options = ScanOptions {
        recurse: cfg.recurse,
        follow_symlinks: cfg.symlinks,
        min_size: cfg.min_size,
        exclude: cfg.exclude.iter().map(|s| s.into()).collect(),
    };
    let mut candidates = scan_roots(&cfg.roots, &options);
    if cfg.aliases {
        candidates = fold_aliases(candidates);
    }

    let limits = Limits { max_memory: cfg.max_memory, max_buffer: cfg.max_buffer };

    report::write_provenance(out, &cfg.argv)?;

    let mut group_count = 0u64;
    let mut dupe_count = 0u64;
    let mut excess = 0u64;

    for bucket in bucket_by_size(candidates, 2) {
        let size = bucket.size;
        let classes = match partition(size, bucket.candidates, &limits, false) {
            Ok(classes) => classes,
            Err(e) => {
                error!("skipping {}-byte files: {}", size, e);
                continue;
            }
        };

        let mut groups: Vec<Group> = classes.into_iter()
            .filter(|class| !cfg.only_mixed_roots || has_mixed_roots(class))
            .map(|class| make_group(size, class, criteria.as_ref()))
            .collect();
        // Several groups can share a size; order them by their first
        // path so runs are comparable.
        groups.sort_by(|a, b| {
            a.members[0].candidate.primary_path().cmp(b.members[0].candidate.primary_path())
        });

        for group in groups {
            group_count += 1;
            dupe_count += group.instances() as u64 - 1;
            excess += group.excess_bytes();
            report::write_group(out, &group)?;
        }
    }

    info!(
        "find: {} group(s), {} duplicate file(s), {} excess",
        group_count,
        dupe_count,
        human_bytes(excess),
    );
    Ok(())
}


fn has_mixed_roots(class: &[Candidate]) -> bool
{
    class.iter().any(|c| c.root_index != class[0].root_index)
}


/// Builds the group and, with criteria in play, marks the survivors:
/// a single survivor is the preferred file, several survivors are each
/// marked ambiguous.
fn make_group(size: u64, mut class: Vec<Candidate>, criteria: Option<&Criteria>) -> Group
{
    class.sort_by(|a, b| a.primary_path().cmp(b.primary_path()));

    let mut marks = vec![Mark::Unmarked; class.len()];
    if let Some(criteria) = criteria {
        let survivors = criteria.apply(&class);
        if survivors.len() == 1 {
            marks[survivors[0]] = Mark::Preferred;
        } else {
            for i in survivors {
                marks[i] = Mark::Ambiguous;
            }
        }
    }

    Group::from_parts(size, class, marks)
}


// Tests.
