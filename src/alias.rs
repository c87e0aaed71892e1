use std::collections::HashMap;
use log::debug;

use crate::candidate::{Candidate, FileId};

/// Folds candidates that share filesystem identity (same device and
/// inode) into a single logical file carrying every path that resolved
/// to it. With symlink following enabled upstream, links fold with their
/// target's identity for free, since their metadata is the target's.
pub fn fold_aliases(candidates: Vec<Candidate>) -> Vec<Candidate>
{
    let before = candidates.len();
    let mut by_id: HashMap<FileId, Candidate> = HashMap::new();

    for candidate in candidates {
        match by_id.remove(&candidate.id) {
            Some(mut existing) => {
                existing.fold_alias(candidate);
                by_id.insert(existing.id, existing);
            }
            None => {
                by_id.insert(candidate.id, candidate);
            }
        }
    }

    let mut folded: Vec<Candidate> = by_id.into_values().collect();
    folded.sort_by(|a, b| a.primary_path().cmp(b.primary_path()));

    if folded.len() != before {
        debug!("alias: folded {} path(s) into {} file(s)", before, folded.len());
    }
    folded
}


// Tests.


#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::fold_aliases;
    use crate::candidate::{Candidate, FileId};

    fn cand(path: &str, ino: u64) -> Candidate
    {
        Candidate::new(PathBuf::from(path), 10, FileId { dev: 7, ino }, 1, 0)
    }

    #[test]
    fn distinct_files_pass_through()
    {
        let folded = fold_aliases(vec![cand("a", 1), cand("b", 2)]);

        assert_eq!(folded.len(), 2);
    }

    #[test]
    fn shared_identity_folds_to_one_candidate()
    {
        let folded = fold_aliases(vec![cand("b", 1), cand("a", 1), cand("c", 2)]);

        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].primary_path(), PathBuf::from("a").as_path());
        assert_eq!(folded[0].name_count(), 2);
    }

    #[test]
    fn folding_twice_changes_nothing()
    {
        let once = fold_aliases(vec![cand("b", 1), cand("a", 1)]);
        let twice = fold_aliases(once.clone());

        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].paths(), twice[0].paths());
    }

    #[test]
    fn same_inode_on_other_device_is_distinct()
    {
        let mut other = cand("a", 1);
        other.id = FileId { dev: 8, ino: 1 };

        let folded = fold_aliases(vec![cand("b", 1), other]);

        assert_eq!(folded.len(), 2);
    }
}
