use std::collections::HashMap;
use log::info;

use crate::candidate::Candidate;

/// Candidates sharing one exact byte size.
#[derive(Debug)]
pub struct Bucket {
    pub size: u64,
    pub candidates: Vec<Candidate>,
}


/// Groups candidates by exact size and drops buckets with fewer than
/// `min_members` entries. Buckets come back in descending size order so
/// an aborted run has already reported the highest-value groups.
pub fn bucket_by_size(candidates: Vec<Candidate>, min_members: usize) -> Vec<Bucket>
{
    let mut by_size: HashMap<u64, Vec<Candidate>> = HashMap::new();
    for candidate in candidates {
        by_size.entry(candidate.size).or_insert_with(Vec::new).push(candidate);
    }

    let mut buckets: Vec<Bucket> = by_size.into_iter()
        .filter(|(_, members)| members.len() >= min_members)
        .map(|(size, candidates)| Bucket { size, candidates })
        .collect();
    buckets.sort_by(|a, b| b.size.cmp(&a.size));

    info!("bucket: {} size class(es) to compare", buckets.len());
    buckets
}


// Tests.


#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::bucket_by_size;
    use crate::candidate::{Candidate, FileId};

    fn cand(path: &str, size: u64) -> Candidate
    {
        let ino = path.as_bytes()[0] as u64;
        Candidate::new(PathBuf::from(path), size, FileId { dev: 1, ino }, 1, 0)
    }

    #[test]
    fn singleton_sizes_are_discarded()
    {
        let buckets = bucket_by_size(vec![cand("a", 5), cand("b", 5), cand("c", 9)], 2);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].size, 5);
        assert_eq!(buckets[0].candidates.len(), 2);
    }

    #[test]
    fn singletons_survive_when_requested()
    {
        let buckets = bucket_by_size(vec![cand("a", 5), cand("c", 9)], 1);

        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn buckets_come_largest_first()
    {
        let input = vec![
            cand("a", 5), cand("b", 5),
            cand("c", 90), cand("d", 90),
            cand("e", 30), cand("f", 30),
        ];

        let sizes: Vec<u64> = bucket_by_size(input, 2).iter().map(|b| b.size).collect();

        assert_eq!(sizes, vec![90, 30, 5]);
    }
}
