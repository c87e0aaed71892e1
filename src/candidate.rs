use std::path::{Path, PathBuf};

/// Filesystem identity of a file: device and inode number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}


/// A regular file under consideration.
///
/// A candidate can carry several paths when alias folding merged
/// hardlinked (or followed-symlink) names; the path list is kept sorted
/// and its first entry is the primary path used in reports and criteria.
#[derive(Clone, Debug)]
pub struct Candidate {
    paths: Vec<PathBuf>,
    pub size: u64,
    pub id: FileId,
    /// 1-based position of the command-line argument this file came from.
    pub root_index: u32,
    /// Modification time in nanoseconds since the epoch, captured at scan time.
    pub mtime_ns: i64,
}

impl Candidate {
    pub fn new(path: PathBuf, size: u64, id: FileId, root_index: u32, mtime_ns: i64) -> Self
    {
        Self {
            paths: vec![path],
            size,
            id,
            root_index,
            mtime_ns,
        }
    }

    /// The lexicographically first alias; the path criteria evaluate over.
    pub fn primary_path(&self) -> &Path
    {
        &self.paths[0]
    }

    /// All paths naming this file, sorted.
    pub fn paths(&self) -> &[PathBuf]
    {
        &self.paths
    }

    pub fn name_count(&self) -> usize
    {
        self.paths.len()
    }

    /// Absorbs another candidate's paths. Idempotent: a path already
    /// present is not added twice.
    pub fn fold_alias(&mut self, other: Candidate)
    {
        for path in other.paths {
            if let Err(pos) = self.paths.binary_search(&path) {
                self.paths.insert(pos, path);
            }
        }
    }
}


/// Per-candidate flag set by the criteria engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mark {
    Preferred,
    Ambiguous,
    Unmarked,
}


/// One member of a finalized group.
#[derive(Clone, Debug)]
pub struct Member {
    pub candidate: Candidate,
    pub mark: Mark,
}


/// A set of candidates proven byte-equal.
#[derive(Clone, Debug)]
pub struct Group {
    pub size: u64,
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(size: u64, candidates: Vec<Candidate>) -> Self
    {
        let marks = vec![Mark::Unmarked; candidates.len()];
        Self::from_parts(size, candidates, marks)
    }

    /// Builds a group from candidates and their marks; marks travel with
    /// their candidates through the ordering by primary path.
    pub fn from_parts(size: u64, candidates: Vec<Candidate>, marks: Vec<Mark>) -> Self
    {
        let mut members: Vec<Member> = candidates.into_iter()
            .zip(marks)
            .map(|(candidate, mark)| Member { candidate, mark })
            .collect();
        members.sort_by(|a, b| a.candidate.primary_path().cmp(b.candidate.primary_path()));

        Self { size, members }
    }

    pub fn instances(&self) -> usize
    {
        self.members.len()
    }

    /// Bytes that would be reclaimed by keeping a single instance.
    pub fn excess_bytes(&self) -> u64
    {
        self.size * (self.members.len() as u64 - 1)
    }

    pub fn name_count(&self) -> usize
    {
        self.members.iter().map(|m| m.candidate.name_count()).sum()
    }
}


// Tests.


#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::{Candidate, FileId, Group, Mark};

    fn cand(path: &str) -> Candidate
    {
        Candidate::new(PathBuf::from(path), 10, FileId { dev: 1, ino: 1 }, 1, 0)
    }

    #[test]
    fn primary_path_is_lexicographically_first()
    {
        let mut c = cand("b/file");
        c.fold_alias(cand("a/file"));
        c.fold_alias(cand("c/file"));

        assert_eq!(c.primary_path(), PathBuf::from("a/file").as_path());
        assert_eq!(c.name_count(), 3);
    }

    #[test]
    fn fold_alias_is_idempotent()
    {
        let mut c = cand("a/file");
        c.fold_alias(cand("b/file"));
        c.fold_alias(cand("b/file"));

        assert_eq!(c.name_count(), 2);
    }

    #[test]
    fn fold_alias_is_associative()
    {
        let mut left = cand("m");
        let mut left_tail = cand("a");
        left_tail.fold_alias(cand("z"));
        left.fold_alias(left_tail);

        let mut right = cand("m");
        right.fold_alias(cand("a"));
        right.fold_alias(cand("z"));

        assert_eq!(left.paths(), right.paths());
    }

    #[test]
    fn group_members_sorted_and_unmarked()
    {
        let group = Group::new(10, vec![cand("b"), cand("a")]);

        assert_eq!(group.members[0].candidate.primary_path(), PathBuf::from("a").as_path());
        assert_eq!(group.members[1].candidate.primary_path(), PathBuf::from("b").as_path());
        assert!(group.members.iter().all(|m| m.mark == Mark::Unmarked));
    }

    #[test]
    fn excess_counts_all_but_one_instance()
    {
        let group = Group::new(10, vec![cand("a"), cand("b"), cand("c")]);

        assert_eq!(group.instances(), 3);
        assert_eq!(group.excess_bytes(), 20);
        assert_eq!(group.name_count(), 3);
    }
}
