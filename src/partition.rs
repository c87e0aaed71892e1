use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use anyhow::bail;
use log::{debug, warn};

use crate::candidate::Candidate;

/// Hard floor for per-file read buffers.
pub const MIN_BUFFER: u64 = 4096;


/// Memory limits for one comparison group.
#[derive(Copy, Clone, Debug)]
pub struct Limits {
    pub max_memory: u64,
    pub max_buffer: u64,
}

impl Limits {
    /// Per-file buffer size for a group of `n` members.
    fn buffer_size(&self, n: u64) -> u64
    {
        self.max_buffer.min((self.max_memory / n.max(1)).max(MIN_BUFFER))
    }

    /// True when `n` members cannot all hold a minimum buffer at once.
    fn needs_waves(&self, n: u64) -> bool
    {
        n > self.max_memory / MIN_BUFFER
    }

    /// Buffer size when only a reference and one comparison buffer
    /// coexist (wave mode); half the budget each, capped by max_buffer.
    fn wave_buffer_size(&self) -> u64
    {
        self.max_buffer.min(self.max_memory / 2).max(MIN_BUFFER)
    }
}


/// Partitions same-size candidates into byte-equality classes.
///
/// Every member of a returned class agrees with every other on all
/// `size` bytes. Classes with a single member are dropped unless
/// `keep_singletons` is set (correlate mode wants every content class).
/// A candidate that fails to open or read is ejected with a diagnostic
/// and the rest of its sub-group continues; only an unusable memory
/// budget fails the whole group.
pub fn partition(
    size: u64,
    candidates: Vec<Candidate>,
    limits: &Limits,
    keep_singletons: bool,
) -> anyhow::Result<Vec<Vec<Candidate>>>
{
    if limits.max_memory < MIN_BUFFER {
        bail!(
            "memory budget of {} byte(s) cannot hold the minimum {}-byte buffer",
            limits.max_memory,
            MIN_BUFFER
        );
    }

    let min_class = if keep_singletons { 1 } else { 2 };

    if candidates.len() < 2 || size == 0 {
        // A lone candidate, or empty files, need no reads at all.
        let classes = if candidates.len() >= min_class { vec![candidates] } else { Vec::new() };
        return Ok(classes);
    }

    let (classes, bytes_read) = if limits.needs_waves(candidates.len() as u64) {
        partition_waves(size, candidates, limits)?
    } else {
        partition_lockstep(size, candidates, limits)
    };
    debug!("partition: {} content class(es) after reading {} byte(s)", classes.len(), bytes_read);

    Ok(classes.into_iter().filter(|c| c.len() >= min_class).collect())
}


struct Member {
    candidate: Candidate,
    file: File,
    buf: Vec<u8>,
}

struct SubGroup {
    members: Vec<Member>,
    offset: u64,
}


/// The common path: every member holds its own buffer and all members of
/// a sub-group advance through the file in lockstep, splitting whenever
/// their blocks disagree. Also reports the content bytes read.
fn partition_lockstep(size: u64, candidates: Vec<Candidate>, limits: &Limits) -> (Vec<Vec<Candidate>>, u64)
{
    let buf_size = limits.buffer_size(candidates.len() as u64).min(size) as usize;
    debug!("partition: {} member(s), {}-byte buffers", candidates.len(), buf_size);

    let mut members = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match File::open(candidate.primary_path()) {
            Ok(file) => members.push(Member { candidate, file, buf: vec![0u8; buf_size] }),
            Err(e) => warn!("ejecting {}: {}", candidate.primary_path().display(), e),
        }
    }

    let mut bytes_read = 0u64;
    let mut classes = Vec::new();
    let mut stack = vec![SubGroup { members, offset: 0 }];

    while let Some(sub) = stack.pop() {
        if sub.members.is_empty() {
            continue;
        }
        // A sub-group is final once it runs out of bytes; a singleton is
        // final immediately, without reading the remainder.
        if sub.members.len() == 1 || sub.offset == size {
            classes.push(sub.members.into_iter().map(|m| m.candidate).collect());
            continue;
        }

        let want = buf_size.min((size - sub.offset) as usize);
        let mut alive = Vec::with_capacity(sub.members.len());
        for mut member in sub.members {
            match read_full(&mut member.file, &mut member.buf[..want]) {
                Ok(n) if n == want => {
                    bytes_read += n as u64;
                    alive.push(member);
                }
                Ok(n) => {
                    bytes_read += n as u64;
                    warn!(
                        "ejecting {}: file is shorter than its recorded size ({} < {})",
                        member.candidate.primary_path().display(),
                        sub.offset + n as u64,
                        size
                    );
                }
                Err(e) => warn!("ejecting {}: {}", member.candidate.primary_path().display(), e),
            }
        }

        let offset = sub.offset + want as u64;
        // Reversed so the first split is popped first; output order stays
        // deterministic either way.
        for part in split_by_block(alive, want).into_iter().rev() {
            stack.push(SubGroup { members: part, offset });
        }
    }

    (classes, bytes_read)
}


/// Splits members by the content of their current block. Members keep
/// their relative order.
fn split_by_block(members: Vec<Member>, want: usize) -> Vec<Vec<Member>>
{
    let mut parts: Vec<Vec<Member>> = Vec::new();

    for member in members {
        match parts.iter_mut().find(|p| p[0].buf[..want] == member.buf[..want]) {
            Some(part) => part.push(member),
            None => parts.push(vec![member]),
        }
    }

    parts
}


/// Fallback for groups too large to give every member a buffer: one
/// reference member is streamed once while every other member is compared
/// against it block by block, splitting the group into "equal to the
/// reference" and "everything else", which is re-queued. Non-reference
/// reads are stateless (open, seek, read, close), so only two buffers,
/// each taking at most half the memory budget, and two handles exist at
/// any instant.
fn partition_waves(size: u64, candidates: Vec<Candidate>, limits: &Limits) -> anyhow::Result<(Vec<Vec<Candidate>>, u64)>
{
    if limits.max_memory < 2 * MIN_BUFFER {
        bail!(
            "memory budget of {} byte(s) cannot hold a reference and a comparison buffer",
            limits.max_memory
        );
    }
    debug!("partition: {} member(s) exceed the buffer budget, comparing in waves", candidates.len());

    let mut bytes_read = 0u64;
    let mut classes = Vec::new();
    let mut worklist = vec![candidates];

    while let Some(mut cands) = worklist.pop() {
        if cands.is_empty() {
            continue;
        }
        if cands.len() == 1 {
            classes.push(cands);
            continue;
        }

        let reference = cands.remove(0);
        let (class, rest, bytes) = run_wave(size, reference, cands, limits);
        bytes_read += bytes;
        if !class.is_empty() {
            classes.push(class);
        }
        if !rest.is_empty() {
            worklist.push(rest);
        }
    }

    Ok((classes, bytes_read))
}


fn run_wave(
    size: u64,
    reference: Candidate,
    others: Vec<Candidate>,
    limits: &Limits,
) -> (Vec<Candidate>, Vec<Candidate>, u64)
{
    let mut bytes_read = 0u64;

    let mut ref_file = match File::open(reference.primary_path()) {
        Ok(f) => f,
        Err(e) => {
            warn!("ejecting {}: {}", reference.primary_path().display(), e);
            return (Vec::new(), others, bytes_read);
        }
    };

    let buf_size = limits.wave_buffer_size().min(size) as usize;
    let mut ref_buf = vec![0u8; buf_size];
    let mut cmp_buf = vec![0u8; buf_size];

    let mut active = others;
    let mut rest = Vec::new();
    let mut offset = 0u64;

    while offset < size && !active.is_empty() {
        let want = buf_size.min((size - offset) as usize);

        match read_full(&mut ref_file, &mut ref_buf[..want]) {
            Ok(n) if n == want => bytes_read += n as u64,
            Ok(n) => {
                bytes_read += n as u64;
                warn!(
                    "ejecting {}: file is shorter than its recorded size ({} < {})",
                    reference.primary_path().display(),
                    offset + n as u64,
                    size
                );
                rest.extend(active);
                return (Vec::new(), rest, bytes_read);
            }
            Err(e) => {
                warn!("ejecting {}: {}", reference.primary_path().display(), e);
                rest.extend(active);
                return (Vec::new(), rest, bytes_read);
            }
        }

        let mut still = Vec::with_capacity(active.len());
        for candidate in active {
            match read_block_at(candidate.primary_path(), offset, &mut cmp_buf[..want]) {
                Ok(()) => {
                    bytes_read += want as u64;
                    if cmp_buf[..want] == ref_buf[..want] {
                        still.push(candidate);
                    } else {
                        rest.push(candidate);
                    }
                }
                Err(e) => warn!("ejecting {}: {}", candidate.primary_path().display(), e),
            }
        }

        active = still;
        offset += want as u64;
    }

    let mut class = vec![reference];
    class.extend(active);
    (class, rest, bytes_read)
}


fn read_block_at(path: &Path, offset: u64, buf: &mut [u8]) -> std::io::Result<()>
{
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;

    let n = read_full(&mut file, buf)?;
    if n < buf.len() {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "file is shorter than its recorded size",
        ));
    }

    Ok(())
}


/// Reads until the buffer is full or the file ends.
fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize>
{
    let mut n = 0;

    while n < buf.len() {
        match file.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(n)
}


// Tests.
