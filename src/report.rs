use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail};

use crate::candidate::{Group, Mark};
use crate::util::human_bytes;

/// Opening comment lines: which tool wrote the report and with which
/// arguments. Readers skip `#` lines, so an executed report stays
/// self-describing at no cost.
pub fn write_provenance<W: Write>(out: &mut W, args: &[String]) -> io::Result<()>
{
    writeln!(out, "# {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "# arguments: {}", args.join(" "))?;
    writeln!(out)
}


/// Serializes one group block: the header line, then one line per path,
/// each prefixed by its two-character mark, then a separating blank line.
pub fn write_group<W: Write>(out: &mut W, group: &Group) -> io::Result<()>
{
    writeln!(
        out,
        "## Size: {} Instances: {} Excess: {} Names: {}",
        human_bytes(group.size),
        group.instances(),
        human_bytes(group.excess_bytes()),
        group.name_count(),
    )?;

    for member in &group.members {
        let prefix = mark_prefix(member.mark);
        for path in member.candidate.paths() {
            writeln!(out, "{}{}", prefix, path.display())?;
        }
    }

    writeln!(out)
}


fn mark_prefix(mark: Mark) -> &'static str
{
    match mark {
        Mark::Preferred => "> ",
        Mark::Ambiguous => "? ",
        Mark::Unmarked => "  ",
    }
}


/// One file line read back from a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    pub mark: Mark,
    pub path: PathBuf,
}

/// One block read back from a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportGroup {
    pub entries: Vec<ReportEntry>,
}


pub fn read_report(path: &Path) -> anyhow::Result<Vec<ReportGroup>>
{
    let file = File::open(path)
        .map_err(|e| anyhow!("{}: {}", path.display(), e))?;

    parse_report(BufReader::new(file))
}


/// Parses report text: blank-line-separated blocks, `#` comment lines,
/// and file lines whose first two characters are the mark. Any other
/// shape is a report-parse error; callers must not mutate anything once
/// this fails.
pub fn parse_report<R: BufRead>(input: R) -> anyhow::Result<Vec<ReportGroup>>
{
    let mut groups = Vec::new();
    let mut entries = Vec::new();

    for (i, line) in input.lines().enumerate() {
        let line = line?;

        if line.is_empty() {
            if !entries.is_empty() {
                groups.push(ReportGroup { entries: std::mem::take(&mut entries) });
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if line.len() < 3 || !line.is_char_boundary(2) {
            bail!("report line {}: malformed file line {:?}", i + 1, line);
        }
        let (mark, path) = line.split_at(2);
        let mark = match mark {
            "> " => Mark::Preferred,
            "? " => Mark::Ambiguous,
            "  " => Mark::Unmarked,
            other => bail!("report line {}: unknown mark {:?}", i + 1, other),
        };

        entries.push(ReportEntry { mark, path: PathBuf::from(path) });
    }

    if !entries.is_empty() {
        groups.push(ReportGroup { entries });
    }

    Ok(groups)
}


// Tests.
