//! The preference-criteria language: a comma-separated sequence of
//! phrases applied to a duplicate group to narrow it down to the files
//! worth keeping.

use std::fmt;
use regex::Regex;

use crate::candidate::Candidate;

mod eval;
mod lexer;
mod parser;


/// A criteria string rejected by the lexer or the parser. Carries the
/// byte offset of the offending position in the input.
#[derive(Debug)]
pub struct CriteriaError {
    pub pos: usize,
    msg: String,
}

impl CriteriaError {
    fn new(pos: usize, msg: impl Into<String>) -> Self
    {
        Self { pos, msg: msg.into() }
    }
}

impl fmt::Display for CriteriaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "at offset {}: {}", self.pos, self.msg)
    }
}

impl std::error::Error for CriteriaError {}


/// A compiled criteria program. Immutable once parsed; applied
/// independently to each emitted group.
#[derive(Debug)]
pub struct Criteria {
    phrases: Vec<Phrase>,
}

impl Criteria {
    /// Compiles a criteria string. Any lexical or grammatical problem,
    /// including a regex that does not compile, fails the whole program.
    pub fn parse(input: &str) -> Result<Self, CriteriaError>
    {
        parser::parse(input)
    }

    /// Applies the program to a group and returns the indices of the
    /// members left marked. Never empty for a non-empty group: a phrase
    /// that would eliminate everyone is a no-op instead.
    pub fn apply(&self, group: &[Candidate]) -> Vec<usize>
    {
        eval::apply_phrases(&self.phrases, group)
    }
}


#[derive(Debug)]
enum Phrase {
    Test(Test),
    Extrema(Extrema),
}


/// A boolean test: keep the candidates for which it holds.
#[derive(Debug)]
struct Test {
    property: Property,
    matcher: Matcher,
    negated: bool,
    ignore_case: bool,
}

#[derive(Debug)]
enum Matcher {
    Is(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches(Regex),
}


/// An extrema selector: keep the candidates whose key is minimal or
/// maximal; ties keep everyone tied.
#[derive(Debug)]
struct Extrema {
    adjective: Adjective,
    property: Property,
    ignore_case: bool,
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Property {
    Path,
    Name,
    Directory,
    DirectoryName,
    Extension,
    Mtime,
    Index,
}

impl Property {
    fn is_string(self) -> bool
    {
        !matches!(self, Property::Mtime | Property::Index)
    }
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Adjective {
    Shorter,
    Longer,
    Shallower,
    Deeper,
    Earlier,
    Later,
}


/// Text for `--prefer-help`.
pub const HELP: &str = "\
A criteria string is a comma-separated list of phrases. Each phrase
either tests the members of a duplicate group or keeps the extremes;
phrases apply in order, and a phrase that would eliminate every member
is skipped. Once a single member is left, the rest of the program is
ignored.

Boolean phrases:   PROPERTY OPERATOR ARGUMENT [ignoring case]
Extrema phrases:   ADJECTIVE PROPERTY [ignoring case]

Properties:  path, name, directory, directory name, extension,
             mtime (or: modification time), index
Operators:   is, contains, starts with, ends with,
             matches re (or: regex, regexp); each takes a leading
             'not' (operator 'is' negates as 'is not')
Adjectives:  shorter, longer         (length of the text)
             shallower, deeper      (number of path separators)
             earlier, later         (smallest / largest value;
             lower, higher           synonyms)

Arguments are a single word, or a string in single or double quotes;
backslash escapes spaces, quotes and itself. Regular expressions use
the Rust regex crate syntax; 'ignoring case' sets the engine's
case-insensitive flag.

Examples:
    shorter path
    name is 'holiday.jpg' ignoring case, earlier mtime
    directory name not contains backup, deeper path
";
