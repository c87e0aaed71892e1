use std::path::MAIN_SEPARATOR;

use crate::candidate::Candidate;
use super::{Adjective, Extrema, Matcher, Phrase, Property, Test};

/// Runs a compiled program over a group. Each phrase narrows the marked
/// set; a phrase that would eliminate every member is a no-op, so the
/// result is never empty for a non-empty group. A single survivor stops
/// evaluation early.
pub(super) fn apply_phrases(phrases: &[Phrase], group: &[Candidate]) -> Vec<usize>
{
    let mut marked: Vec<usize> = (0..group.len()).collect();

    for phrase in phrases {
        if marked.len() <= 1 {
            break;
        }

        let survivors = match phrase {
            Phrase::Test(test) => marked.iter()
                .copied()
                .filter(|&i| test.holds(&group[i]))
                .collect(),
            Phrase::Extrema(extrema) => extrema.select(group, &marked),
        };

        if !survivors.is_empty() {
            marked = survivors;
        }
    }

    marked
}


impl Test {
    fn holds(&self, candidate: &Candidate) -> bool
    {
        let value = string_value(self.property, candidate);

        let hit = match &self.matcher {
            // Case-insensitive regexes carry the engine flag instead of
            // transforming the input.
            Matcher::Matches(re) => re.is_match(&value),
            matcher => {
                let folded;
                let value = if self.ignore_case {
                    folded = value.to_lowercase();
                    folded.as_str()
                } else {
                    value.as_str()
                };
                match matcher {
                    Matcher::Is(arg) => value == arg.as_str(),
                    Matcher::Contains(arg) => value.contains(arg.as_str()),
                    Matcher::StartsWith(arg) => value.starts_with(arg.as_str()),
                    Matcher::EndsWith(arg) => value.ends_with(arg.as_str()),
                    Matcher::Matches(_) => unreachable!(),
                }
            }
        };

        hit != self.negated
    }
}


/// Ordering key for one candidate under an extrema phrase. Keys within a
/// phrase are always the same variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Num(i64),
    Str(String),
}

impl Extrema {
    fn select(&self, group: &[Candidate], marked: &[usize]) -> Vec<usize>
    {
        let keys: Vec<Key> = marked.iter().map(|&i| self.key(&group[i])).collect();

        let want_max = matches!(self.adjective, Adjective::Longer | Adjective::Deeper | Adjective::Later);
        let best = match if want_max { keys.iter().max() } else { keys.iter().min() } {
            Some(best) => best.clone(),
            None => return Vec::new(),
        };

        marked.iter()
            .zip(&keys)
            .filter(|(_, key)| **key == best)
            .map(|(&i, _)| i)
            .collect()
    }

    fn key(&self, candidate: &Candidate) -> Key
    {
        match self.adjective {
            Adjective::Shorter | Adjective::Longer => {
                let value = string_value(self.property, candidate);
                Key::Num(value.chars().count() as i64)
            }
            Adjective::Shallower | Adjective::Deeper => {
                let value = string_value(self.property, candidate);
                Key::Num(value.matches(MAIN_SEPARATOR).count() as i64)
            }
            Adjective::Earlier | Adjective::Later => match self.property {
                Property::Mtime => Key::Num(candidate.mtime_ns),
                Property::Index => Key::Num(candidate.root_index as i64),
                _ => {
                    let value = string_value(self.property, candidate);
                    Key::Str(if self.ignore_case { value.to_lowercase() } else { value })
                }
            },
        }
    }
}


/// The string rendition of a property; criteria always evaluate over the
/// primary path. Non-string properties render as decimal.
fn string_value(property: Property, candidate: &Candidate) -> String
{
    let path = candidate.primary_path().to_string_lossy();

    match property {
        Property::Path => path.into_owned(),
        Property::Name => name_of(&path).to_string(),
        Property::Directory => directory_of(&path).to_string(),
        Property::DirectoryName => directory_name_of(&path).to_string(),
        Property::Extension => extension_of(name_of(&path)).to_string(),
        Property::Mtime => candidate.mtime_ns.to_string(),
        Property::Index => candidate.root_index.to_string(),
    }
}


/// Portion after the last path separator.
fn name_of(path: &str) -> &str
{
    match path.rfind(MAIN_SEPARATOR) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}


/// Portion up to and including the last separator; empty without one.
fn directory_of(path: &str) -> &str
{
    match path.rfind(MAIN_SEPARATOR) {
        Some(i) => &path[..=i],
        None => "",
    }
}


/// Last component of the directory portion; empty without one.
fn directory_name_of(path: &str) -> &str
{
    let dir = match path.rfind(MAIN_SEPARATOR) {
        Some(i) => &path[..i],
        None => return "",
    };

    match dir.rfind(MAIN_SEPARATOR) {
        Some(i) => &dir[i + 1..],
        None => dir,
    }
}


/// Last dot-delimited suffix of the name, including the dot; empty when
/// the name has no dot or only a leading one.
fn extension_of(name: &str) -> &str
{
    match name.rfind('.') {
        Some(i) if i > 0 => &name[i..],
        _ => "",
    }
}


// Tests.


#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::super::Criteria;
    use super::{directory_name_of, directory_of, extension_of, name_of};
    use crate::candidate::{Candidate, FileId};

    fn cand(path: &str) -> Candidate
    {
        Candidate::new(PathBuf::from(path), 10, FileId { dev: 1, ino: 1 }, 1, 0)
    }

    fn apply(criteria: &str, paths: &[&str]) -> Vec<usize>
    {
        let group: Vec<Candidate> = paths.iter().map(|p| cand(p)).collect();
        Criteria::parse(criteria).unwrap().apply(&group)
    }

    #[test]
    fn path_component_semantics()
    {
        assert_eq!(name_of("a/b/c.txt"), "c.txt");
        assert_eq!(name_of("c.txt"), "c.txt");
        assert_eq!(name_of("a/b/"), "");

        assert_eq!(directory_of("a/b/c.txt"), "a/b/");
        assert_eq!(directory_of("c.txt"), "");

        assert_eq!(directory_name_of("a/b/c.txt"), "b");
        assert_eq!(directory_name_of("b/c.txt"), "b");
        assert_eq!(directory_name_of("c.txt"), "");

        assert_eq!(extension_of("photo.jpg"), ".jpg");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("trailing."), ".");
    }

    #[test]
    fn result_is_a_nonempty_subset()
    {
        let marked = apply("name is nothing-matches-this", &["a/x", "b/x"]);

        // The phrase would eliminate everyone; it is a no-op instead.
        assert_eq!(marked, vec![0, 1]);
    }

    #[test]
    fn boolean_phrase_keeps_matching_members()
    {
        let marked = apply("directory name is keep", &["drop/x", "keep/x", "keep/y"]);

        assert_eq!(marked, vec![1, 2]);
    }

    #[test]
    fn shortest_path_wins()
    {
        let marked = apply("shorter path", &["./backup/photo.jpg", "./photo.jpg", "./Copy of photo.jpg"]);

        assert_eq!(marked, vec![1]);
    }

    #[test]
    fn ties_keep_everyone_tied()
    {
        let marked = apply("shorter path", &["photo1.jpg", "photo2.jpg", "Copy of photo.jpg"]);

        assert_eq!(marked, vec![0, 1]);
    }

    #[test]
    fn later_phrases_break_ties()
    {
        let marked = apply("shorter path, earlier path", &["photo2.jpg", "photo1.jpg", "Copy of photo.jpg"]);

        assert_eq!(marked, vec![1]);
    }

    #[test]
    fn extrema_phrases_are_idempotent()
    {
        let once = apply("shorter path", &["aa/x", "b/x", "c/x"]);
        let twice = apply("shorter path, shorter path", &["aa/x", "b/x", "c/x"]);

        assert_eq!(once, twice);
    }

    #[test]
    fn evaluation_stops_at_a_single_survivor()
    {
        // The second phrase matches nobody and would normally be a
        // no-op; with one survivor it is never even evaluated.
        let marked = apply("name is x, name is y", &["a/x", "b/y"]);

        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn ignoring_case_on_tests()
    {
        let marked = apply("name is FOO ignoring case", &["a/foo", "b/bar"]);

        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn ignoring_case_on_regexes()
    {
        let marked = apply("name matches re ^F.O$ ignoring case", &["a/foo", "b/bar"]);

        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn regex_is_anchored_only_where_asked()
    {
        let marked = apply("path matches re photo", &["x/photograph", "x/plain"]);

        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn depth_counts_separators()
    {
        let marked = apply("shallower path", &["a/b/x", "a/x", "a/b/c/x"]);
        assert_eq!(marked, vec![1]);

        let marked = apply("deeper path", &["a/b/x", "a/x", "a/b/c/x"]);
        assert_eq!(marked, vec![2]);
    }

    #[test]
    fn extrema_on_numeric_properties()
    {
        let mut old = cand("a/x");
        old.mtime_ns = 100;
        let mut new = cand("b/x");
        new.mtime_ns = 200;
        let mut far = cand("c/x");
        far.mtime_ns = 150;
        far.root_index = 3;

        let group = vec![old, new, far];

        let marked = Criteria::parse("earlier mtime").unwrap().apply(&group);
        assert_eq!(marked, vec![0]);

        let marked = Criteria::parse("later modification time").unwrap().apply(&group);
        assert_eq!(marked, vec![1]);

        let marked = Criteria::parse("higher index").unwrap().apply(&group);
        assert_eq!(marked, vec![2]);
    }

    #[test]
    fn index_renders_as_decimal_for_tests()
    {
        let mut second = cand("b/x");
        second.root_index = 2;
        let group = vec![cand("a/x"), second];

        let marked = Criteria::parse("index is 2").unwrap().apply(&group);

        assert_eq!(marked, vec![1]);
    }

    #[test]
    fn single_member_groups_short_circuit()
    {
        let marked = apply("name is whatever", &["only/x"]);

        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn starts_ends_contains()
    {
        assert_eq!(apply("name starts with ph", &["a/photo", "a/graph"]), vec![0]);
        assert_eq!(apply("name ends with .bak", &["a/x.bak", "a/x"]), vec![0]);
        assert_eq!(apply("path contains backup", &["backup/x", "a/x"]), vec![0]);
        assert_eq!(apply("name not contains tmp", &["a/tmp1", "a/keep"]), vec![1]);
    }
}
