use regex::RegexBuilder;

use super::lexer::{lex, Token, TokenKind};
use super::{Adjective, Criteria, CriteriaError, Extrema, Matcher, Phrase, Property, Test};

// Keyword tables. Multi-word keywords are matched longest-first, so
// "directory name" wins over "directory" and "is not" over "is".

const PROPERTIES: &[(&[&str], Property)] = &[
    (&["modification", "time"], Property::Mtime),
    (&["directory", "name"], Property::DirectoryName),
    (&["path"], Property::Path),
    (&["name"], Property::Name),
    (&["directory"], Property::Directory),
    (&["extension"], Property::Extension),
    (&["mtime"], Property::Mtime),
    (&["index"], Property::Index),
];

type OpBuilder = fn(String) -> Matcher;

const OPERATORS: &[(&[&str], (OpBuilder, bool))] = &[
    (&["is", "not"], (Matcher::Is, true)),
    (&["is"], (Matcher::Is, false)),
    (&["not", "contains"], (Matcher::Contains, true)),
    (&["contains"], (Matcher::Contains, false)),
    (&["not", "starts", "with"], (Matcher::StartsWith, true)),
    (&["starts", "with"], (Matcher::StartsWith, false)),
    (&["not", "ends", "with"], (Matcher::EndsWith, true)),
    (&["ends", "with"], (Matcher::EndsWith, false)),
];

const REGEX_OPERATORS: &[(&[&str], bool)] = &[
    (&["not", "matches", "re"], true),
    (&["not", "matches", "regex"], true),
    (&["not", "matches", "regexp"], true),
    (&["matches", "re"], false),
    (&["matches", "regex"], false),
    (&["matches", "regexp"], false),
];

const ADJECTIVES: &[(&[&str], Adjective)] = &[
    (&["shorter"], Adjective::Shorter),
    (&["longer"], Adjective::Longer),
    (&["shallower"], Adjective::Shallower),
    (&["deeper"], Adjective::Deeper),
    (&["earlier"], Adjective::Earlier),
    (&["lower"], Adjective::Earlier),
    (&["later"], Adjective::Later),
    (&["higher"], Adjective::Later),
];

const MODIFIER: &[&str] = &["ignoring", "case"];


pub fn parse(input: &str) -> Result<Criteria, CriteriaError>
{
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(CriteriaError::new(0, "empty criteria"));
    }

    let mut phrases = Vec::new();
    let mut rest: &[Token] = &tokens;

    loop {
        let split = rest.iter().position(|t| t.kind == TokenKind::Comma);
        let (phrase, next) = match split {
            Some(i) => (&rest[..i], Some(&rest[i..])),
            None => (rest, None),
        };

        if phrase.is_empty() {
            let pos = rest.first().map_or(input.len(), |t| t.pos);
            return Err(CriteriaError::new(pos, "empty phrase"));
        }
        phrases.push(parse_phrase(phrase, input.len())?);

        match next {
            // Skip the comma; a trailing comma leaves an empty phrase
            // behind, caught above on the next pass.
            Some(tail) => rest = &tail[1..],
            None => break,
        }
    }

    Ok(Criteria { phrases })
}


fn parse_phrase(tokens: &[Token], end: usize) -> Result<Phrase, CriteriaError>
{
    if let Some((property, used)) = match_keyword(tokens, PROPERTIES) {
        return parse_test(tokens, used, property, end);
    }

    if let Some((adjective, used)) = match_keyword(tokens, ADJECTIVES) {
        return parse_extrema(tokens, used, adjective, end);
    }

    Err(CriteriaError::new(tokens[0].pos, "expected a property or an adjective"))
}


fn parse_test(
    tokens: &[Token],
    mut at: usize,
    property: Property,
    end: usize,
) -> Result<Phrase, CriteriaError>
{
    let (build, negated, regex, used) = match match_keyword(&tokens[at..], OPERATORS) {
        Some(((build, negated), used)) => (Some(build), negated, false, used),
        None => match match_keyword(&tokens[at..], REGEX_OPERATORS) {
            Some((negated, used)) => (None, negated, true, used),
            None => {
                let pos = tokens.get(at).map_or(end, |t| t.pos);
                return Err(CriteriaError::new(pos, "expected an operator"));
            }
        },
    };
    at += used;

    let arg_token = tokens.get(at)
        .ok_or_else(|| CriteriaError::new(end, "missing argument"))?;
    let argument = match &arg_token.kind {
        TokenKind::Word(s) | TokenKind::Str(s) => s.clone(),
        TokenKind::Comma => unreachable!("commas delimit phrases"),
    };
    at += 1;

    let ignore_case = match_modifier(tokens, &mut at);
    expect_end(tokens, at)?;

    let matcher = if regex {
        let compiled = RegexBuilder::new(&argument)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| CriteriaError::new(arg_token.pos, format!("invalid regular expression: {}", e)))?;
        Matcher::Matches(compiled)
    } else {
        let build = build.expect("non-regex operator carries a builder");
        // Plain string comparisons fold case by lowercasing both sides;
        // the argument side is folded once, here.
        build(if ignore_case { argument.to_lowercase() } else { argument })
    };

    Ok(Phrase::Test(Test { property, matcher, negated, ignore_case }))
}


fn parse_extrema(
    tokens: &[Token],
    mut at: usize,
    adjective: Adjective,
    end: usize,
) -> Result<Phrase, CriteriaError>
{
    let (property, used) = match match_keyword(&tokens[at..], PROPERTIES) {
        Some(found) => found,
        None => {
            let pos = tokens.get(at).map_or(end, |t| t.pos);
            return Err(CriteriaError::new(pos, "expected a property"));
        }
    };

    let string_only = matches!(
        adjective,
        Adjective::Shorter | Adjective::Longer | Adjective::Shallower | Adjective::Deeper
    );
    if string_only && !property.is_string() {
        return Err(CriteriaError::new(
            tokens[at].pos,
            format!("{:?} applies to string properties only", adjective).to_lowercase(),
        ));
    }
    at += used;

    let ignore_case = match_modifier(tokens, &mut at);
    expect_end(tokens, at)?;

    Ok(Phrase::Extrema(Extrema { adjective, property, ignore_case }))
}


/// Matches the longest keyword from `table` at the start of `tokens`.
/// Only bare words participate; quoted strings never act as keywords.
fn match_keyword<T: Copy>(tokens: &[Token], table: &[(&[&str], T)]) -> Option<(T, usize)>
{
    let mut best: Option<(T, usize)> = None;

    for (words, value) in table {
        if words.len() <= best.map_or(0, |(_, n)| n) {
            continue;
        }
        let matched = words.len() <= tokens.len()
            && words.iter().zip(tokens).all(|(w, t)| {
                matches!(&t.kind, TokenKind::Word(s) if s.as_str() == *w)
            });
        if matched {
            best = Some((*value, words.len()));
        }
    }

    best
}


fn match_modifier(tokens: &[Token], at: &mut usize) -> bool
{
    match match_keyword(&tokens[*at..], &[(MODIFIER, ())]) {
        Some(((), used)) => {
            *at += used;
            true
        }
        None => false,
    }
}


fn expect_end(tokens: &[Token], at: usize) -> Result<(), CriteriaError>
{
    match tokens.get(at) {
        Some(t) => Err(CriteriaError::new(t.pos, "trailing input after phrase")),
        None => Ok(()),
    }
}


// Tests.
