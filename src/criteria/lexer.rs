use super::CriteriaError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word; the only token kind eligible to be a keyword.
    Word(String),
    /// A quoted string; always an argument.
    Str(String),
    Comma,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}


/// Splits a criteria string into words, quoted strings and commas.
/// Whitespace separates tokens and is otherwise discarded. A bare word
/// ends at the first unescaped whitespace or comma; backslash escapes
/// the character after it. Quoted strings escape their own quote and
/// the backslash.
pub fn lex(input: &str) -> Result<Vec<Token>, CriteriaError>
{
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == ',' {
            chars.next();
            tokens.push(Token { kind: TokenKind::Comma, pos });
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let text = lex_quoted(&mut chars, c, pos)?;
            tokens.push(Token { kind: TokenKind::Str(text), pos });
            continue;
        }

        let text = lex_word(&mut chars)?;
        tokens.push(Token { kind: TokenKind::Word(text), pos });
    }

    Ok(tokens)
}


fn lex_word(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Result<String, CriteriaError>
{
    let mut text = String::new();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            break;
        }
        chars.next();

        if c == '\\' {
            match chars.next() {
                Some((_, escaped)) => text.push(escaped),
                None => return Err(CriteriaError::new(pos, "dangling escape")),
            }
        } else {
            text.push(c);
        }
    }

    Ok(text)
}


fn lex_quoted(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, CriteriaError>
{
    let mut text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == quote {
            return Ok(text);
        }

        if c == '\\' {
            match chars.next() {
                // Only the quote and the backslash are escapable; any
                // other pair passes through verbatim.
                Some((_, escaped)) if escaped == quote || escaped == '\\' => text.push(escaped),
                Some((_, other)) => {
                    text.push('\\');
                    text.push(other);
                }
                None => break,
            }
        } else {
            text.push(c);
        }
    }

    Err(CriteriaError::new(start, "unclosed quoted string"))
}


// Tests.
