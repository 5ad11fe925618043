//! Shell-style wildcard matching for origin patterns.
//!
//! Supported syntax:
//!
//! | token    | matches                                          |
//! |----------|--------------------------------------------------|
//! | `*`      | any sequence of characters, including none and `/` |
//! | `?`      | exactly one character                            |
//! | `[abc]`  | one character from the set (ranges like `a-z`)   |
//! | `[!abc]` | one character not in the set (`^` also negates)  |
//! | `\x`     | the literal character `x`                        |
//!
//! A malformed pattern (an unterminated `[` or a trailing `\`) never matches.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::Star => false,
            Token::Class { negated, ranges } => {
                let hit = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
                hit != *negated
            }
        }
    }
}

/// Returns true if `pattern` contains wildcard metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '\\'])
}

/// Matches `text` against a shell-style wildcard `pattern`.
///
/// ```
/// use corsgate_middleware::cors::glob::glob_match;
///
/// assert!(glob_match("*.example.com", "https://api.example.com"));
/// assert!(glob_match("http://localhost:80?0", "http://localhost:8080"));
/// assert!(!glob_match("*.example.com", "https://example.org"));
/// assert!(!glob_match("[abc", "a"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let Some(tokens) = tokenize(pattern) else {
        return false;
    };
    let text: Vec<char> = text.chars().collect();
    match_tokens(&tokens, &text)
}

fn tokenize(pattern: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '*' => {
                // Consecutive stars are equivalent to one.
                if tokens.last() == Some(&Token::Star) {
                    continue;
                }
                Token::Star
            }
            '?' => Token::AnyChar,
            '\\' => Token::Literal(chars.next()?),
            '[' => {
                let negated = matches!(chars.peek(), Some('!' | '^'));
                if negated {
                    chars.next();
                }

                let mut ranges = Vec::new();
                let mut first = true;
                loop {
                    let mut lo = chars.next()?;
                    if lo == ']' && !first {
                        break;
                    }
                    first = false;
                    if lo == '\\' {
                        lo = chars.next()?;
                    }

                    let mut hi = lo;
                    if chars.peek() == Some(&'-') {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        match lookahead.peek() {
                            Some(']') | None => {}
                            Some(_) => {
                                chars.next();
                                hi = chars.next()?;
                                if hi == '\\' {
                                    hi = chars.next()?;
                                }
                            }
                        }
                    }
                    ranges.push((lo, hi));
                }
                Token::Class { negated, ranges }
            }
            other => Token::Literal(other),
        };
        tokens.push(token);
    }

    Some(tokens)
}

fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    let mut t = 0;
    let mut s = 0;
    // Position of the last star seen and the text offset it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while s < text.len() {
        if let Some(token) = tokens.get(t) {
            if *token == Token::Star {
                backtrack = Some((t, s));
                t += 1;
                continue;
            }
            if token.matches(text[s]) {
                t += 1;
                s += 1;
                continue;
            }
        }

        match backtrack {
            Some((star, absorbed)) => {
                t = star + 1;
                s = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            None => return false,
        }
    }

    tokens[t..].iter().all(|token| *token == Token::Star)
}
