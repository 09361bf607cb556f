//! Glob-style key matching
//!
//! Implements the pattern dialect Redis uses for `KEYS` and `SCAN MATCH` so that
//! in-process stores select the same keys a Redis server would:
//!
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a]` match one character from (or outside) a set
//! - `\x` matches `x` literally
//!
//! An unterminated `[` class runs to the end of the pattern.

/// Check whether `key` matches the glob `pattern`
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut pi, mut ki) = (0usize, 0usize);
    // (pattern index after the star, key index the star currently stops at)
    let mut backtrack: Option<(usize, usize)> = None;

    loop {
        if pi < pattern.len() {
            if pattern[pi] == '*' {
                while pi < pattern.len() && pattern[pi] == '*' {
                    pi += 1;
                }
                if pi == pattern.len() {
                    return true;
                }
                backtrack = Some((pi, ki));
                continue;
            }
            if ki < key.len() {
                if let Some(next) = match_token(&pattern, pi, key[ki]) {
                    pi = next;
                    ki += 1;
                    continue;
                }
            }
        } else if ki == key.len() {
            return true;
        }

        match backtrack {
            Some((star_pi, star_ki)) if star_ki < key.len() => {
                backtrack = Some((star_pi, star_ki + 1));
                pi = star_pi;
                ki = star_ki + 1;
            }
            _ => return false,
        }
    }
}

/// Check whether a pattern contains no wildcard syntax at all
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '[', '\\'])
}

/// Match the single token at `pattern[pi]` against `c`, returning the index
/// of the following token on success
fn match_token(pattern: &[char], pi: usize, c: char) -> Option<usize> {
    match pattern[pi] {
        '?' => Some(pi + 1),
        '\\' if pi + 1 < pattern.len() => (pattern[pi + 1] == c).then_some(pi + 2),
        '[' => match_class(pattern, pi + 1, c),
        literal => (literal == c).then_some(pi + 1),
    }
}

fn match_class(pattern: &[char], start: usize, c: char) -> Option<usize> {
    let mut i = start;
    let negate = pattern.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != ']' {
        if pattern[i] == '\\' && i + 1 < pattern.len() {
            matched |= pattern[i + 1] == c;
            i += 2;
        } else if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' {
            let (lo, hi) = if pattern[i] <= pattern[i + 2] {
                (pattern[i], pattern[i + 2])
            } else {
                (pattern[i + 2], pattern[i])
            };
            matched |= lo <= c && c <= hi;
            i += 3;
        } else {
            matched |= pattern[i] == c;
            i += 1;
        }
    }

    // Skip the closing bracket; an unterminated class ends with the pattern
    let next = if i < pattern.len() { i + 1 } else { i };
    (matched != negate).then_some(next)
}
