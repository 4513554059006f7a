//! Rewrites natural-language phrasing into canonical script syntax.
//!
//! ```text
//! set total to price plus tax   →   var total = price + tax
//! if score is greater than 50 then pass = true end if   →   if score > 50 pass = true
//! ```
//!
//! Each line is handled on its own. String literals (single or double quoted,
//! backslash escapes honoured, possibly spanning lines) and comments, from a
//! `#` outside a literal to the end of its line, are copied through untouched.
//! Everything else goes through three passes:
//!
//! 1. ordered, case-insensitive phrase rules applied with `replace_all`;
//! 2. a split into whitespace runs, word runs and single characters, dropping
//!    removable words and swapping single-word replacements;
//! 3. collapsing whitespace runs into a single space.

use indexmap::{IndexMap, IndexSet};
use regex::{Regex, RegexBuilder};

const DEFAULT_PHRASES: &[(&str, &str)] = &[
    (r"\bset\s+([A-Za-z_][\w.]*)\s+to\b", "var ${1} ="),
    (r"\bis\s+greater\s+than\s+or\s+equal\s+to\b", ">="),
    (r"\bis\s+less\s+than\s+or\s+equal\s+to\b", "<="),
    (r"\bis\s+greater\s+than\b", ">"),
    (r"\bis\s+less\s+than\b", "<"),
    (r"\bis\s+not\s+equal\s+to\b", "!="),
    (r"\bis\s+equal\s+to\b", "=="),
    (r"\bequals\b", "=="),
    (r"\bplus\b", "+"),
    (r"\bminus\b", "-"),
    (r"\bmultiplied\s+by\b", "*"),
    (r"\btimes\b", "*"),
    (r"\bdivided\s+by\b", "/"),
    (r"\bmodulo\b", "%"),
    (r"\bmod\b", "%"),
    (r"\bend\s+(?:if|while|for|function)\b", ""),
];

const DEFAULT_REMOVABLES: &[&str] = &["then", "end"];

#[derive(Debug, Clone)]
struct PhraseRule {
    pattern: Regex,
    replacement: String,
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    phrases: Vec<PhraseRule>,
    replacements: IndexMap<String, String>,
    removables: IndexSet<String>,
    token_pattern: Regex,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// A preprocessor with the built-in English phrase rules.
    pub fn new() -> Self {
        let mut preprocessor = Self::empty();
        for (pattern, replacement) in DEFAULT_PHRASES {
            preprocessor.phrases.push(PhraseRule {
                pattern: phrase_regex(pattern).expect("built-in phrase rules are valid"),
                replacement: (*replacement).to_string(),
            });
        }
        for word in DEFAULT_REMOVABLES {
            preprocessor.register_removable(word);
        }
        preprocessor
    }

    /// A preprocessor with no rules at all; only whitespace is normalised.
    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
            replacements: IndexMap::new(),
            removables: IndexSet::new(),
            token_pattern: Regex::new(r"\s+|\w+|\S").expect("token pattern is valid"),
        }
    }

    /// Appends a phrase rule. `pattern` is a regular expression matched
    /// case-insensitively; `replacement` may refer to capture groups as `${1}`.
    pub fn register_phrase(
        &mut self,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<(), regex::Error> {
        self.phrases.push(PhraseRule {
            pattern: phrase_regex(pattern)?,
            replacement: replacement.into(),
        });
        Ok(())
    }

    /// Replaces a whole word (case-insensitive) with `replacement`.
    pub fn register_replacement(&mut self, word: &str, replacement: impl Into<String>) {
        self.replacements
            .insert(word.to_lowercase(), replacement.into());
    }

    /// Drops a whole word (case-insensitive) wherever it appears outside strings.
    pub fn register_removable(&mut self, word: &str) {
        self.removables.insert(word.to_lowercase());
    }

    pub fn process(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        let mut open_quote = None;
        for (idx, line) in input.split('\n').enumerate() {
            if idx > 0 {
                output.push('\n');
            }
            if open_quote.is_none() && line.trim_start().starts_with('#') {
                output.push_str(line);
                continue;
            }
            open_quote = self.process_line(line, open_quote, &mut output);
        }
        output
    }

    /// Returns the quote character of a string literal left open at the end
    /// of the line.
    fn process_line(
        &self,
        line: &str,
        mut open_quote: Option<char>,
        output: &mut String,
    ) -> Option<char> {
        let mut code_start = 0;
        let mut literal_start = 0;
        let mut escaped = false;
        for (idx, ch) in line.char_indices() {
            match open_quote {
                Some(quote) => {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == quote {
                        output.push_str(&line[literal_start..=idx]);
                        open_quote = None;
                        code_start = idx + 1;
                    }
                }
                None if ch == '"' || ch == '\'' => {
                    output.push_str(&self.rewrite(&line[code_start..idx]));
                    open_quote = Some(ch);
                    literal_start = idx;
                }
                // Trailing comment: quotes inside it never open a literal.
                None if ch == '#' => {
                    output.push_str(&self.rewrite(&line[code_start..idx]));
                    output.push_str(&line[idx..]);
                    return None;
                }
                None => {}
            }
        }
        match open_quote {
            Some(_) => output.push_str(&line[literal_start..]),
            None => output.push_str(&self.rewrite(&line[code_start..])),
        }
        open_quote
    }

    fn rewrite(&self, segment: &str) -> String {
        if segment.is_empty() {
            return String::new();
        }
        let mut text = segment.to_string();
        for rule in &self.phrases {
            text = rule
                .pattern
                .replace_all(&text, rule.replacement.as_str())
                .into_owned();
        }

        let mut merged = String::with_capacity(text.len());
        let mut previous_whitespace = false;
        for token in self.token_pattern.find_iter(&text).map(|m| m.as_str()) {
            if token.chars().all(char::is_whitespace) {
                if !previous_whitespace {
                    merged.push(' ');
                    previous_whitespace = true;
                }
                continue;
            }
            let key = token.to_lowercase();
            if self.removables.contains(&key) {
                continue;
            }
            match self.replacements.get(&key) {
                Some(replacement) => merged.push_str(replacement),
                None => merged.push_str(token),
            }
            previous_whitespace = false;
        }
        merged
    }
}

fn phrase_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
