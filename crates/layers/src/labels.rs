use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scene::entity::Entity;

use crate::symbology::{TextSource, TextStyle};

// Word starts for title case: an ASCII word character followed by non-space text.
static TITLE_WORD: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"[0-9A-Za-z_]\S*"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextCase {
    Upper,
    Lower,
    Title,
}

impl TextCase {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upper" => Some(TextCase::Upper),
            "lower" => Some(TextCase::Lower),
            "title" => Some(TextCase::Title),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            TextCase::Upper => text.to_uppercase(),
            TextCase::Lower => text.to_lowercase(),
            TextCase::Title => title_case(text),
        }
    }
}

/// Upper-cases the first character of each word, leaving the rest untouched.
fn title_case(text: &str) -> String {
    let Ok(re) = TITLE_WORD.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        let word = &caps[0];
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }
    })
    .into_owned()
}

/// A replacement string in JavaScript `String.prototype.replace` syntax, resolved once
/// against the regex it will run with.
///
/// `$$` is a dollar sign, `$&` the match, `` $` `` and `$'` the text before and after it,
/// `$n`/`$nn` a numbered group and `$<name>` a named group. A `$` that starts none of these
/// is literal, as is a group number the regex does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceTemplate {
    parts: Vec<ReplacePart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplacePart {
    Literal(String),
    Whole,
    Before,
    After,
    Group(usize),
    Named(String),
}

impl ReplaceTemplate {
    pub fn parse(template: &str, regex: &Regex) -> Self {
        let groups = regex.captures_len().saturating_sub(1);
        let named = regex.capture_names().flatten().next().is_some();

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            match replace_token(tail, groups, named) {
                Some((ReplacePart::Literal(s), used)) => {
                    literal.push_str(&s);
                    rest = &tail[used..];
                }
                Some((part, used)) => {
                    if !literal.is_empty() {
                        parts.push(ReplacePart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                    rest = &tail[used..];
                }
                None => {
                    literal.push('$');
                    rest = tail;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(ReplacePart::Literal(literal));
        }
        Self { parts }
    }

    /// Replaces every match of `regex` in `text`.
    pub fn replace_all(&self, regex: &Regex, text: &str) -> String {
        regex
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = caps.get(0);
                let mut out = String::new();
                for part in &self.parts {
                    match part {
                        ReplacePart::Literal(s) => out.push_str(s),
                        ReplacePart::Whole => out.push_str(whole.map_or("", |m| m.as_str())),
                        ReplacePart::Before => out.push_str(&text[..whole.map_or(0, |m| m.start())]),
                        ReplacePart::After => {
                            out.push_str(&text[whole.map_or(text.len(), |m| m.end())..])
                        }
                        ReplacePart::Group(i) => out.push_str(caps.get(*i).map_or("", |m| m.as_str())),
                        ReplacePart::Named(name) => {
                            out.push_str(caps.name(name).map_or("", |m| m.as_str()))
                        }
                    }
                }
                out
            })
            .into_owned()
    }
}

/// Token after a `$` and the bytes it consumed, or `None` when the `$` is literal.
fn replace_token(tail: &str, groups: usize, named: bool) -> Option<(ReplacePart, usize)> {
    let bytes = tail.as_bytes();
    match *bytes.first()? {
        b'$' => Some((ReplacePart::Literal("$".to_string()), 1)),
        b'&' => Some((ReplacePart::Whole, 1)),
        b'`' => Some((ReplacePart::Before, 1)),
        b'\'' => Some((ReplacePart::After, 1)),
        b'<' if named => {
            let close = tail.find('>')?;
            Some((ReplacePart::Named(tail[1..close].to_string()), close + 1))
        }
        d if d.is_ascii_digit() => {
            let one = usize::from(d - b'0');
            if let Some(&d2) = bytes.get(1)
                && d2.is_ascii_digit()
            {
                let two = one * 10 + usize::from(d2 - b'0');
                if (1..=groups).contains(&two) {
                    return Some((ReplacePart::Group(two), 2));
                }
            }
            (1..=groups).contains(&one).then_some((ReplacePart::Group(one), 1))
        }
        _ => None,
    }
}

/// Resolves the label text for `entity`, or `None` when it comes out empty.
///
/// Steps run in a fixed order: source lookup, regex rewrite, underscores to spaces,
/// then the case transform.
pub fn resolve_label(style: &TextStyle, entity: &Entity) -> Option<String> {
    let raw: Cow<'_, str> = match &style.source {
        TextSource::Field(field) => entity.field_text(field),
        TextSource::Literal(text) => Cow::Borrowed(text.as_str()),
    };
    if raw.is_empty() {
        return None;
    }

    let mut text = raw.into_owned();
    if let Some(rw) = &style.rewrite {
        text = rw.replace.replace_all(&rw.find, &text);
    }
    if style.replace_underscores {
        text = text.replace('_', " ");
    }
    if let Some(case) = style.case {
        text = case.apply(&text);
    }

    (!text.is_empty()).then_some(text)
}
