//! Bracket expressions (`[…]`).
//!
//! This module parses a bracket expression out of a glob fragment and lowers
//! it to regular expression source. Parsing never fails: an expression that
//! is not actually a class reports zero consumed characters so that the
//! caller can treat the `[` as a literal, and an expression that can match
//! nothing at all lowers to a never-matching pattern.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::escape::push_escaped;

/// A regular expression that can never match. The end-of-input anchor is
/// followed by a required character.
const NEVER: &str = "$.";

lazy_static! {
    // POSIX class name → (expansion, relies on Unicode properties, negated
    // membership). Negated entries describe the characters *excluded* from
    // the class.
    static ref POSIX_CLASSES: HashMap<&'static str, (&'static str, bool, bool)> = {
        let mut classes = HashMap::new();
        classes.insert("[:alnum:]", ("\\p{L}\\p{Nl}\\p{Nd}", true, false));
        classes.insert("[:alpha:]", ("\\p{L}\\p{Nl}", true, false));
        classes.insert("[:ascii:]", ("\\x00-\\x7f", false, false));
        classes.insert("[:blank:]", ("\\p{Zs}\\t", true, false));
        classes.insert("[:cntrl:]", ("\\p{Cc}", true, false));
        classes.insert("[:digit:]", ("\\p{Nd}", true, false));
        classes.insert("[:graph:]", ("\\p{Z}\\p{C}", true, true));
        classes.insert("[:lower:]", ("\\p{Ll}", true, false));
        classes.insert("[:print:]", ("\\p{C}", true, true));
        classes.insert("[:punct:]", ("\\p{P}", true, false));
        classes.insert("[:space:]", ("\\p{Z}\\t\\r\\n\\v\\f", true, false));
        classes.insert("[:upper:]", ("\\p{Lu}", true, false));
        classes.insert("[:word:]", ("\\p{L}\\p{Nl}\\p{Nd}\\p{Pc}", true, false));
        classes.insert("[:xdigit:]", ("A-Fa-f0-9", false, false));
        classes
    };
}

#[derive(Clone, Debug)]
pub struct ParsedClass {
    /// Regular expression source for the class.
    pub re: String,
    /// True when the expression relies on Unicode character properties.
    pub unicode: bool,
    /// Characters consumed from the input; zero means "not a class".
    pub consumed: usize,
    /// True when matching the class requires a regular expression.
    pub magic: bool,
}

impl ParsedClass {
    fn not_a_class() -> Self {
        ParsedClass {
            re: String::new(),
            unicode: false,
            consumed: 0,
            magic: false,
        }
    }

    fn poisoned(consumed: usize) -> Self {
        ParsedClass {
            re: NEVER.to_string(),
            unicode: false,
            consumed,
            magic: true,
        }
    }
}

/// Parses the bracket expression opening at `chars[position]`.
pub fn parse_class(chars: &[char], position: usize) -> ParsedClass {
    debug_assert_eq!(chars.get(position), Some(&'['));
    let mut ranges: Vec<String> = Vec::new();
    let mut negs: Vec<String> = Vec::new();
    let mut i = position + 1;
    let mut saw_member = false;
    let mut unicode = false;
    let mut escaped = false;
    let mut negate = false;
    let mut end = position;
    let mut range_start: Option<char> = None;
    'scan: while i < chars.len() {
        let c = chars[i];
        if (c == '!' || c == '^') && i == position + 1 {
            negate = true;
            i += 1;
            continue;
        }
        if c == ']' && saw_member && !escaped {
            end = i + 1;
            break;
        }
        saw_member = true;
        if c == '\\' && !escaped {
            escaped = true;
            i += 1;
            continue;
        }
        if c == '[' && !escaped {
            for (name, &(expansion, needs_unicode, negated)) in POSIX_CLASSES.iter() {
                if starts_with_at(chars, i, name) {
                    if range_start.is_some() {
                        // `[a-b]` and even `[a-[]` are fine, but a class
                        // cannot terminate a range.
                        return ParsedClass::poisoned(chars.len() - position);
                    }
                    i += name.len();
                    if negated {
                        negs.push(expansion.to_string());
                    }
                    else {
                        ranges.push(expansion.to_string());
                    }
                    unicode = unicode || needs_unicode;
                    continue 'scan;
                }
            }
        }
        escaped = false;
        if let Some(start) = range_start.take() {
            // An inverted range can never match anything; drop it and let
            // the other members stand.
            if c > start {
                ranges.push(format!("{}-{}", class_escape(start), class_escape(c)));
            }
            else if c == start {
                ranges.push(class_escape(c));
            }
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2) == Some(&']') {
            // A `-` just before the closing bracket is a literal member.
            ranges.push(format!("{}{}", class_escape(c), class_escape('-')));
            i += 2;
            continue;
        }
        if chars.get(i + 1) == Some(&'-') {
            range_start = Some(c);
            i += 2;
            continue;
        }
        ranges.push(class_escape(c));
        i += 1;
    }

    if end < i {
        // Never closed; the `[` stands for itself.
        return ParsedClass::not_a_class();
    }
    if ranges.is_empty() && negs.is_empty() {
        // A class that admits no members can match nothing at all.
        return ParsedClass::poisoned(chars.len() - position);
    }
    if negs.is_empty() && !negate && ranges.len() == 1 {
        // A class holding exactly one literal character is just that
        // character, and matching it needs no regular expression.
        if let Some(member) = single_member(&ranges[0]) {
            let mut re = String::new();
            push_escaped(&mut re, member);
            return ParsedClass {
                re,
                unicode: false,
                consumed: end - position,
                magic: false,
            };
        }
    }

    let positive = format!("[{}{}]", if negate { "^" } else { "" }, ranges.concat());
    let negative = format!("[{}{}]", if negate { "" } else { "^" }, negs.concat());
    let re = if !ranges.is_empty() && !negs.is_empty() {
        format!("({}|{})", positive, negative)
    }
    else if ranges.is_empty() {
        negative
    }
    else {
        positive
    };
    ParsedClass {
        re,
        unicode,
        consumed: end - position,
        magic: true,
    }
}

fn starts_with_at(chars: &[char], index: usize, name: &str) -> bool {
    let mut i = index;
    for c in name.chars() {
        if chars.get(i) != Some(&c) {
            return false;
        }
        i += 1;
    }
    true
}

fn class_escape(c: char) -> String {
    match c {
        '[' | ']' | '\\' | '-' => format!("\\{}", c),
        _ => c.to_string(),
    }
}

fn single_member(member: &str) -> Option<char> {
    let mut chars = member.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(c), None) => Some(c),
        (Some(c), None, _) => Some(c),
        _ => None,
    }
}
