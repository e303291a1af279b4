//! The segment parse tree.
//!
//! A segment parses into a [`Sequence`]: an ordered run of literal text
//! fragments and extended glob groups. Each group holds `|`-separated branch
//! sequences of its own. Parsing is total: malformed input degrades into
//! literal text rather than failing, so every string produces a tree.
//!
//! Negated groups are not locally expressible as regular expressions: what a
//! `!(…)` forbids depends on everything that follows it within the segment.
//! [`fill_negations`] therefore runs once after parsing and copies that
//! following material into every branch of every negation, so that the
//! lowered lookahead sees the full remainder it must reject.

use itertools::Itertools as _;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

use crate::segment::Options;

/// Extended glob operators, written `op(branch|…)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExtOp {
    /// `!(…)`: anything but the branches.
    Negate,
    /// `?(…)`: zero or one occurrence.
    ZeroOrOne,
    /// `+(…)`: one or more occurrences.
    OneOrMore,
    /// `*(…)`: zero or more occurrences.
    ZeroOrMore,
    /// `@(…)`: exactly one occurrence.
    ExactlyOne,
}

impl ExtOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '!' => Some(ExtOp::Negate),
            '?' => Some(ExtOp::ZeroOrOne),
            '+' => Some(ExtOp::OneOrMore),
            '*' => Some(ExtOp::ZeroOrMore),
            '@' => Some(ExtOp::ExactlyOne),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            ExtOp::Negate => '!',
            ExtOp::ZeroOrOne => '?',
            ExtOp::OneOrMore => '+',
            ExtOp::ZeroOrMore => '*',
            ExtOp::ExactlyOne => '@',
        }
    }
}

#[derive(Clone, Debug)]
pub enum Part {
    /// Literal text between metacharacters. Escapes are retained verbatim;
    /// unescaping happens at lowering.
    Text(String),
    /// An extended glob group.
    Ext(ExtGlob),
}

/// An ordered run of text fragments and extended glob groups, interpreted as
/// concatenation. The root of a segment is a `Sequence`, as is each branch
/// of a group.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    pub parts: SmallVec<[Part; 4]>,
}

impl Sequence {
    fn push_text(&mut self, text: String) {
        if !text.is_empty() {
            self.parts.push(Part::Text(text));
        }
    }

    fn push_ext(&mut self, ext: ExtGlob) {
        self.parts.push(Part::Ext(ext));
    }
}

#[derive(Clone, Debug)]
pub struct ExtGlob {
    pub op: ExtOp,
    pub branches: Vec<Sequence>,
    /// True for a group written with no alternatives and no content, `!()`.
    pub empty: bool,
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for part in &self.parts {
            part.fmt(f)?;
        }
        Ok(())
    }
}

impl Display for Part {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Part::Text(text) => f.write_str(text),
            Part::Ext(ext) => ext.fmt(f),
        }
    }
}

impl Display for ExtGlob {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.op.as_char(),
            self.branches.iter().join("|")
        )
    }
}

/// Parses one path-segment glob. Total: any input yields a tree.
pub fn parse(pattern: &str, options: &Options) -> Sequence {
    let chars: Vec<char> = pattern.chars().collect();
    let mut root = Sequence::default();
    scan_segment(&chars, &mut root, options);
    root
}

// Tracks bracket expressions so that metacharacters inside `[…]` are not
// interpreted. A class starting with `^` or `!` admits a `]` member right
// after the marker; otherwise a leading `]` closes immediately.
#[derive(Default)]
struct ClassTracker {
    open: bool,
    start: usize,
    negated: bool,
}

impl ClassTracker {
    // Advances over `c` and reports whether it was consumed as bracket-class
    // content. `next` is the cursor one past `c`.
    fn step(&mut self, c: char, next: usize) -> bool {
        if self.open {
            if next == self.start + 1 {
                if c == '^' || c == '!' {
                    self.negated = true;
                }
            }
            else if c == ']' && !(next == self.start + 2 && self.negated) {
                self.open = false;
            }
            true
        }
        else if c == '[' {
            self.open = true;
            self.start = next;
            self.negated = false;
            true
        }
        else {
            false
        }
    }
}

fn scan_segment(chars: &[char], root: &mut Sequence, options: &Options) {
    let mut acc = String::new();
    let mut escaped = false;
    let mut class = ClassTracker::default();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if escaped || c == '\\' {
            escaped = !escaped;
            acc.push(c);
            continue;
        }
        if class.step(c, i) {
            acc.push(c);
            continue;
        }
        if !options.noext {
            if let Some(op) = ExtOp::from_char(c) {
                if chars.get(i) == Some(&'(') {
                    root.push_text(std::mem::take(&mut acc));
                    match scan_extglob(chars, i, op) {
                        Some((ext, next)) => {
                            root.push_ext(ext);
                            i = next;
                        }
                        None => {
                            // Unterminated group: everything from the
                            // operator on is literal text.
                            root.push_text(chars[i - 1..].iter().collect());
                            i = chars.len();
                        }
                    }
                    continue;
                }
            }
        }
        acc.push(c);
    }
    root.push_text(acc);
}

// Scans a group body; `open` indexes the `(`. Returns the group and the
// cursor one past its `)`, or `None` when input ends before the group does.
fn scan_extglob(chars: &[char], open: usize, op: ExtOp) -> Option<(ExtGlob, usize)> {
    let mut branches: Vec<Sequence> = Vec::new();
    let mut branch = Sequence::default();
    let mut acc = String::new();
    let mut escaped = false;
    let mut class = ClassTracker::default();
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if escaped || c == '\\' {
            escaped = !escaped;
            acc.push(c);
            continue;
        }
        if class.step(c, i) {
            acc.push(c);
            continue;
        }
        if let Some(inner) = ExtOp::from_char(c) {
            if chars.get(i) == Some(&'(') {
                branch.push_text(std::mem::take(&mut acc));
                match scan_extglob(chars, i, inner) {
                    Some((ext, next)) => {
                        branch.push_ext(ext);
                        i = next;
                    }
                    None => {
                        branch.push_text(chars[i - 1..].iter().collect());
                        i = chars.len();
                    }
                }
                continue;
            }
        }
        if c == '|' {
            branch.push_text(std::mem::take(&mut acc));
            branches.push(std::mem::take(&mut branch));
            continue;
        }
        if c == ')' {
            let empty = acc.is_empty() && branches.is_empty();
            branch.push_text(std::mem::take(&mut acc));
            branches.push(branch);
            return Some((ExtGlob { op, branches, empty }, i));
        }
        acc.push(c);
    }
    None
}

/// Copies every negation's following material into its branches, so that the
/// lowered lookahead covers the full remainder of the segment.
///
/// For a negation the material is: the parts after it in its own sequence,
/// then the parts after each enclosing group in *that* group's sequence, and
/// so on outward. A group contributes nothing at its own level, but its
/// following material passes through to the branches inside it.
pub fn fill_negations(root: &mut Sequence) {
    fill_sequence(root, &[]);
}

fn fill_sequence(seq: &mut Sequence, tail: &[Part]) {
    // Later siblings are filled first, so a negation cloned into an earlier
    // sibling's tail already carries its own spliced material.
    for index in (0..seq.parts.len()).rev() {
        if matches!(seq.parts[index], Part::Text(_)) {
            continue;
        }
        let mut suffix: Vec<Part> = seq.parts[index + 1..].to_vec();
        suffix.extend_from_slice(tail);
        if let Part::Ext(ext) = &mut seq.parts[index] {
            for branch in &mut ext.branches {
                fill_sequence(branch, &suffix);
            }
            if ext.op == ExtOp::Negate {
                for branch in &mut ext.branches {
                    branch.parts.extend(suffix.iter().cloned());
                }
            }
        }
    }
}
