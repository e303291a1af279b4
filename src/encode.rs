//! Lowering the parse tree to regular expression source.
//!
//! Each node lowers to a fragment of regex source together with its
//! unescaped literal reading, whether it needs a regular expression at all,
//! and whether it relies on Unicode character properties. Start guards and
//! end anchors depend on where a node sits within the segment, so position
//! is threaded through the walk rather than stored on the tree.

use itertools::Itertools as _;

use crate::class::parse_class;
use crate::escape::{push_escaped, unescape};
use crate::node::{ExtGlob, ExtOp, Part, Sequence};
use crate::segment::Options;

const STAR: &str = "[^/]*?";
const STAR_NO_EMPTY: &str = "[^/]+?";
const ONE_CHAR: &str = "[^/]";
const NO_DOT: &str = "(?!\\.)";
const NO_TRAVERSAL: &str = "(?!\\.\\.?(?:$|/))";
// Bounds a negation branch: the forbidden remainder must reach the end of
// the path portion for the lookahead to reject it.
const SEGMENT_BOUNDARY: &str = "(?:$|\\/)";

/// A lowered node.
#[derive(Clone, Debug)]
pub struct Encoded {
    /// Regular expression source, unanchored.
    pub re: String,
    /// The unescaped literal reading of the node.
    pub literal: String,
    /// True when matching needs a regular expression.
    pub magic: bool,
    /// True when the expression relies on Unicode character properties.
    pub unicode: bool,
}

// Where a node sits within the segment. A node is at the start when only
// negations precede it (they consume no leading position), and at the end
// when it occupies the final slot of an end node, or sits anywhere inside
// a negation branch, whose lowering always bounds the segment.
#[derive(Clone, Copy, Debug)]
struct Position {
    start: bool,
    end: bool,
    /// The node is a branch of a `!(…)` group.
    negated: bool,
}

impl Position {
    const ROOT: Position = Position {
        start: true,
        end: true,
        negated: false,
    };

    fn child(self, parts: &[Part], index: usize) -> Position {
        let preceded_only_by_negations = parts[..index]
            .iter()
            .all(|part| matches!(part, Part::Ext(ext) if ext.op == ExtOp::Negate));
        Position {
            start: self.start && preceded_only_by_negations,
            end: self.end && index == parts.len() - 1,
            negated: false,
        }
    }

    fn branch(self, op: ExtOp) -> Position {
        Position {
            start: self.start,
            end: op == ExtOp::Negate || self.end,
            negated: op == ExtOp::Negate,
        }
    }
}

/// Lowers a spliced tree to regex source.
pub fn encode(root: &Sequence, options: &Options) -> Encoded {
    encode_sequence(root, Position::ROOT, options)
}

fn encode_sequence(seq: &Sequence, position: Position, options: &Options) -> Encoded {
    let no_empty = position.start && position.end && seq.parts.len() == 1;
    let mut re = String::new();
    let mut magic = false;
    let mut unicode = false;
    for (index, part) in seq.parts.iter().enumerate() {
        let encoded = match part {
            Part::Text(text) => encode_fragment(text, no_empty),
            Part::Ext(ext) => encode_extglob(ext, position.child(&seq.parts, index), options),
        };
        re.push_str(&encoded.re);
        magic = magic || encoded.magic;
        unicode = unicode || encoded.unicode;
    }
    let literal = unescape(&re);
    let guard = start_guard(seq, position, &re, options);
    let anchor = if position.end && position.negated {
        SEGMENT_BOUNDARY
    }
    else {
        ""
    };
    Encoded {
        re: format!("{}{}{}", guard, re, anchor),
        literal,
        magic,
        unicode,
    }
}

// A segment-start node whose leading part is text may need to be kept from
// matching `.`-led names: traversal entries always (`.` and `..`), or any
// dotted name when `dot` is off. The bare traversal patterns themselves are
// exempt; `.` and `..` match only literally.
fn start_guard(
    seq: &Sequence,
    position: Position,
    re: &str,
    options: &Options,
) -> &'static str {
    if !position.start {
        return "";
    }
    let first = match seq.parts.first() {
        Some(Part::Text(text)) => text,
        _ => return "",
    };
    if seq.parts.len() == 1 && matches!(first.as_str(), "." | "..") {
        return "";
    }
    let dotward = |index: usize| matches!(re.as_bytes().get(index), Some(&b'.') | Some(&b'['));
    let no_traversal = (options.dot && dotward(0))
        || (re.starts_with("\\.") && dotward(2))
        || (re.starts_with("\\.\\.") && dotward(4));
    if no_traversal {
        NO_TRAVERSAL
    }
    else if !options.dot && dotward(0) {
        NO_DOT
    }
    else {
        ""
    }
}

fn encode_extglob(ext: &ExtGlob, position: Position, options: &Options) -> Encoded {
    let whole = position.start && position.end;
    let branch_position = position.branch(ext.op);
    let mut unicode = false;
    let body = ext
        .branches
        .iter()
        .map(|branch| {
            let encoded = encode_sequence(branch, branch_position, options);
            unicode = unicode || encoded.unicode;
            encoded.re
        })
        .filter(|re| !whole || !re.is_empty())
        .join("|");
    if whole && body.is_empty() && ext.op != ExtOp::Negate {
        // An empty group spanning the whole segment has nothing to repeat;
        // it can only be read back as its literal source text.
        let source = ext.to_string();
        let literal = unescape(&source);
        return Encoded {
            re: source,
            literal,
            magic: false,
            unicode: false,
        };
    }
    let literal = unescape(&body);
    let re = if ext.op == ExtOp::Negate && ext.empty {
        // `!()` matches any non-empty run.
        format!("{}{}", no_dot_guard(position, options), STAR_NO_EMPTY)
    }
    else {
        match ext.op {
            ExtOp::Negate => format!(
                "(?:(?!(?:{})){}{})",
                body,
                no_dot_guard(position, options),
                STAR
            ),
            ExtOp::ZeroOrOne => format!("(?:{})?", body),
            ExtOp::OneOrMore => format!("(?:{})+", body),
            ExtOp::ZeroOrMore => format!("(?:{})*", body),
            ExtOp::ExactlyOne => format!("(?:{})", body),
        }
    };
    Encoded {
        re,
        literal,
        magic: true,
        unicode,
    }
}

fn no_dot_guard(position: Position, options: &Options) -> &'static str {
    if position.start && !options.dot {
        NO_DOT
    }
    else {
        ""
    }
}

// Lowers one literal text fragment. `no_empty` strengthens a bare `*` so a
// whole-segment star cannot match an empty name.
fn encode_fragment(fragment: &str, no_empty: bool) -> Encoded {
    let chars: Vec<char> = fragment.chars().collect();
    let mut re = String::new();
    let mut magic = false;
    let mut unicode = false;
    let mut escaped = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if escaped {
            escaped = false;
            push_escaped(&mut re, c);
            i += 1;
            continue;
        }
        match c {
            '\\' => {
                if i + 1 == chars.len() {
                    // A trailing backslash matches itself.
                    re.push_str("\\\\");
                }
                else {
                    escaped = true;
                }
            }
            '[' => {
                let class = parse_class(&chars, i);
                if class.consumed > 0 {
                    re.push_str(&class.re);
                    magic = magic || class.magic;
                    unicode = unicode || class.unicode;
                    i += class.consumed;
                    continue;
                }
                push_escaped(&mut re, '[');
            }
            '*' => {
                re.push_str(if no_empty && fragment == "*" {
                    STAR_NO_EMPTY
                }
                else {
                    STAR
                });
                magic = true;
            }
            '?' => {
                re.push_str(ONE_CHAR);
                magic = true;
            }
            _ => push_escaped(&mut re, c),
        }
        i += 1;
    }
    Encoded {
        re,
        literal: unescape(fragment),
        magic,
        unicode,
    }
}

/// Renders the classified tree: sequences as bracketed part lists, groups as
/// `(op …)`, with `^` marking start sequences and `$` marking the end at the
/// root and in spliced negation branches.
pub fn outline(root: &Sequence) -> String {
    let mut out = String::new();
    outline_sequence(root, Position::ROOT, true, &mut out);
    out
}

fn outline_sequence(seq: &Sequence, position: Position, is_root: bool, out: &mut String) {
    out.push('[');
    if position.start {
        out.push('^');
    }
    for (index, part) in seq.parts.iter().enumerate() {
        out.push(' ');
        match part {
            Part::Text(text) => out.push_str(&format!("{:?}", text)),
            Part::Ext(ext) => outline_extglob(ext, position.child(&seq.parts, index), out),
        }
    }
    if position.end && (is_root || position.negated) {
        out.push_str(" $");
    }
    out.push(']');
}

fn outline_extglob(ext: &ExtGlob, position: Position, out: &mut String) {
    out.push('(');
    out.push(ext.op.as_char());
    let branch_position = position.branch(ext.op);
    for branch in &ext.branches {
        out.push(' ');
        outline_sequence(branch, branch_position, false, out);
    }
    out.push(')');
}
