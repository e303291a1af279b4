//! Compile a single path-segment glob, including POSIX extended globs
//! `@(…)`, `?(…)`, `+(…)`, `*(…)`, and `!(…)`, into a regular expression.
//!
//! A segment is one component of a path, with no separator inside; this
//! crate deliberately knows nothing about multi-segment patterns, brace
//! expansion, or `**`. What it does know is the hard part of that larger
//! problem: negated groups. A `!(…)` is not locally expressible as a
//! regular expression, because what it must reject depends on everything
//! that follows it within the segment. The compiler builds a tree that
//! keeps that context, splices each negation's tail into its body, and
//! lowers the result to an anchored expression with negative lookaheads.
//!
//! Compilation is total: malformed input degrades into literal text rather
//! than failing, so every pattern produces *some* matcher.
//!
//! ```
//! use extglob::{Options, Segment};
//!
//! let compiled = Segment::new("*.rs", Options::default()).compile().unwrap();
//! assert!(compiled.is_match("lib.rs"));
//! assert!(!compiled.is_match(".hidden.rs"));
//!
//! let negated = Segment::new("!(target)", Options::default()).compile().unwrap();
//! assert!(negated.is_match("src"));
//! assert!(!negated.is_match("target"));
//! ```

mod class;
mod encode;
mod escape;
mod node;
mod segment;

pub use crate::escape::unescape;
pub use crate::segment::{CompileError, Compiled, Options, Segment, SegmentRegex};
