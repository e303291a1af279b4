//! The public face of the crate: parse a segment once, then read its
//! canonical reconstruction, its regex source, or compile it for matching.

use log::debug;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::encode::{self, Encoded};
use crate::node::{self, Sequence};

/// Matching options. Each flag is orthogonal; no combination is rejected.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Options {
    /// Allow matches to begin with `.` without the pattern saying so.
    pub dot: bool,
    /// Match case-insensitively.
    pub nocase: bool,
    /// Under `nocase`, stop treating casing-variable literals as needing a
    /// regular expression.
    pub nocase_magic_only: bool,
    /// Disable extended globs; operator characters become literal.
    pub noext: bool,
}

impl Options {
    #[must_use]
    pub const fn set_dot(mut self, value: bool) -> Self {
        self.dot = value;
        self
    }

    #[must_use]
    pub const fn set_nocase(mut self, value: bool) -> Self {
        self.nocase = value;
        self
    }

    #[must_use]
    pub const fn set_nocase_magic_only(mut self, value: bool) -> Self {
        self.nocase_magic_only = value;
        self
    }

    #[must_use]
    pub const fn set_noext(mut self, value: bool) -> Self {
        self.noext = value;
        self
    }
}

/// Describes errors that occur when compiling a segment. Lowering itself is
/// total; only the final regular expression build can fail.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    #[error("failed to compile segment regex: {0}")]
    Regex(#[from] regex::Error),
}

/// One parsed path-segment glob.
///
/// Parsing is total and eager: the canonical reconstruction is materialized
/// first, negation tails are spliced next, and the tree is lowered once, so
/// every accessor afterwards is a plain read.
#[derive(Clone, Debug)]
pub struct Segment {
    root: Sequence,
    options: Options,
    glob: String,
    encoded: Encoded,
}

impl Segment {
    pub fn new(pattern: &str, options: Options) -> Self {
        let mut root = node::parse(pattern, &options);
        let glob = root.to_string();
        node::fill_negations(&mut root);
        let encoded = encode::encode(&root, &options);
        Segment {
            root,
            options,
            glob,
            encoded,
        }
    }

    /// The canonical reconstruction of the pattern, as parsed.
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// The lowered regular expression source, unanchored.
    pub fn regex_source(&self) -> &str {
        &self.encoded.re
    }

    /// The unescaped literal reading of the pattern. Meaningful as a match
    /// target only when the segment has no magic.
    pub fn literal(&self) -> &str {
        &self.encoded.literal
    }

    /// True when matching this segment needs a regular expression: it
    /// contains a glob metacharacter, or `nocase` is on and the literal has
    /// casing to vary (unless `nocase_magic_only` opts out of that test).
    pub fn has_magic(&self) -> bool {
        self.encoded.magic
            || (self.options.nocase
                && !self.options.nocase_magic_only
                && self.glob.to_uppercase() != self.glob.to_lowercase())
    }

    /// True when the lowered expression relies on Unicode character
    /// properties.
    pub fn needs_unicode(&self) -> bool {
        self.encoded.unicode
    }

    /// Renders the classified tree for inspection: sequences as bracketed
    /// part lists, groups as `(op …)`, with `^` marking start sequences and
    /// `$` marking the segment end at the root and in negation branches.
    pub fn outline(&self) -> String {
        encode::outline(&self.root)
    }

    /// Compiles the segment: the plain literal when no regular expression is
    /// needed, otherwise an anchored regex.
    pub fn compile(&self) -> Result<Compiled, CompileError> {
        if !self.has_magic() {
            return Ok(Compiled::Literal(self.encoded.literal.clone()));
        }
        let anchored = format!("^{}$", self.encoded.re);
        debug!("segment `{}` compiled to `{}`", self.glob, anchored);
        let regex = RegexBuilder::new(&anchored)
            .case_insensitive(self.options.nocase)
            .build()?;
        Ok(Compiled::Regex(SegmentRegex {
            regex,
            source: self.encoded.re.clone(),
            glob: self.glob.clone(),
        }))
    }
}

/// A compiled segment.
///
/// Literal segments carry their unescaped text and match by equality. (A
/// literal is only produced when casing is trivial or case-sensitivity is
/// in effect, except under `nocase_magic_only`, which opts into literal
/// results whose caller handles casing itself.)
#[derive(Clone, Debug)]
pub enum Compiled {
    Literal(String),
    Regex(SegmentRegex),
}

impl Compiled {
    /// Matches one path segment. A candidate containing a separator never
    /// matches.
    pub fn is_match(&self, candidate: &str) -> bool {
        if candidate.contains('/') {
            return false;
        }
        match self {
            Compiled::Literal(text) => text == candidate,
            Compiled::Regex(segment) => segment.is_match(candidate),
        }
    }
}

/// An anchored regular expression for one segment, carrying its unanchored
/// source and the canonical glob it was lowered from.
#[derive(Clone, Debug)]
pub struct SegmentRegex {
    regex: Regex,
    source: String,
    glob: String,
}

impl SegmentRegex {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

#[cfg(test)]
mod tests {
    use crate::segment::{Compiled, Options, Segment};

    fn compiled(pattern: &str, options: Options) -> Compiled {
        Segment::new(pattern, options).compile().unwrap()
    }

    fn matcher(pattern: &str) -> Compiled {
        compiled(pattern, Options::default())
    }

    #[track_caller]
    fn assert_matches(matcher: &Compiled, accepted: &[&str], rejected: &[&str]) {
        for candidate in accepted {
            assert!(matcher.is_match(candidate), "expected match: {}", candidate);
        }
        for candidate in rejected {
            assert!(!matcher.is_match(candidate), "unexpected match: {}", candidate);
        }
    }

    #[test]
    fn literal_segments_stay_strings() {
        assert!(matches!(matcher("abc"), Compiled::Literal(text) if text == "abc"));
        assert!(matches!(matcher("a\\*b"), Compiled::Literal(text) if text == "a*b"));
        assert!(matches!(matcher("[a]"), Compiled::Literal(text) if text == "a"));
        assert!(matches!(matcher("*"), Compiled::Regex(_)));
    }

    #[test]
    fn literal_matching_is_exact() {
        let matcher = matcher("abc");
        assert_matches(&matcher, &["abc"], &["ABC", "ab", "abcd", ""]);
    }

    #[test]
    fn star_is_one_segment() {
        let matcher = matcher("*");
        assert_matches(&matcher, &["foo", "f"], &["", ".hidden", "a/b"]);
    }

    #[test]
    fn star_suffix() {
        let matcher = matcher("*.js");
        assert_matches(
            &matcher,
            &["foo.js"],
            &[".js", ".hidden.js", "foo.jsx", "dir/foo.js"],
        );
    }

    #[test]
    fn dot_option_admits_dotted_names_but_not_traversal() {
        let matcher = compiled("*", Options::default().set_dot(true));
        assert_matches(&matcher, &["foo", ".hidden"], &[".", "..", ""]);
    }

    #[test]
    fn traversal_names_match_literally() {
        assert_matches(&matcher("."), &["."], &["..", "x"]);
        assert_matches(&matcher(".."), &[".."], &[".", "x"]);
    }

    #[test]
    fn dotted_patterns_pick_their_own_dot() {
        let matcher = matcher(".h*");
        assert_matches(&matcher, &[".h", ".hidden"], &["h", ".x"]);
    }

    #[test]
    fn zero_or_one_group() {
        let matcher = matcher("?(a|b)c");
        assert_matches(&matcher, &["c", "ac", "bc"], &["abc", "cc"]);
    }

    #[test]
    fn one_or_more_group() {
        let matcher = matcher("+(ab)");
        assert_matches(&matcher, &["ab", "abab"], &["", "a", "aba"]);
    }

    #[test]
    fn zero_or_more_group() {
        let matcher = matcher("x*(a|b)x");
        assert_matches(&matcher, &["xx", "xax", "xbax"], &["x", "xcx"]);
    }

    #[test]
    fn exactly_one_group() {
        let matcher = matcher("a@(i|w|j)b");
        assert_matches(&matcher, &["aib", "awb"], &["ab", "aiwb"]);
    }

    #[test]
    fn negation_rejects_branches_and_dots() {
        let matcher = matcher("!(foo)");
        assert_matches(
            &matcher,
            &["bar", "fo", "foobar", ""],
            &["foo", ".foo", ".anything"],
        );
    }

    #[test]
    fn negation_with_tail() {
        // The tail after the negation binds into its lookahead: the head of
        // `xy` reads as the forbidden `x` followed by the tail, so it loses.
        let matcher = matcher("!(x)y");
        assert_matches(&matcher, &["zy", "y", "xxy"], &["xy"]);
    }

    #[test]
    fn nested_negation_sees_ancestor_tails() {
        let matcher = matcher("a@(i|w!(x|y)z|j)b");
        assert_matches(
            &matcher,
            &["aib", "ajb", "awqzb", "awzb"],
            &["awxzb", "awyzb", "ab"],
        );
    }

    #[test]
    fn sibling_negations() {
        let matcher = matcher("!(a)x!(b)y");
        assert_matches(&matcher, &["cxcy", "xy", "bxay"], &["axy", "xby", "ax"]);
    }

    #[test]
    fn empty_negation_requires_content() {
        let matcher = matcher("!()");
        assert_matches(&matcher, &["a", "anything"], &["", ".a"]);
    }

    #[test]
    fn empty_positive_group_is_literal_text() {
        let matcher = matcher("*()");
        assert_matches(&matcher, &["*()"], &["", "x"]);
    }

    #[test]
    fn classes_delegate_to_the_bracket_parser() {
        let matcher = matcher("[!a-c]x");
        assert_matches(&matcher, &["dx", "zx"], &["ax", "cx", "/x", "x"]);
    }

    #[test]
    fn posix_classes_match_by_property() {
        let matcher = matcher("[[:digit:]]*");
        assert_matches(&matcher, &["1", "42abc"], &["x1", ""]);
        assert!(Segment::new("[[:digit:]]*", Options::default()).needs_unicode());
    }

    #[test]
    fn noext_reads_operators_literally() {
        let matcher = compiled("!(a)", Options::default().set_noext(true));
        assert_matches(&matcher, &["!(a)"], &["b", "a"]);
        assert!(matches!(&matcher, Compiled::Literal(text) if text == "!(a)"));
    }

    #[test]
    fn nocase_turns_casing_into_magic() {
        let segment = Segment::new("abc", Options::default().set_nocase(true));
        assert!(segment.has_magic());
        let matcher = segment.compile().unwrap();
        assert_matches(&matcher, &["abc", "ABC", "aBc"], &["abd"]);

        // Caseless literals stay strings.
        let segment = Segment::new("123", Options::default().set_nocase(true));
        assert!(!segment.has_magic());
    }

    #[test]
    fn nocase_magic_only_keeps_literals() {
        let options = Options::default()
            .set_nocase(true)
            .set_nocase_magic_only(true);
        let segment = Segment::new("abc", options);
        assert!(!segment.has_magic());
        assert!(matches!(segment.compile().unwrap(), Compiled::Literal(text) if text == "abc"));

        // Magic patterns still match caselessly.
        let matcher = compiled("a*c", options);
        assert_matches(&matcher, &["abc", "ABC"], &["abd"]);
    }

    #[test]
    fn unterminated_group_matches_its_own_text() {
        let segment = Segment::new("a@(b", Options::default());
        assert_eq!(segment.glob(), "a@(b");
        let matcher = segment.compile().unwrap();
        assert_matches(&matcher, &["a@(b"], &["ab", "a@b"]);
    }

    #[test]
    fn regex_sidecars() {
        let segment = Segment::new("a@(b|c)", Options::default());
        match segment.compile().unwrap() {
            Compiled::Regex(regex) => {
                assert_eq!(regex.glob(), "a@(b|c)");
                assert_eq!(regex.source(), "a(?:b|c)");
                assert_eq!(regex.regex().as_str(), "^a(?:b|c)$");
            }
            Compiled::Literal(text) => panic!("expected a regex, found literal {:?}", text),
        }
    }

    #[test]
    fn repeated_reads_are_stable() {
        let segment = Segment::new("a!(b)*", Options::default());
        let first = segment.regex_source().to_string();
        assert_eq!(segment.regex_source(), first);
        assert_eq!(segment.glob(), "a!(b)*");
    }
}
