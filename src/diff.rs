//! Word-level diffing between an original and an edited text.
//!
//! ## Why Word Granularity?
//!
//! Character diffs are noisy ("cat" → "car" is one change, not two equal
//! letters and a substitution) and line diffs are too coarse for prose,
//! where an edit usually touches a few words inside a long paragraph.
//! Word granularity matches how a human reviews an edit: whole words
//! appear, disappear, or get replaced.
//!
//! ## Tokens
//!
//! The token stream is whitespace-delimited words plus one special token
//! for paragraph breaks (runs of 2+ newlines):
//!
//! ```text
//! "Hello world.\n\nNew scene."  ->  [Hello] [world.] [¶] [New] [scene.]
//! ```
//!
//! Keeping the break as a token means paragraph structure survives the
//! diff round-trip; all other whitespace is normalized to single spaces
//! when fragments are joined back together.
//!
//! ## Algorithm
//!
//! Myers' greedy shortest-edit-script diff (the standard LCS-family
//! algorithm) over the token streams, with common prefix/suffix stripping
//! first. Output is deterministic for a fixed input pair.

/// The paragraph-break token. Compared like any other word, rendered as a
/// blank line on join.
pub(crate) const PARA: &str = "\n\n";

/// One atomic piece of a word diff.
///
/// A full diff is an ordered `Vec<DiffPart>`; concatenating the
/// `Unchanged` + `Removed` values reproduces the original, and the
/// `Unchanged` + `Added` values reproduce the edited text (modulo
/// whitespace normalization).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffPart {
    /// Text present in both versions.
    Unchanged(String),
    /// Text present only in the edited version.
    Added(String),
    /// Text present only in the original version.
    Removed(String),
}

impl DiffPart {
    /// The text fragment this part carries.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Unchanged(v) | Self::Added(v) | Self::Removed(v) => v,
        }
    }
}

/// Append a fragment to an accumulating text, inserting a single space
/// between words but never around paragraph breaks.
pub(crate) fn append_fragment(out: &mut String, frag: &str) {
    if frag.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with('\n') && !frag.starts_with('\n') {
        out.push(' ');
    }
    out.push_str(frag);
}

/// Join tokens into display text using the fragment rule.
fn join_tokens(tokens: &[&str]) -> String {
    let mut out = String::new();
    for t in tokens {
        append_fragment(&mut out, t);
    }
    out
}

/// Split text into word tokens plus paragraph-break markers.
pub(crate) fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut newlines = 0usize;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(ws) = word_start.take() {
                tokens.push(&text[ws..i]);
            }
            if c == '\n' {
                newlines += 1;
            }
        } else if word_start.is_none() {
            if newlines >= 2 && !tokens.is_empty() {
                tokens.push(PARA);
            }
            newlines = 0;
            word_start = Some(i);
        }
    }
    if let Some(ws) = word_start {
        tokens.push(&text[ws..]);
    }
    tokens
}

/// Compute a word-level diff between two texts.
///
/// Deterministic: a fixed `(original, edited)` pair always yields the
/// same part sequence. Never fails on well-formed UTF-8.
///
/// ```rust
/// use stet::{diff_words, DiffPart};
///
/// let parts = diff_words("the old text", "the new text");
/// assert_eq!(
///     parts,
///     vec![
///         DiffPart::Unchanged("the".into()),
///         DiffPart::Removed("old".into()),
///         DiffPart::Added("new".into()),
///         DiffPart::Unchanged("text".into()),
///     ]
/// );
/// ```
#[must_use]
pub fn diff_words(original: &str, edited: &str) -> Vec<DiffPart> {
    let a = tokenize(original);
    let b = tokenize(edited);

    // Common prefix/suffix never participates in the edit script; strip
    // it up front so the O(ND) core sees only the changed region.
    let mut pre = 0;
    while pre < a.len() && pre < b.len() && a[pre] == b[pre] {
        pre += 1;
    }
    let mut suf = 0;
    while suf < a.len() - pre && suf < b.len() - pre && a[a.len() - 1 - suf] == b[b.len() - 1 - suf]
    {
        suf += 1;
    }

    let ops = myers_ops(&a[pre..a.len() - suf], &b[pre..b.len() - suf]);

    let mut parts = Vec::new();
    let mut push = |parts: &mut Vec<DiffPart>, op: RawOp, tokens: &[&str]| {
        if tokens.is_empty() {
            return;
        }
        let value = join_tokens(tokens);
        parts.push(match op {
            RawOp::Equal => DiffPart::Unchanged(value),
            RawOp::Delete => DiffPart::Removed(value),
            RawOp::Insert => DiffPart::Added(value),
        });
    };

    push(&mut parts, RawOp::Equal, &a[..pre]);

    // Coalesce op runs into parts.
    let (mut ai, mut bi) = (pre, pre);
    let mut run: Vec<&str> = Vec::new();
    let mut run_op: Option<RawOp> = None;
    for op in ops {
        if run_op != Some(op) {
            if let Some(prev) = run_op.take() {
                push(&mut parts, prev, &run);
                run.clear();
            }
            run_op = Some(op);
        }
        match op {
            RawOp::Equal => {
                run.push(a[ai]);
                ai += 1;
                bi += 1;
            }
            RawOp::Delete => {
                run.push(a[ai]);
                ai += 1;
            }
            RawOp::Insert => {
                run.push(b[bi]);
                bi += 1;
            }
        }
    }
    if let Some(prev) = run_op {
        push(&mut parts, prev, &run);
    }

    push(&mut parts, RawOp::Equal, &a[a.len() - suf..]);
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawOp {
    Equal,
    Delete,
    Insert,
}

/// Myers' greedy O(ND) shortest edit script over token slices.
fn myers_ops(a: &[&str], b: &[&str]) -> Vec<RawOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    if n == 0 {
        return vec![RawOp::Insert; m as usize];
    }
    if m == 0 {
        return vec![RawOp::Delete; n as usize];
    }

    let max = n + m;
    let off = max;
    let width = (2 * max + 1) as usize;
    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut found = None;

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let i = (k + off) as usize;
            let mut x = if k == -d || (k != d && v[i - 1] < v[i + 1]) {
                v[i + 1]
            } else {
                v[i - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[i] = x;
            if x >= n && y >= m {
                found = Some(d);
                break 'search;
            }
            k += 2;
        }
    }

    // The search reaches (n, m) after at most n + m edits.
    let d_final = found.expect("edit script bounded by n + m");

    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;
    for d in (0..=d_final).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        if d == 0 {
            while x > 0 {
                ops.push(RawOp::Equal);
                x -= 1;
                y -= 1;
            }
            break;
        }
        let i = (k + off) as usize;
        let down = k == -d || (k != d && v[i - 1] < v[i + 1]);
        let prev_k = if down { k + 1 } else { k - 1 };
        let prev_x = v[(prev_k + off) as usize];
        let prev_y = prev_x - prev_k;
        let move_x = if down { prev_x } else { prev_x + 1 };
        while x > move_x {
            ops.push(RawOp::Equal);
            x -= 1;
            y -= 1;
        }
        ops.push(if down { RawOp::Insert } else { RawOp::Delete });
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();
    ops
}
