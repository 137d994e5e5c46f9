//! Unified diff rendering for replacement reports.
//!
//! Produces classic three-lines-of-context unified diffs. Lines keep
//! their own terminators, and a line without a trailing newline is
//! annotated with the usual `\ No newline at end of file` marker.

use std::fs;
use std::path::Path;

/// Lines of unchanged context around each change hunk.
const CONTEXT: usize = 3;

/// Upper bound on the alignment table size. Beyond this the two line
/// sequences are reported as one whole replace hunk instead.
const LCS_CELL_LIMIT: usize = 4_000_000;

/// Diff the current content of `dest` against the file at `src`.
///
/// Returns `None` when diffing is disabled, when either side is not
/// valid UTF-8, or when the contents are identical. A missing `dest`
/// diffs as an empty file, so the result shows every line as added.
pub fn file_diff(src: &Path, src_label: &str, dest: &Path, enabled: bool) -> Option<String> {
    if !enabled {
        return None;
    }
    tracing::trace!("Generating diff between {src:?} and {dest:?}.");
    let new_text = fs::read_to_string(src).ok()?;
    let old_text = if dest.exists() {
        fs::read_to_string(dest).ok()?
    } else {
        String::new()
    };
    let diff = unified_diff(&old_text, &new_text, &dest.display().to_string(), src_label);
    (!diff.is_empty()).then_some(diff)
}

/// Render a unified diff of `old` against `new`.
///
/// `fromfile` and `tofile` become the `---`/`+++` header names. Equal
/// inputs produce an empty string, and no headers.
#[must_use]
pub fn unified_diff(old: &str, new: &str, fromfile: &str, tofile: &str) -> String {
    if old == new {
        return String::new();
    }
    let a: Vec<&str> = old.split_inclusive('\n').collect();
    let b: Vec<&str> = new.split_inclusive('\n').collect();
    let groups = group_opcodes(opcodes(&a, &b), CONTEXT);

    let mut out = String::new();
    let mut started = false;
    for group in groups {
        if !started {
            started = true;
            push_line(&mut out, &format!("--- {fromfile}\n"));
            push_line(&mut out, &format!("+++ {tofile}\n"));
        }
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = format_range(first.a1, last.a2);
        let new_range = format_range(first.b1, last.b2);
        push_line(&mut out, &format!("@@ -{old_range} +{new_range} @@\n"));
        for op in &group {
            match op.tag {
                Tag::Equal => {
                    for line in lines(&a, op.a1, op.a2) {
                        push_line(&mut out, &format!(" {line}"));
                    }
                }
                Tag::Replace => {
                    for line in lines(&a, op.a1, op.a2) {
                        push_line(&mut out, &format!("-{line}"));
                    }
                    for line in lines(&b, op.b1, op.b2) {
                        push_line(&mut out, &format!("+{line}"));
                    }
                }
                Tag::Delete => {
                    for line in lines(&a, op.a1, op.a2) {
                        push_line(&mut out, &format!("-{line}"));
                    }
                }
                Tag::Insert => {
                    for line in lines(&b, op.b1, op.b2) {
                        push_line(&mut out, &format!("+{line}"));
                    }
                }
            }
        }
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push_str("\n\\ No newline at end of file\n");
    }
}

fn lines<'a>(text: &'a [&'a str], from: usize, to: usize) -> impl Iterator<Item = &'a str> {
    text.get(from..to).unwrap_or(&[]).iter().copied()
}

/// Hunk header range: 1-based start, length omitted when it is one,
/// zero-length ranges anchored at the line just before them.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    if length == 1 {
        return format!("{}", start + 1);
    }
    if length == 0 {
        return format!("{start},0");
    }
    format!("{},{length}", start + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct Opcode {
    tag: Tag,
    a1: usize,
    a2: usize,
    b1: usize,
    b2: usize,
}

impl Opcode {
    const fn new(tag: Tag, a1: usize, a2: usize, b1: usize, b2: usize) -> Self {
        Self { tag, a1, a2, b1, b2 }
    }
}

/// Align the two line sequences into equal/replace/delete/insert runs.
fn opcodes(a: &[&str], b: &[&str]) -> Vec<Opcode> {
    let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let max_suffix = (a.len() - prefix).min(b.len() - prefix);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = a.get(prefix..a.len() - suffix).unwrap_or(&[]);
    let b_mid = b.get(prefix..b.len() - suffix).unwrap_or(&[]);

    let mut codes = Vec::new();
    if prefix > 0 {
        codes.push(Opcode::new(Tag::Equal, 0, prefix, 0, prefix));
    }
    if a_mid.is_empty() && b_mid.is_empty() {
        // Identical; nothing between prefix and suffix.
    } else if a_mid.is_empty() {
        codes.push(Opcode::new(
            Tag::Insert,
            prefix,
            prefix,
            prefix,
            b.len() - suffix,
        ));
    } else if b_mid.is_empty() {
        codes.push(Opcode::new(
            Tag::Delete,
            prefix,
            a.len() - suffix,
            prefix,
            prefix,
        ));
    } else if a_mid.len().saturating_mul(b_mid.len()) > LCS_CELL_LIMIT {
        codes.push(Opcode::new(
            Tag::Replace,
            prefix,
            a.len() - suffix,
            prefix,
            b.len() - suffix,
        ));
    } else {
        codes.extend(middle_opcodes(a_mid, b_mid, prefix));
    }
    if suffix > 0 {
        codes.push(Opcode::new(
            Tag::Equal,
            a.len() - suffix,
            a.len(),
            b.len() - suffix,
            b.len(),
        ));
    }
    codes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Equal,
    Delete,
    Insert,
}

/// Longest-common-subsequence alignment of the differing middle parts.
/// `offset` is where both middles start in their full sequences.
fn middle_opcodes(a_mid: &[&str], b_mid: &[&str], offset: usize) -> Vec<Opcode> {
    let m = a_mid.len();
    let n = b_mid.len();

    // rows_rev[k] holds subsequence lengths for suffixes starting at
    // row m - k, so rows_rev[0] is the all-zero row past the end.
    let mut rows_rev: Vec<Vec<u32>> = Vec::with_capacity(m + 1);
    rows_rev.push(vec![0; n + 1]);
    for ai in a_mid.iter().rev() {
        let prev = rows_rev.last().cloned().unwrap_or_default();
        let mut row = vec![0_u32; n + 1];
        let mut right = 0_u32;
        for (j, bj) in b_mid.iter().enumerate().rev() {
            let val = if ai == bj {
                prev.get(j + 1).copied().unwrap_or(0) + 1
            } else {
                right.max(prev.get(j).copied().unwrap_or(0))
            };
            if let Some(cell) = row.get_mut(j) {
                *cell = val;
            }
            right = val;
        }
        rows_rev.push(row);
    }
    let at = |i: usize, j: usize| -> u32 {
        rows_rev
            .get(m - i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0)
    };

    let mut steps = Vec::with_capacity(m + n);
    let mut i = 0;
    let mut j = 0;
    while i < m && j < n {
        if a_mid.get(i) == b_mid.get(j) {
            steps.push(Step::Equal);
            i += 1;
            j += 1;
        } else if at(i + 1, j) >= at(i, j + 1) {
            steps.push(Step::Delete);
            i += 1;
        } else {
            steps.push(Step::Insert);
            j += 1;
        }
    }
    steps.extend(std::iter::repeat_n(Step::Delete, m - i));
    steps.extend(std::iter::repeat_n(Step::Insert, n - j));

    let mut ops = Vec::new();
    let mut a_pos = offset;
    let mut b_pos = offset;
    let mut iter = steps.iter().copied().peekable();
    while let Some(step) = iter.next() {
        if step == Step::Equal {
            let mut len = 1;
            while iter.peek() == Some(&Step::Equal) {
                iter.next();
                len += 1;
            }
            ops.push(Opcode::new(
                Tag::Equal,
                a_pos,
                a_pos + len,
                b_pos,
                b_pos + len,
            ));
            a_pos += len;
            b_pos += len;
            continue;
        }
        let mut deleted = 0;
        let mut inserted = 0;
        if step == Step::Delete {
            deleted += 1;
        } else {
            inserted += 1;
        }
        while matches!(iter.peek(), Some(Step::Delete | Step::Insert)) {
            match iter.next() {
                Some(Step::Delete) => deleted += 1,
                Some(Step::Insert) => inserted += 1,
                _ => {}
            }
        }
        let tag = if deleted > 0 && inserted > 0 {
            Tag::Replace
        } else if deleted > 0 {
            Tag::Delete
        } else {
            Tag::Insert
        };
        ops.push(Opcode::new(
            tag,
            a_pos,
            a_pos + deleted,
            b_pos,
            b_pos + inserted,
        ));
        a_pos += deleted;
        b_pos += inserted;
    }
    ops
}

/// Bundle opcodes into hunks with at most `n` lines of surrounding
/// context, splitting where an unchanged stretch exceeds `2n` lines.
fn group_opcodes(mut codes: Vec<Opcode>, n: usize) -> Vec<Vec<Opcode>> {
    if let Some(first) = codes.first_mut()
        && first.tag == Tag::Equal
    {
        first.a1 = first.a1.max(first.a2.saturating_sub(n));
        first.b1 = first.b1.max(first.b2.saturating_sub(n));
    }
    if let Some(last) = codes.last_mut()
        && last.tag == Tag::Equal
    {
        last.a2 = last.a2.min(last.a1 + n);
        last.b2 = last.b2.min(last.b1 + n);
    }

    let nn = n * 2;
    let mut groups = Vec::new();
    let mut group: Vec<Opcode> = Vec::new();
    for code in codes {
        let mut code = code;
        if code.tag == Tag::Equal && code.a2 - code.a1 > nn {
            group.push(Opcode::new(
                Tag::Equal,
                code.a1,
                (code.a1 + n).min(code.a2),
                code.b1,
                (code.b1 + n).min(code.b2),
            ));
            groups.push(std::mem::take(&mut group));
            code.a1 = code.a1.max(code.a2 - n);
            code.b1 = code.b1.max(code.b2 - n);
        }
        group.push(code);
    }
    let only_context = group.len() == 1 && group.first().is_some_and(|c| c.tag == Tag::Equal);
    if !group.is_empty() && !only_context {
        groups.push(group);
    }
    groups
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_produce_nothing() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n", "x", "y"), "");
        assert_eq!(unified_diff("", "", "x", "y"), "");
    }

    #[test]
    fn single_line_change() {
        let diff = unified_diff(
            "one\ntwo\nthree\n",
            "one\nTWO\nthree\n",
            "old.txt",
            "new.txt",
        );
        assert_eq!(
            diff,
            "--- old.txt\n+++ new.txt\n@@ -1,3 +1,3 @@\n one\n-two\n+TWO\n three\n"
        );
    }

    #[test]
    fn creation_shows_all_lines_added() {
        let diff = unified_diff("", "line1\nline2\n", "/d", "/s");
        assert_eq!(
            diff,
            "--- /d\n+++ /s\n@@ -0,0 +1,2 @@\n+line1\n+line2\n"
        );
    }

    #[test]
    fn deletion_at_end() {
        let diff = unified_diff("a\nb\n", "a\n", "f", "g");
        assert_eq!(diff, "--- f\n+++ g\n@@ -1,2 +1 @@\n a\n-b\n");
    }

    #[test]
    fn missing_trailing_newline_is_annotated() {
        let diff = unified_diff("a\n", "a\nb", "f", "g");
        assert_eq!(
            diff,
            "--- f\n+++ g\n@@ -1 +1,2 @@\n a\n+b\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn annotation_on_removed_line_too() {
        let diff = unified_diff("a", "b\n", "f", "g");
        assert_eq!(
            diff,
            "--- f\n+++ g\n@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n"
        );
    }

    #[test]
    fn distant_changes_split_into_two_hunks() {
        let old: String = (1..=20).map(|i| format!("{i}\n")).collect();
        let new = old
            .replacen("1\n", "one\n", 1)
            .replace("20\n", "twenty\n");
        let diff = unified_diff(&old, &new, "f", "g");
        assert!(diff.contains("@@ -1,4 +1,4 @@"), "first hunk header: {diff}");
        assert!(diff.contains("@@ -17,4 +17,4 @@"), "second hunk header: {diff}");
        assert!(diff.contains("-1\n+one\n"));
        assert!(diff.contains("-20\n+twenty\n"));
        assert!(!diff.contains(" 10\n"), "middle context must be elided");
    }

    #[test]
    fn range_formatting() {
        assert_eq!(format_range(0, 1), "1");
        assert_eq!(format_range(0, 3), "1,3");
        assert_eq!(format_range(0, 0), "0,0");
        assert_eq!(format_range(16, 20), "17,4");
        assert_eq!(format_range(5, 5), "5,0");
    }

    #[test]
    fn file_diff_missing_dest_shows_creation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        fs::write(&src, "hello\n").expect("write");
        let dest = dir.path().join("absent");
        let diff = file_diff(&src, "label", &dest, true).expect("diff");
        assert!(diff.contains("+hello"));
        assert!(diff.contains("+++ label"));
        assert!(diff.contains(&format!("--- {}", dest.display())));
    }

    #[test]
    fn file_diff_disabled_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        fs::write(&src, "hello\n").expect("write");
        assert!(file_diff(&src, "label", &dir.path().join("absent"), false).is_none());
    }

    #[test]
    fn file_diff_identical_files_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::write(&src, "same\n").expect("write");
        fs::write(&dest, "same\n").expect("write");
        assert!(file_diff(&src, "label", &dest, true).is_none());
    }

    #[test]
    fn file_diff_binary_source_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        fs::write(&src, [0xff_u8, 0xfe, 0x00]).expect("write");
        assert!(file_diff(&src, "label", &dir.path().join("absent"), true).is_none());
    }
}
