//! Raw heuristic metrics for a single source file
//!
//! Everything here is a pure function of the file's bytes:
//!
//! - `lines_of_code`: non-blank lines that are not comment lines
//! - `complexity_factor`: weighted count of control-flow and logical tokens
//! - `dependency_count`: include/import directives
//! - `include_complexity`: extra weight for relative, deep or namespaced
//!   include targets
//! - `function_count`: `{` count minus `struct`/`enum` occurrences, floored
//!   at zero. Deliberately crude; it is the documented estimate, not a parser.
//!
//! Only effective (non-blank, non-comment) lines feed the other counters.

use crate::config::IncludeWeights;
use crate::models::FileMetrics;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

/// Control-flow keywords and their complexity weight
const KEYWORD_WEIGHTS: &[(&str, f64)] = &[
    ("if", 1.0),
    ("else", 0.5),
    ("while", 1.0),
    ("for", 1.0),
    ("switch", 1.0),
    ("case", 0.5),
    ("goto", 1.0),
    ("break", 0.5),
    ("continue", 0.5),
];

const LOGICAL_OPERATOR_WEIGHT: f64 = 0.5;
const CONDITIONAL_OPERATOR_WEIGHT: f64 = 0.25;

/// Extensions dropped before splitting an include target into segments
const TARGET_EXTENSIONS: &[&str] = &[
    "h", "hh", "hpp", "hxx", "inc", "c", "cc", "cpp", "cxx", "m", "mm", "js", "jsx", "mjs", "ts",
    "tsx", "py", "rb", "php", "rs", "go",
];

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    Decode { path: PathBuf },
}

/// How single-line comments are spelled in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` line comments and `/* */` blocks
    CStyle,
    /// `#` line comments
    Hash,
}

impl CommentStyle {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py" | "pyi" | "rb" | "sh") => CommentStyle::Hash,
            _ => CommentStyle::CStyle,
        }
    }
}

static DIRECTIVES: OnceLock<Vec<Regex>> = OnceLock::new();
static DECLARATIONS: OnceLock<Regex> = OnceLock::new();

/// Include/import directive patterns; group 1 is the raw target text.
fn directives() -> &'static [Regex] {
    DIRECTIVES.get_or_init(|| {
        [
            r"^#\s*(?:include|import)\s*(.+)$",
            r"^import\s+(.+)$",
            r"^from\s+(\S+)\s+import\b",
            r"^(?:pub(?:\([^)]*\))?\s+)?use\s+([^;{]+)",
            r"^using\s+(?:static\s+)?([^;=()]+);",
            r"^(?:require|require_once|require_relative|include_once)\b\s*\(?\s*(.+)$",
            r"^extern\s+crate\s+(\w+)",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
    })
}

fn declarations() -> &'static Regex {
    DECLARATIONS.get_or_init(|| Regex::new(r"\b(?:struct|enum)\b").expect("valid regex"))
}

/// Computes [`FileMetrics`] from source text
#[derive(Debug, Clone)]
pub struct FileMetricsCollector {
    includes: IncludeWeights,
}

impl FileMetricsCollector {
    pub fn new(includes: &IncludeWeights) -> Self {
        Self {
            includes: includes.clone(),
        }
    }

    /// Read a file and compute its metrics.
    pub fn collect(&self, path: &Path) -> Result<FileMetrics, CollectError> {
        let bytes = std::fs::read(path).map_err(|source| CollectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| CollectError::Decode {
            path: path.to_path_buf(),
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        Ok(self.analyze(content, CommentStyle::for_path(path)))
    }

    /// Like [`collect`](Self::collect), but substitutes zero-valued metrics
    /// (and logs a warning) when the file cannot be read or decoded.
    pub fn collect_or_zero(&self, path: &Path) -> (FileMetrics, bool) {
        match self.collect(path) {
            Ok(metrics) => (metrics, true),
            Err(e) => {
                warn!("{}; counting it as zero cost", e);
                (FileMetrics::default(), false)
            }
        }
    }

    /// Compute metrics for already-decoded source text.
    pub fn analyze(&self, content: &str, style: CommentStyle) -> FileMetrics {
        let lines = effective_lines(content, style);

        let mut metrics = FileMetrics {
            lines_of_code: lines.len(),
            ..FileMetrics::default()
        };

        let mut braces = 0usize;
        let mut declared = 0usize;
        for line in &lines {
            metrics.complexity_factor += line_complexity(line);

            if let Some(target) = self.directive_target(line) {
                metrics.dependency_count += 1;
                metrics.include_complexity += self.include_weight(&target);
            }

            braces += line.matches('{').count();
            declared += declarations().find_iter(line).count();
        }
        metrics.function_count = braces.saturating_sub(declared);

        metrics
    }

    fn directive_target(&self, line: &str) -> Option<String> {
        directives()
            .iter()
            .find_map(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| extract_target(m.as_str()))
    }

    fn include_weight(&self, target: &str) -> f64 {
        let relative = target.starts_with("../") || target.contains("/../");
        let segments = target_segments(target);

        let mut weight = 0.0;
        if relative {
            weight += self.includes.relative;
        }
        if segments.len() > 3 {
            weight += self.includes.deep;
        }
        if !relative && segments.len() >= 2 {
            weight += self.includes.namespaced;
        }
        weight
    }
}

/// Trimmed non-blank lines with their comments removed, in order.
///
/// Code sharing a line with a block comment is kept; only the comment text
/// is dropped.
fn effective_lines(content: &str, style: CommentStyle) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match style {
            CommentStyle::Hash => {
                if !line.starts_with('#') {
                    lines.push(line);
                }
            }
            CommentStyle::CStyle => {
                if let Some(code) = strip_c_comments(line, &mut in_block) {
                    lines.push(code);
                }
            }
        }
    }

    lines
}

/// The code left on a line once leading comments are removed, tracking
/// whether a `/* ... */` block is still open.
fn strip_c_comments<'a>(line: &'a str, in_block: &mut bool) -> Option<&'a str> {
    let mut rest = line;
    loop {
        if *in_block {
            let close = rest.find("*/")?;
            *in_block = false;
            rest = rest[close + 2..].trim_start();
            continue;
        }
        if rest.is_empty() || rest.starts_with("//") {
            return None;
        }
        if let Some(body) = rest.strip_prefix("/*") {
            *in_block = true;
            rest = body;
            continue;
        }
        return Some(rest.trim_end());
    }
}

/// Weighted count of control-flow keywords and logical/conditional operators.
fn line_complexity(line: &str) -> f64 {
    let chars: Vec<char> = line.chars().collect();
    let mut total = 0.0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if let Some((_, weight)) = KEYWORD_WEIGHTS.iter().find(|(kw, _)| *kw == word) {
                total += weight;
            }
            continue;
        }

        let next = chars.get(i + 1).copied();
        match c {
            '&' if next == Some('&') => {
                total += LOGICAL_OPERATOR_WEIGHT;
                i += 2;
                continue;
            }
            '|' if next == Some('|') => {
                total += LOGICAL_OPERATOR_WEIGHT;
                i += 2;
                continue;
            }
            '?' => total += CONDITIONAL_OPERATOR_WEIGHT,
            ':' => {
                let prev = if i > 0 { Some(chars[i - 1]) } else { None };
                if next == Some(':') {
                    // `::` path separator
                    i += 2;
                    continue;
                }
                if prev != Some(':') {
                    total += CONDITIONAL_OPERATOR_WEIGHT;
                }
            }
            _ => {}
        }
        i += 1;
    }

    total
}

/// Pull the include target out of the text following a directive keyword.
fn extract_target(raw: &str) -> String {
    let raw = raw.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('<', '>')] {
        if let Some(start) = raw.find(open) {
            if let Some(len) = raw[start + 1..].find(close) {
                return raw[start + 1..start + 1 + len].to_string();
            }
        }
    }

    // Unquoted module path: `import os.path`, `use std::fmt;`
    raw.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches([';', ','])
        .to_string()
}

fn target_segments(target: &str) -> Vec<&str> {
    let stem = match target.rsplit_once('.') {
        Some((stem, ext)) if TARGET_EXTENSIONS.contains(&ext) => stem,
        _ => target,
    };

    let separator = if stem.contains('/') {
        "/"
    } else if stem.contains("::") {
        "::"
    } else {
        "."
    };

    stem.split(separator)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> FileMetricsCollector {
        FileMetricsCollector::new(&IncludeWeights::default())
    }

    fn c_metrics(source: &str) -> FileMetrics {
        collector().analyze(source, CommentStyle::CStyle)
    }

    #[test]
    fn test_counts_effective_lines_only() {
        let source = "\
// header comment
/* block
   still block
*/
int a = 1;

   // indented comment
int b = 2; // trailing comment counts as code
/* one-line block */
/**
 * doc line
 */
*ptr = 3;
";
        assert_eq!(c_metrics(source).lines_of_code, 3);
    }

    #[test]
    fn test_code_after_leading_block_comment() {
        let m = c_metrics("/* fast path */ if (x) { return 1; }
");
        assert_eq!(m.lines_of_code, 1);
        assert_eq!(m.complexity_factor, 1.0);
        assert_eq!(m.function_count, 1);
    }

    #[test]
    fn test_code_after_block_comment_close() {
        let m = c_metrics("/* start\n end */ while (x) { y(); }\n");
        assert_eq!(m.lines_of_code, 1);
        assert_eq!(m.complexity_factor, 1.0);

        // nothing after the close
        assert_eq!(c_metrics("/* a\n b */\nint c;\n").lines_of_code, 1);
    }

    #[test]
    fn test_leading_star_outside_block_is_code() {
        let m = c_metrics("int y = a\n    * b;\n");
        assert_eq!(m.lines_of_code, 2);
    }

    #[test]
    fn test_block_comments_chain_on_one_line() {
        assert_eq!(c_metrics("/* a */ /* b */ int c;\n").lines_of_code, 1);
        assert_eq!(c_metrics("/* a */ // b\n").lines_of_code, 0);
        assert_eq!(c_metrics("/*/ still open\nint c; */\nint d;\n").lines_of_code, 1);
    }

    #[test]
    fn test_hash_comments_and_preprocessor() {
        let py = "# comment\nimport os\n\nx = 1\n";
        let metrics = collector().analyze(py, CommentStyle::Hash);
        assert_eq!(metrics.lines_of_code, 2);
        assert_eq!(metrics.dependency_count, 1);

        // In C the same `#` prefix is a directive, not a comment
        let c = "#include <stdio.h>\nint main() { return 0; }\n";
        let metrics = c_metrics(c);
        assert_eq!(metrics.lines_of_code, 2);
        assert_eq!(metrics.dependency_count, 1);
    }

    #[test]
    fn test_complexity_tokens() {
        // if(1) else(0.5) while(1) && (0.5) || (0.5) ?(0.25) :(0.25)
        let source = "if (a && b) { x(); } else { while (c || d) { y = e ? f : g; } }";
        let metrics = c_metrics(source);
        assert!((metrics.complexity_factor - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        let metrics = c_metrics("int iffy = format + fork + casework + elsewhere;");
        assert_eq!(metrics.complexity_factor, 0.0);
    }

    #[test]
    fn test_path_separator_is_not_conditional() {
        let metrics = c_metrics("std::vector<int> v = ns::make();");
        assert_eq!(metrics.complexity_factor, 0.0);
    }

    #[test]
    fn test_switch_case_goto_break_continue() {
        let source = "switch (x) {\ncase 1: break;\ncase 2: continue;\ndefault: goto out;\n}";
        let metrics = c_metrics(source);
        // switch 1 + case 0.5*2 + ':' 0.25*3 + break 0.5 + continue 0.5 + goto 1
        assert!((metrics.complexity_factor - 4.75).abs() < 1e-9);
    }

    #[test]
    fn test_dependency_directives() {
        let source = "\
#include \"local.h\"
#include <sys/types.h>
#import <Foundation/Foundation.h>
import java.util.List;
use std::collections::HashMap;
using System.Text;
";
        assert_eq!(c_metrics(source).dependency_count, 6);

        let py = "from a.b import c\nimport os\nrequire 'json'\n";
        assert_eq!(collector().analyze(py, CommentStyle::Hash).dependency_count, 3);
    }

    #[test]
    fn test_include_complexity_weights() {
        let weights = IncludeWeights::default();
        // flat local include: nothing extra
        assert_eq!(c_metrics("#include \"util.h\"").include_complexity, 0.0);
        // relative
        assert_eq!(
            c_metrics("#include \"../util.h\"").include_complexity,
            weights.relative
        );
        // namespaced
        assert_eq!(
            c_metrics("#include <sys/types.h>").include_complexity,
            weights.namespaced
        );
        // deep and namespaced
        assert_eq!(
            c_metrics("#include <a/b/c/d.h>").include_complexity,
            weights.deep + weights.namespaced
        );
        // deep relative: relative + deep, never namespaced
        assert_eq!(
            c_metrics("#include \"../../x/y/z/w.h\"").include_complexity,
            weights.relative + weights.deep
        );
        // module paths
        assert_eq!(
            c_metrics("use std::collections::HashMap;").include_complexity,
            weights.namespaced
        );
    }

    #[test]
    fn test_function_count_heuristic() {
        let source = "\
struct Point { int x; int y; };
enum Color { Red, Green };
int area(struct Point p) { return p.x * p.y; }
void noop() {}
";
        // 4 braces, 3 struct/enum occurrences
        assert_eq!(c_metrics(source).function_count, 1);
    }

    #[test]
    fn test_function_count_floors_at_zero() {
        let source = "struct A;\nstruct B;\nenum C;\n";
        assert_eq!(c_metrics(source).function_count, 0);
    }

    #[test]
    fn test_costs_are_left_to_the_calculator() {
        let metrics = c_metrics("int main() { if (x) return 1; return 0; }");
        assert_eq!(metrics.base_cost, 0.0);
        assert_eq!(metrics.final_cost, 0.0);
    }

    #[test]
    fn test_collect_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.c");
        std::fs::write(
            &path,
            "#include \"../core.h\"\nint run(int x) {\n  if (x > 0 && x < 9) { return x ? 1 : 0; }\n  return 0;\n}\n",
        )
        .expect("write");

        let first = collector().collect(&path).expect("collect");
        let second = collector().collect(&path).expect("collect again");
        assert_eq!(first, second);
        assert_eq!(first.lines_of_code, 5);
        assert_eq!(first.dependency_count, 1);
    }

    #[test]
    fn test_unreadable_file_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.c");
        assert!(matches!(
            collector().collect(&missing),
            Err(CollectError::Io { .. })
        ));
        let (metrics, ok) = collector().collect_or_zero(&missing);
        assert!(!ok);
        assert_eq!(metrics, FileMetrics::default());
    }

    #[test]
    fn test_undecodable_file_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob.c");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80, 0x81]).expect("write");
        assert!(matches!(
            collector().collect(&path),
            Err(CollectError::Decode { .. })
        ));
        let (metrics, ok) = collector().collect_or_zero(&path);
        assert!(!ok);
        assert_eq!(metrics, FileMetrics::default());
    }

    #[test]
    fn test_comment_style_by_extension() {
        assert_eq!(CommentStyle::for_path(Path::new("a/b.py")), CommentStyle::Hash);
        assert_eq!(CommentStyle::for_path(Path::new("a/b.rb")), CommentStyle::Hash);
        assert_eq!(CommentStyle::for_path(Path::new("a/b.cpp")), CommentStyle::CStyle);
        assert_eq!(CommentStyle::for_path(Path::new("a/b.rs")), CommentStyle::CStyle);
    }
}
