//! Extraction of `[[t/name]]` tag tokens from markdown.
//!
//! Tags are only recognised in plain prose. Fenced code blocks, inline code
//! spans and HTML comments are skipped. The same scanner drives both tag
//! collection and link filling.

use std::collections::BTreeSet;

use crate::error::{MAX_TAG_LEN, TagNameError};

const TAG_OPEN: &str = "[[t/";
const TAG_CLOSE: &str = "]]";
const FENCE: &str = "```";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub name: String,
    pub line: usize,
}

/// One `[[t/...]]` occurrence found in prose. `name` is not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken<'a> {
    pub name: &'a str,
    /// Byte offset of the opening `[[`.
    pub start: usize,
    /// Byte offset just past the closing `]]`.
    pub end: usize,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    FencedCode,
    InlineCode,
    HtmlComment,
}

pub fn validate_tag_name(name: &str) -> Result<(), TagNameError> {
    if name.is_empty() {
        return Err(TagNameError::Empty);
    }
    if name.len() > MAX_TAG_LEN {
        return Err(TagNameError::TooLong { len: name.len() });
    }
    if name.contains("..") {
        return Err(TagNameError::PathTraversal);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')))
    {
        return Err(TagNameError::InvalidChar(bad));
    }
    if name.split('/').any(|segment| segment.is_empty() || segment == ".") {
        return Err(TagNameError::InvalidSegment);
    }
    Ok(())
}

pub fn is_valid_tag_name(name: &str) -> bool {
    validate_tag_name(name).is_ok()
}

fn line_is_fence(rest: &str) -> bool {
    let line = rest.split('\n').next().unwrap_or("");
    line.trim_start_matches([' ', '\t']).starts_with(FENCE)
}

fn line_end(content: &str, from: usize) -> usize {
    content[from..]
        .find('\n')
        .map(|offset| from + offset)
        .unwrap_or(content.len())
}

/// Walk `content` and return every tag token that sits in prose.
///
/// A leading byte-order mark is skipped. An opener captures everything up
/// to the next `]]`, even across lines; one with no `]]` left is discarded.
/// Inline code spans end at a closing backtick or at a blank line.
pub fn scan_tag_tokens(content: &str) -> Vec<TagToken<'_>> {
    let mut tokens = Vec::new();
    let mut state = ScanState::Normal;
    let mut line = 1usize;
    let mut at_line_start = true;
    let mut i = if content.starts_with(BOM) {
        BOM.len_utf8()
    } else {
        0
    };

    while i < content.len() {
        let rest = &content[i..];

        if at_line_start {
            at_line_start = false;
            if state == ScanState::InlineCode && rest.starts_with('\n') {
                state = ScanState::Normal;
            }
            let fence_toggle = match state {
                ScanState::Normal | ScanState::InlineCode => {
                    line_is_fence(rest).then_some(ScanState::FencedCode)
                }
                ScanState::FencedCode => line_is_fence(rest).then_some(ScanState::Normal),
                ScanState::HtmlComment => None,
            };
            if let Some(next) = fence_toggle {
                state = next;
                i = line_end(content, i);
                continue;
            }
            if state == ScanState::FencedCode {
                i = line_end(content, i);
                continue;
            }
        }

        if rest.starts_with('\n') {
            line += 1;
            at_line_start = true;
            i += 1;
            continue;
        }

        match state {
            ScanState::FencedCode => {
                i = line_end(content, i);
            }
            ScanState::HtmlComment => {
                if rest.starts_with(COMMENT_CLOSE) {
                    state = ScanState::Normal;
                    i += COMMENT_CLOSE.len();
                } else {
                    i += next_char_len(rest);
                }
            }
            ScanState::InlineCode => {
                if rest.starts_with('`') {
                    state = ScanState::Normal;
                }
                i += next_char_len(rest);
            }
            ScanState::Normal => {
                if rest.starts_with(COMMENT_OPEN) {
                    state = ScanState::HtmlComment;
                    i += COMMENT_OPEN.len();
                } else if rest.starts_with('`') {
                    state = ScanState::InlineCode;
                    i += 1;
                } else if rest.starts_with(TAG_OPEN) {
                    let name_start = i + TAG_OPEN.len();
                    match content[name_start..].find(TAG_CLOSE) {
                        Some(offset) => {
                            let name_end = name_start + offset;
                            let name = &content[name_start..name_end];
                            tokens.push(TagToken {
                                name,
                                start: i,
                                end: name_end + TAG_CLOSE.len(),
                                line,
                            });
                            line += name.matches('\n').count();
                            i = name_end + TAG_CLOSE.len();
                        }
                        None => {
                            i = name_start;
                        }
                    }
                } else {
                    i += next_char_len(rest);
                }
            }
        }
    }

    tokens
}

fn next_char_len(rest: &str) -> usize {
    rest.chars().next().map(char::len_utf8).unwrap_or(1)
}

/// Valid, unique tags in first-occurrence order.
pub fn parse_tags(content: &str) -> Vec<ParsedTag> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for token in scan_tag_tokens(content) {
        if !is_valid_tag_name(token.name) {
            continue;
        }
        if seen.insert(token.name) {
            out.push(ParsedTag {
                name: token.name.to_string(),
                line: token.line,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        parse_tags(content).into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn inline_code_hides_tags() {
        assert_eq!(names("`[[t/ignored]]` [[t/found]]"), vec!["found"]);
    }

    #[test]
    fn fenced_block_hides_tags() {
        let doc = "intro\n```rust\n[[t/hidden]]\n```\nafter [[t/shown]]\n";
        assert_eq!(names(doc), vec!["shown"]);
    }

    #[test]
    fn indented_fence_still_counts() {
        let doc = "  ```\n[[t/hidden]]\n  ```\n[[t/shown]]";
        assert_eq!(names(doc), vec!["shown"]);
    }

    #[test]
    fn unterminated_tag_is_dropped() {
        assert!(names("[[t/x").is_empty());
        assert!(names("[[t/x\n]]").is_empty());
    }

    #[test]
    fn opener_runs_to_next_closer_across_lines() {
        assert!(names("[[t/a\n[[t/b]]").is_empty());
        let tags = parse_tags("[[t/a\nb]]\n[[t/c]]");
        assert_eq!(
            tags,
            vec![ParsedTag {
                name: "c".into(),
                line: 3
            }]
        );
    }

    #[test]
    fn html_comment_spans_lines() {
        let doc = "<!-- [[t/a]]\n[[t/b]] -->[[t/c]]";
        assert_eq!(names(doc), vec!["c"]);
    }

    #[test]
    fn duplicates_keep_first_line() {
        let tags = parse_tags("one\n[[t/dup]]\n[[t/other]] [[t/dup]]");
        assert_eq!(
            tags,
            vec![
                ParsedTag {
                    name: "dup".into(),
                    line: 2
                },
                ParsedTag {
                    name: "other".into(),
                    line: 3
                },
            ]
        );
    }

    #[test]
    fn bom_is_skipped() {
        let tags = parse_tags("\u{feff}[[t/first]]");
        assert_eq!(tags[0].name, "first");
        assert_eq!(tags[0].line, 1);
    }

    #[test]
    fn invalid_names_are_skipped() {
        assert_eq!(
            names("[[t/foo bar]] [[t/../x]] [[t/]] [[t/./x]] [[t/area/infra]]"),
            vec!["area/infra"]
        );
    }

    #[test]
    fn stray_backtick_closes_at_blank_line() {
        let doc = "a ` unmatched\n\n[[t/later]]";
        assert_eq!(names(doc), vec!["later"]);
    }

    #[test]
    fn token_offsets_cover_the_brackets() {
        let doc = "x [[t/a]] y";
        let tokens = scan_tag_tokens(doc);
        assert_eq!(tokens.len(), 1);
        assert_eq!(&doc[tokens[0].start..tokens[0].end], "[[t/a]]");
    }

    #[test]
    fn validation_reports_reason() {
        assert_eq!(
            validate_tag_name("../secret"),
            Err(TagNameError::PathTraversal)
        );
        assert_eq!(
            validate_tag_name("foo bar"),
            Err(TagNameError::InvalidChar(' '))
        );
        assert_eq!(validate_tag_name(""), Err(TagNameError::Empty));
        assert_eq!(
            validate_tag_name(&"a".repeat(256)),
            Err(TagNameError::TooLong { len: 256 })
        );
        assert_eq!(validate_tag_name("/abs"), Err(TagNameError::InvalidSegment));
        assert_eq!(validate_tag_name("./x"), Err(TagNameError::InvalidSegment));
        assert_eq!(validate_tag_name("a/./b"), Err(TagNameError::InvalidSegment));
        assert_eq!(validate_tag_name("x/."), Err(TagNameError::InvalidSegment));
        assert!(validate_tag_name(".hidden/x.y").is_ok());
        assert!(validate_tag_name("area/infra-2.x_y").is_ok());
    }
}
