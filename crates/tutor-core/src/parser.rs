//! Heading-marker textbook parser.
//!
//! Splits a formatted textbook into [`Passage`]s, one per non-empty
//! subsection. The source format is plain UTF-8 text with Markdown-style
//! heading markers (`#` chapter, `##` section, `###` subsection) and a
//! three-hyphen divider line between major blocks.
//!
//! # Algorithm
//!
//! 1. Split the document on the literal `\n---\n` divider. A document
//!    with no divider is a single block.
//! 2. Scan each block's lines top to bottom, carrying the current
//!    chapter and section **across** blocks: a subsection's labels come
//!    from the nearest preceding heading of that depth anywhere earlier
//!    in the document.
//! 3. A `###` heading opens a passage; its body is every following line
//!    until the next heading line (any depth) or the end of the block.
//! 4. Bodies that trim to empty are dropped and consume no id.
//! 5. Accepted passages get sequential decimal ids starting at `"1"`,
//!    global across the whole document.
//!
//! Heading lines never appear in passage text. A chapter or section
//! heading with nothing after the marker is kept as an empty label, not
//! defaulted; only a label that was *never* set falls back to
//! [`UNKNOWN_LABEL`].

use crate::models::{Passage, PassageMetadata, UNKNOWN_LABEL};

/// Block divider: a line of exactly three hyphens between blank-line
/// delimited blocks.
const DIVIDER: &str = "\n---\n";

/// Parse a formatted textbook into labeled passages.
///
/// Returns one [`Passage`] per non-empty subsection, in document order,
/// with ids `"1"`, `"2"`, … counted over accepted passages only.
pub fn parse_document(text: &str) -> Vec<Passage> {
    let mut passages = Vec::new();
    let mut counter: u64 = 1;

    let mut current_chapter: Option<String> = None;
    let mut current_section: Option<String> = None;

    for block in text.split(DIVIDER) {
        let lines: Vec<&str> = block.trim().lines().collect();

        let mut i = 0;
        while i < lines.len() {
            match heading(lines[i]) {
                Some(Heading::Chapter(title)) => {
                    current_chapter = Some(title.to_string());
                    i += 1;
                }
                Some(Heading::Section(title)) => {
                    current_section = Some(title.to_string());
                    i += 1;
                }
                Some(Heading::Subsection(title)) => {
                    let subsection = title.to_string();
                    let mut body_lines = Vec::new();
                    i += 1;
                    while i < lines.len() && !is_heading_boundary(lines[i]) {
                        body_lines.push(lines[i]);
                        i += 1;
                    }

                    let body = body_lines.join("\n");
                    let body = body.trim();
                    if body.is_empty() {
                        continue;
                    }

                    passages.push(Passage {
                        id: counter.to_string(),
                        text: body.to_string(),
                        metadata: PassageMetadata {
                            chapter: current_chapter
                                .clone()
                                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                            section: current_section
                                .clone()
                                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                            subsection,
                        },
                    });
                    counter += 1;
                }
                None => {
                    i += 1;
                }
            }
        }
    }

    passages
}

enum Heading<'a> {
    Chapter(&'a str),
    Section(&'a str),
    Subsection(&'a str),
}

/// Classify a line as a heading by its leading `#` run.
///
/// Exactly one, two, or three markers make a heading; deeper runs are
/// plain content at scan level (but still close a passage body, see
/// [`is_heading_boundary`]). The title is the remainder, trimmed; an
/// empty title is legal.
fn heading(line: &str) -> Option<Heading<'_>> {
    let trimmed = line.trim();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    let title = trimmed[hashes..].trim();
    match hashes {
        1 => Some(Heading::Chapter(title)),
        2 => Some(Heading::Section(title)),
        3 => Some(Heading::Subsection(title)),
        _ => None,
    }
}

/// A line whose trimmed form starts with any heading marker ends the
/// passage body being collected (boundary is exclusive).
fn is_heading_boundary(line: &str) -> bool {
    line.trim().starts_with('#')
}
