//! Markdown → block-tree conversion.
//!
//! Deliberately line-oriented rather than a general markdown parser: the
//! destination block format carries a single bold flag per block of text,
//! so inline spans beyond that one bit are not preserved. Recognized
//! structures: `##`/`###` headings, `-` bullet items, paragraphs.

use serde_json::{json, Value};

/// Notion caps a single rich_text run at 2000 characters.
const RICH_TEXT_CHAR_LIMIT: usize = 2000;

/// One typed unit of document content. An ordered sequence of these forms
/// the structured body of a stored record. Write-once: built from a summary
/// string, then serialized into the page-creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    BulletItem { text: String, bold: bool },
    Paragraph { text: String, bold: bool },
}

/// Paragraph accumulation state for the line scanner. Consecutive plain
/// lines collect here until a blank line or a heading/bullet line closes
/// them into one paragraph block.
enum ParagraphState {
    None,
    InParagraph { lines: Vec<String> },
}

impl ParagraphState {
    fn flush(&mut self, blocks: &mut Vec<Block>) {
        if let ParagraphState::InParagraph { lines } =
            std::mem::replace(self, ParagraphState::None)
        {
            let (text, bold) = strip_bold(&lines.join("\n"));
            blocks.push(Block::Paragraph { text, bold });
        }
    }

    fn push_line(&mut self, line: &str) {
        match self {
            ParagraphState::None => {
                *self = ParagraphState::InParagraph {
                    lines: vec![line.to_string()],
                }
            }
            ParagraphState::InParagraph { lines } => lines.push(line.to_string()),
        }
    }
}

/// Converts a markdown summary into an ordered block sequence.
pub fn to_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut state = ParagraphState::None;

    for raw_line in markdown.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            state.flush(&mut blocks);
        } else if let Some(rest) = line.strip_prefix("###") {
            state.flush(&mut blocks);
            blocks.push(Block::Heading {
                level: 3,
                text: rest.trim().to_string(),
            });
        } else if let Some(rest) = line.strip_prefix("##") {
            state.flush(&mut blocks);
            blocks.push(Block::Heading {
                level: 2,
                text: rest.trim().to_string(),
            });
        } else if let Some(rest) = line.strip_prefix('-') {
            state.flush(&mut blocks);
            let (text, bold) = strip_bold(rest.trim());
            blocks.push(Block::BulletItem { text, bold });
        } else {
            state.push_line(line);
        }
    }

    // A trailing open paragraph at end-of-input is flushed.
    state.flush(&mut blocks);
    blocks
}

/// Detects a `**…**` span and strips all bold markers from the text.
fn strip_bold(text: &str) -> (String, bool) {
    let bold = contains_bold_span(text);
    (text.replace("**", "").trim().to_string(), bold)
}

fn contains_bold_span(text: &str) -> bool {
    if let Some(open) = text.find("**") {
        let rest = &text[open + 2..];
        if let Some(close) = rest.find("**") {
            return close > 0;
        }
    }
    false
}

impl Block {
    /// Maps the block 1:1 onto Notion's native block-type vocabulary.
    pub fn to_notion_json(&self) -> Value {
        match self {
            Block::Heading { level, text } => {
                if *level == 3 {
                    json!({
                        "object": "block",
                        "type": "heading_3",
                        "heading_3": { "rich_text": [rich_text_run(text, false)] }
                    })
                } else {
                    json!({
                        "object": "block",
                        "type": "heading_2",
                        "heading_2": { "rich_text": [rich_text_run(text, false)] }
                    })
                }
            }
            Block::BulletItem { text, bold } => json!({
                "object": "block",
                "type": "bulleted_list_item",
                "bulleted_list_item": { "rich_text": [rich_text_run(text, *bold)] }
            }),
            Block::Paragraph { text, bold } => json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": [rich_text_run(text, *bold)] }
            }),
        }
    }
}

/// A single text run with a bold annotation flag, clamped to Notion's limit.
fn rich_text_run(text: &str, bold: bool) -> Value {
    json!({
        "type": "text",
        "text": { "content": clamp_rich_text(text) },
        "annotations": { "bold": bold }
    })
}

fn clamp_rich_text(text: &str) -> &str {
    match text.char_indices().nth(RICH_TEXT_CHAR_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_blocks_headings_paragraph_and_bullets() {
        let blocks = to_blocks("## Title\n\nSome text\n- item one\n- **bold** item");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 2,
                    text: "Title".to_string()
                },
                Block::Paragraph {
                    text: "Some text".to_string(),
                    bold: false
                },
                Block::BulletItem {
                    text: "item one".to_string(),
                    bold: false
                },
                Block::BulletItem {
                    text: "bold item".to_string(),
                    bold: true
                },
            ]
        );
    }

    #[test]
    fn test_to_blocks_empty_input() {
        assert!(to_blocks("").is_empty());
    }

    #[test]
    fn test_to_blocks_level_three_heading() {
        let blocks = to_blocks("### Details");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 3,
                text: "Details".to_string()
            }]
        );
    }

    #[test]
    fn test_to_blocks_joins_consecutive_lines_into_one_paragraph() {
        let blocks = to_blocks("first line\nsecond line\n\nthird");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    text: "first line\nsecond line".to_string(),
                    bold: false
                },
                Block::Paragraph {
                    text: "third".to_string(),
                    bold: false
                },
            ]
        );
    }

    #[test]
    fn test_to_blocks_heading_closes_open_paragraph() {
        let blocks = to_blocks("intro text\n## Section");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    text: "intro text".to_string(),
                    bold: false
                },
                Block::Heading {
                    level: 2,
                    text: "Section".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_to_blocks_trailing_paragraph_is_flushed() {
        let blocks = to_blocks("## Title\ndangling paragraph");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[1],
            Block::Paragraph {
                text: "dangling paragraph".to_string(),
                bold: false
            }
        );
    }

    #[test]
    fn test_bold_paragraph_detection() {
        let blocks = to_blocks("this is **important** stuff");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                text: "this is important stuff".to_string(),
                bold: true
            }]
        );
    }

    #[test]
    fn test_unterminated_bold_marker_is_not_bold() {
        let blocks = to_blocks("- ** dangling marker");
        assert_eq!(
            blocks,
            vec![Block::BulletItem {
                text: "dangling marker".to_string(),
                bold: false
            }]
        );
    }

    #[test]
    fn test_heading_serializes_to_notion_vocabulary() {
        let block = Block::Heading {
            level: 2,
            text: "Title".to_string(),
        };
        let value = block.to_notion_json();
        assert_eq!(value["type"], "heading_2");
        assert_eq!(
            value["heading_2"]["rich_text"][0]["text"]["content"],
            "Title"
        );
        assert_eq!(
            value["heading_2"]["rich_text"][0]["annotations"]["bold"],
            false
        );
    }

    #[test]
    fn test_bullet_serializes_bold_annotation() {
        let block = Block::BulletItem {
            text: "key point".to_string(),
            bold: true,
        };
        let value = block.to_notion_json();
        assert_eq!(value["type"], "bulleted_list_item");
        assert_eq!(
            value["bulleted_list_item"]["rich_text"][0]["annotations"]["bold"],
            true
        );
    }

    #[test]
    fn test_rich_text_run_clamps_long_content() {
        let long = "a".repeat(3000);
        let value = rich_text_run(&long, false);
        let content = value["text"]["content"].as_str().unwrap();
        assert_eq!(content.len(), 2000);
    }
}
