/*!
 * Content Formatting
 * Turns admin-entered About copy into typed display segments
 *
 * The About text uses a small line-oriented markup:
 *
 * ```text
 * **A HEADING**
 * Paragraph text that may span
 * several lines.
 *
 * • A bullet item
 * • Another bullet item
 * ```
 */
use serde::Serialize;

const HEADING_MARKER: &str = "**";
const BULLET_MARKER: char = '•';

/// Number of sections at which the About block switches to the long layout.
pub const LONG_CONTENT_SECTIONS: usize = 3;

/// One display unit of formatted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum Segment {
    Heading(String),
    Bullet(String),
    Paragraph(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Heading(text) | Segment::Bullet(text) | Segment::Paragraph(text) => text,
        }
    }
}

enum Line<'a> {
    Heading(&'a str),
    Bullet(&'a str),
    Text(&'a str),
    Blank,
}

/// Classify a raw line. The heading check runs before the bullet check, and
/// the two heading markers must not overlap (`**` alone is plain text).
fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    if line.len() >= HEADING_MARKER.len() * 2 {
        if let Some(inner) = line
            .strip_prefix(HEADING_MARKER)
            .and_then(|rest| rest.strip_suffix(HEADING_MARKER))
        {
            return Line::Heading(inner.trim());
        }
    }

    match line.strip_prefix(BULLET_MARKER) {
        Some(rest) => Line::Bullet(rest.trim()),
        None => Line::Text(line),
    }
}

fn flush_paragraph(paragraph: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if !paragraph.is_empty() {
        segments.push(Segment::Paragraph(paragraph.join(" ")));
        paragraph.clear();
    }
}

/// Parse raw content into headings, bullets and paragraphs.
///
/// Consecutive plain lines are joined with a single space into one paragraph;
/// a heading, a bullet or a blank line ends the current paragraph.
pub fn format_content(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in raw.lines() {
        match classify(line) {
            Line::Heading(text) => {
                flush_paragraph(&mut paragraph, &mut segments);
                segments.push(Segment::Heading(text.to_string()));
            }
            Line::Bullet(text) => {
                flush_paragraph(&mut paragraph, &mut segments);
                segments.push(Segment::Bullet(text.to_string()));
            }
            Line::Text(text) => paragraph.push(text),
            Line::Blank => flush_paragraph(&mut paragraph, &mut segments),
        }
    }
    flush_paragraph(&mut paragraph, &mut segments);

    segments
}

/// Count sections: every heading is one, and a bullet run seen before any
/// heading claims a single section.
pub fn section_count(raw: &str) -> usize {
    raw.lines().fold(0, |count, line| match classify(line) {
        Line::Heading(_) => count + 1,
        Line::Bullet(_) if count == 0 => 1,
        _ => count,
    })
}

/// Whether the content is long enough to show the secondary About image.
pub fn has_long_content(raw: &str) -> bool {
    section_count(raw) >= LONG_CONTENT_SECTIONS
}

/// Render segments into escaped HTML for clients that embed it directly.
pub fn render_html(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Heading(text) => {
                format!(r#"<h4 class="mt-4 mb-2">{}</h4>"#, ammonia::clean_text(text))
            }
            Segment::Bullet(text) => format!(
                r#"<p class="mb-2"><i class="fa fa-circle text-primary me-2"></i>{}</p>"#,
                ammonia::clean_text(text)
            ),
            Segment::Paragraph(text) => {
                format!(r#"<p class="mb-3">{}</p>"#, ammonia::clean_text(text))
            }
        })
        .collect()
}

/// Newline-separated list (bullet points, newsletter benefits).
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-separated list (service topics).
pub fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mixed_content() {
        let raw = "**WHO I AM**\nKeynote speaker and\ntrainer.\n\n• Leadership\n• Hospitality\nClosing words.";
        assert_eq!(
            format_content(raw),
            vec![
                Segment::Heading("WHO I AM".to_string()),
                Segment::Paragraph("Keynote speaker and trainer.".to_string()),
                Segment::Bullet("Leadership".to_string()),
                Segment::Bullet("Hospitality".to_string()),
                Segment::Paragraph("Closing words.".to_string()),
            ]
        );
    }

    #[test]
    fn test_format_empty_and_whitespace_input() {
        assert!(format_content("").is_empty());
        assert!(format_content("   \n\t\n  ").is_empty());
        assert!(!has_long_content("   \n  "));
    }

    #[test]
    fn test_blank_lines_split_paragraphs() {
        let segments = format_content("first\n\n\nsecond\nthird");
        assert_eq!(
            segments,
            vec![
                Segment::Paragraph("first".to_string()),
                Segment::Paragraph("second third".to_string()),
            ]
        );
    }

    #[test]
    fn test_heading_wins_over_bullet_shape() {
        let segments = format_content("**• Both**");
        assert_eq!(segments, vec![Segment::Heading("• Both".to_string())]);
    }

    #[test]
    fn test_malformed_heading_is_plain_text() {
        let segments = format_content("**Not closed\n**");
        assert_eq!(
            segments,
            vec![Segment::Paragraph("**Not closed **".to_string())]
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let segments = format_content("   **  Title  **   \n   •   item  ");
        assert_eq!(
            segments,
            vec![
                Segment::Heading("Title".to_string()),
                Segment::Bullet("item".to_string()),
            ]
        );
    }

    #[test]
    fn test_segment_text_reconstructs_content() {
        let raw = "**One**\nalpha\nbeta\n\n• gamma\n**Two**\ndelta";
        let segments = format_content(raw);
        let joined: Vec<&str> = segments.iter().map(Segment::text).collect();
        assert_eq!(joined.join(" "), "One alpha beta gamma Two delta");
    }

    #[test]
    fn test_three_headings_is_long() {
        assert!(has_long_content("**A**\nx\n**B**\ny\n**C**\nz"));
        assert_eq!(section_count("**A**\nx\n**B**\ny\n**C**\nz"), 3);
    }

    #[test]
    fn test_bullets_alone_count_as_one_section() {
        assert!(!has_long_content("• one\n• two"));
        assert_eq!(section_count("• one\n• two\n• three"), 1);
    }

    #[test]
    fn test_bullets_after_heading_add_nothing() {
        assert_eq!(section_count("**A**\n• one\n• two\n**B**"), 2);
    }

    #[test]
    fn test_leading_bullets_plus_two_headings_is_long() {
        assert!(has_long_content("• intro\n**A**\ntext\n**B**\ntext"));
    }

    #[test]
    fn test_empty_content_is_not_long() {
        assert!(!has_long_content(""));
    }

    #[test]
    fn test_render_html_escapes_text() {
        let html = render_html(&[
            Segment::Heading("Tips & <Tricks>".to_string()),
            Segment::Paragraph("plain".to_string()),
        ]);
        assert!(html.starts_with(r#"<h4 class="mt-4 mb-2">"#));
        assert!(html.contains("&lt;Tricks&gt;"));
        assert!(!html.contains("<Tricks>"));
        assert!(html.ends_with(r#"<p class="mb-3">plain</p>"#));
    }

    #[test]
    fn test_list_helpers_drop_blanks() {
        assert_eq!(
            split_lines("Keynote Speaker\n\n  Leadership Trainer  \n"),
            vec!["Keynote Speaker", "Leadership Trainer"]
        );
        assert_eq!(split_commas("a, b,, c ,"), vec!["a", "b", "c"]);
    }
}
