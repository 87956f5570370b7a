use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::html_out::escape_html;
use crate::model::CellValue;

/// Shown instead of an annotation that has no content.
pub const EMPTY_PLACEHOLDER: &str = "无";

static NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+、").expect("hardcoded numbering regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Numbered { label: String, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Empty,
    Plain(String),
    Enumerated(Vec<Segment>),
}

impl Annotation {
    /// Segments in source order; a plain annotation is one unlabeled segment.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        match self {
            Self::Empty => Vec::new(),
            Self::Plain(text) => vec![Segment::Prose(text.clone())],
            Self::Enumerated(segments) => segments.clone(),
        }
    }
}

fn annotation_text(value: &CellValue) -> Option<String> {
    let text = match value {
        CellValue::Empty => return None,
        CellValue::Number(number) if number.is_nan() || *number == 0.0 => return None,
        CellValue::Number(number) => number.to_string(),
        CellValue::Text(text) => text.clone(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return None;
    }
    Some(trimmed.to_string())
}

/// Splits enumerated text such as `1、xx 2、yy` into labeled segments.
///
/// Prose before the first number becomes an unlabeled segment when it is not
/// blank. A number at the very end still yields a segment with an empty body.
#[must_use]
pub fn parse_annotation(value: &CellValue) -> Annotation {
    let Some(text) = annotation_text(value) else {
        return Annotation::Empty;
    };

    let marks = NUMBERING_RE.find_iter(&text).collect::<Vec<_>>();
    let Some(first) = marks.first() else {
        return Annotation::Plain(text);
    };

    let mut segments = Vec::with_capacity(marks.len() + 1);
    let lead = text[..first.start()].trim();
    if !lead.is_empty() {
        segments.push(Segment::Prose(lead.to_string()));
    }

    for (index, mark) in marks.iter().enumerate() {
        let body_end = marks
            .get(index + 1)
            .map_or(text.len(), regex::Match::start);
        segments.push(Segment::Numbered {
            label: mark.as_str().to_string(),
            body: text[mark.end()..body_end].trim().to_string(),
        });
    }

    Annotation::Enumerated(segments)
}

#[must_use]
pub fn render_annotation(annotation: &Annotation, color: &str) -> String {
    let color = escape_html(color);
    match annotation {
        Annotation::Empty => EMPTY_PLACEHOLDER.to_string(),
        Annotation::Plain(text) => format!(
            r#"<div style="color:{color}; line-height:2;">{}</div>"#,
            escape_html(text)
        ),
        Annotation::Enumerated(segments) => {
            let mut out = String::from(r#"<div style="line-height:2;">"#);
            for segment in segments {
                match segment {
                    Segment::Prose(text) => {
                        let _ = write!(
                            out,
                            r#"<div style="color:{color};">{}</div>"#,
                            escape_html(text)
                        );
                    }
                    Segment::Numbered { label, body } => {
                        let _ = write!(
                            out,
                            r#"<div style="margin-top:8px; color:{color};"><b>{}</b>{}</div>"#,
                            escape_html(label),
                            escape_html(body)
                        );
                    }
                }
            }
            out.push_str("</div>");
            out
        }
    }
}

/// Parses and renders an annotation cell in one step.
#[must_use]
pub fn format_text_list(value: &CellValue, color: &str) -> String {
    render_annotation(&parse_annotation(value), color)
}
