//! Learning report compilation.
//!
//! [`compile_report`] is a pure function of the podcast, a snapshot of the
//! notes, and an optional session summary. The document it returns is
//! self-contained: styling and artwork are inlined and nothing needs a script
//! to render.

mod export;
mod markdown;
mod style;

pub use export::{report_file_name, CompiledReport};
pub use markdown::{escape_html, render_markdown};

use crate::notes::{Annotation, AnnotationKind, SessionStats};
use crate::podcast::Podcast;
use crate::services::SessionSummary;
use std::fmt::Write;

/// Shown instead of the summary when none was generated.
pub const SUMMARY_PLACEHOLDER: &str = "Summary waiting to be generated...";

/// Shown instead of the note groups when there are no notes.
pub const NO_NOTES_NOTICE: &str = "No notes taken for this session.";

/// Notes partitioned by kind, each group in store order.
#[derive(Debug, Default)]
struct Groups<'a> {
    highlights: Vec<&'a Annotation>,
    extracts: Vec<&'a Annotation>,
    deep_dives: Vec<&'a Annotation>,
}

impl<'a> Groups<'a> {
    fn partition(notes: &'a [Annotation]) -> Self {
        let mut groups = Self::default();
        for note in notes {
            match note.kind {
                AnnotationKind::Highlight => groups.highlights.push(note),
                AnnotationKind::Extract => groups.extracts.push(note),
                AnnotationKind::DeepDive => groups.deep_dives.push(note),
            }
        }
        groups
    }

    fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.extracts.is_empty() && self.deep_dives.is_empty()
    }
}

/// Render the report document for a reading session.
pub fn compile_report(
    podcast: &Podcast,
    notes: &[Annotation],
    summary: Option<&SessionSummary>,
) -> String {
    let groups = Groups::partition(notes);
    let stats = SessionStats::from_notes(notes);

    let mut body = String::new();
    write_header(&mut body, podcast);
    write_stats(&mut body, &stats);
    write_summary(&mut body, summary);
    write_notes(&mut body, &groups);
    write_footer(&mut body);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - PodEcho Learning Report</title>
  <style>{styles}</style>
</head>
<body>
  <div class="page-container">
{body}  </div>
</body>
</html>
"#,
        title = escape_html(&podcast.title),
        styles = style::STYLES,
        body = body,
    )
}

fn write_header(out: &mut String, podcast: &Podcast) {
    let meta = [&podcast.host, &podcast.duration, &podcast.date]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(" &nbsp;|&nbsp; ");

    let _ = write!(
        out,
        r#"    <div class="header">
      <div class="logo">{logo} PodEcho</div>
      <div class="report-title">Learning Report</div>
      <h1 class="podcast-title">{title}</h1>
      <div class="meta-divider"></div>
      <div class="meta-info">{meta}</div>
    </div>
"#,
        logo = style::logo_svg(24),
        title = escape_html(&podcast.title),
        meta = meta,
    );
}

fn write_stats(out: &mut String, stats: &SessionStats) {
    out.push_str("    <div class=\"stats-grid\">\n");
    for (count, label) in [
        (stats.highlight_count, "Highlights"),
        (stats.extract_count, "Extracts"),
        (stats.deep_dive_count, "Deep Dives"),
    ] {
        let _ = writeln!(
            out,
            r#"      <div class="stat-card"><span class="stat-number">{count}</span><span class="stat-label">{label}</span></div>"#
        );
    }
    out.push_str("    </div>\n");
}

fn write_summary(out: &mut String, summary: Option<&SessionSummary>) {
    out.push_str("    <h2 class=\"section-title\">Your Learning Summary</h2>\n");
    out.push_str("    <div class=\"summary-card\">\n");

    match summary {
        Some(summary) => {
            let insights = if summary.core_insights.trim().is_empty() {
                "No insights generated.".to_string()
            } else {
                escape_html(summary.core_insights.trim())
            };
            write_summary_section(out, "✨ Core Insights", &insights);
            write_summary_section(
                out,
                "🌱 Personal Growth",
                &summary_list(&summary.personal_growth, "No growth points generated."),
            );
            write_summary_section(
                out,
                "🎯 Action Items",
                &summary_list(&summary.actionable_tips, "No action items generated."),
            );
        }
        None => {
            let _ = writeln!(
                out,
                r#"      <div class="summary-placeholder">{}</div>"#,
                SUMMARY_PLACEHOLDER
            );
        }
    }

    out.push_str("    </div>\n");
}

fn write_summary_section(out: &mut String, heading: &str, content: &str) {
    let _ = write!(
        out,
        r#"      <div class="summary-section">
        <div class="summary-heading">{heading}</div>
        <div class="summary-content">{content}</div>
      </div>
"#
    );
}

fn summary_list(items: &[String], empty: &str) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();

    if items.is_empty() {
        empty.to_string()
    } else {
        format!("<ul>{}</ul>", items.concat())
    }
}

fn write_notes(out: &mut String, groups: &Groups<'_>) {
    out.push_str("    <h2 class=\"section-title\">Your Notes</h2>\n");

    if groups.is_empty() {
        let _ = writeln!(out, r#"    <div class="empty-notes">{}</div>"#, NO_NOTES_NOTICE);
        return;
    }

    if !groups.highlights.is_empty() {
        open_group(out, "📝 Highlights");
        for note in &groups.highlights {
            let _ = writeln!(
                out,
                r#"        <div class="note-card highlight"><div class="quote-box">"{}"</div></div>"#,
                escape_html(&note.original_text)
            );
        }
        close_group(out);
    }

    if !groups.extracts.is_empty() {
        open_group(out, "✨ Extracted Insights");
        for note in &groups.extracts {
            write_derived_card(out, "extract", "Insight", note, render_content(note));
        }
        close_group(out);
    }

    if !groups.deep_dives.is_empty() {
        open_group(out, "💬 Deep Reflections");
        for note in &groups.deep_dives {
            let content = format!(r#"<div class="reflection">{}</div>"#, render_content(note));
            write_derived_card(out, "deep-dive", "Reflection", note, content);
        }
        close_group(out);
    }
}

fn render_content(note: &Annotation) -> String {
    note.content
        .as_deref()
        .map(render_markdown)
        .unwrap_or_default()
}

fn open_group(out: &mut String, title: &str) {
    let _ = writeln!(out, r#"    <div class="notes-group">"#);
    let _ = writeln!(out, r#"      <div class="group-title">{title}</div>"#);
}

fn close_group(out: &mut String) {
    out.push_str("    </div>\n");
}

fn write_derived_card(out: &mut String, class: &str, label: &str, note: &Annotation, content: String) {
    let _ = write!(
        out,
        r#"        <div class="note-card {class}">
          <div class="quote-box">"{quote}"</div>
          <span class="insight-label">{label}</span>
          <div class="note-content">{content}</div>
        </div>
"#,
        quote = escape_html(&note.original_text),
    );
}

fn write_footer(out: &mut String) {
    let _ = write!(
        out,
        r#"    <div class="footer">
      <div class="footer-brand">Made with PodEcho</div>
      <div class="footer-slogan">Make podcasts echo, not just pass through</div>
      <div class="footer-icon">{}</div>
    </div>
"#,
        style::logo_svg(20)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{AnnotationId, EXTRACT_PENDING};
    use chrono::{TimeZone, Utc};

    fn podcast() -> Podcast {
        serde_json::from_value(serde_json::json!({
            "id": "ep-42",
            "title": "Growth & Grit",
            "host": "Dana",
            "duration": "45 min",
            "date": "2024-03-01",
            "fullTranscript": "Resistance is key."
        }))
        .unwrap()
    }

    fn note(id: u64, kind: AnnotationKind, text: &str, content: Option<&str>) -> Annotation {
        Annotation {
            id: AnnotationId::new(id),
            kind,
            original_text: text.to_string(),
            content: content.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            pending: false,
        }
    }

    #[test]
    fn test_single_highlight_without_summary() {
        let notes = vec![note(1, AnnotationKind::Highlight, "Resistance is key", None)];
        let html = compile_report(&podcast(), &notes, None);

        assert!(html.contains(SUMMARY_PLACEHOLDER));
        assert_eq!(html.matches(r#"class="note-card highlight""#).count(), 1);
        assert!(html.contains(r#"<div class="quote-box">"Resistance is key"</div>"#));
        assert!(html.contains("📝 Highlights"));
        assert!(!html.contains("✨ Extracted Insights"));
        assert!(!html.contains("💬 Deep Reflections"));
        assert!(!html.contains(NO_NOTES_NOTICE));
    }

    #[test]
    fn test_empty_notes_show_notice() {
        let html = compile_report(&podcast(), &[], None);

        assert!(html.contains(NO_NOTES_NOTICE));
        assert!(!html.contains(r#"class="notes-group""#));
        assert_eq!(html.matches(r#"<span class="stat-number">0</span>"#).count(), 3);
    }

    #[test]
    fn test_extract_markdown_is_rendered() {
        let notes = vec![note(1, AnnotationKind::Extract, "text", Some("This is the **key** point."))];
        let html = compile_report(&podcast(), &notes, None);

        assert!(html.contains("<strong>key</strong>"));
        assert!(!html.contains("**key**"));
        assert!(html.contains(r#"<span class="insight-label">Insight</span>"#));
    }

    #[test]
    fn test_groups_in_fixed_order_preserving_store_order() {
        let notes = vec![
            note(4, AnnotationKind::DeepDive, "dive anchor", Some("We talked.")),
            note(3, AnnotationKind::Highlight, "second highlight", None),
            note(2, AnnotationKind::Extract, "an extract", Some(EXTRACT_PENDING)),
            note(1, AnnotationKind::Highlight, "first highlight", None),
        ];
        let html = compile_report(&podcast(), &notes, None);

        let pos = |needle: &str| html.find(needle).unwrap();
        assert!(pos("📝 Highlights") < pos("✨ Extracted Insights"));
        assert!(pos("✨ Extracted Insights") < pos("💬 Deep Reflections"));
        assert!(pos("second highlight") < pos("first highlight"));
        assert!(html.contains(r#"<span class="insight-label">Reflection</span>"#));
        assert!(html.contains(r#"<span class="stat-number">2</span><span class="stat-label">Highlights</span>"#));
    }

    #[test]
    fn test_summary_sections() {
        let summary = SessionSummary {
            core_insights: "You learned that <growth> needs resistance.".to_string(),
            personal_growth: vec!["Lean into discomfort.".to_string()],
            actionable_tips: vec![],
        };
        let html = compile_report(&podcast(), &[], Some(&summary));

        assert!(!html.contains(SUMMARY_PLACEHOLDER));
        assert!(html.contains("✨ Core Insights"));
        assert!(html.contains("&lt;growth&gt;"));
        assert!(html.contains("<li>Lean into discomfort.</li>"));
        assert!(html.contains("No action items generated."));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let notes = vec![
            note(2, AnnotationKind::Extract, "</div><script>x()</script>", Some("<img src=x onerror=y>")),
            note(1, AnnotationKind::Highlight, "a < b & \"c\"", None),
        ];
        let html = compile_report(&podcast(), &notes, None);

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(html.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(html.contains("Growth &amp; Grit"));
    }

    #[test]
    fn test_header_and_footer() {
        let html = compile_report(&podcast(), &[], None);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Learning Report"));
        assert!(html.contains("Dana &nbsp;|&nbsp; 45 min &nbsp;|&nbsp; 2024-03-01"));
        assert!(html.contains("Made with PodEcho"));
        assert!(html.contains("Make podcasts echo, not just pass through"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("<link"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let notes = vec![
            note(2, AnnotationKind::Extract, "x", Some("- a\n- b")),
            note(1, AnnotationKind::Highlight, "y", None),
        ];
        let summary = SessionSummary::default();
        let podcast = podcast();

        assert_eq!(
            compile_report(&podcast, &notes, Some(&summary)),
            compile_report(&podcast, &notes, Some(&summary))
        );
        assert_eq!(compile_report(&podcast, &notes, None), compile_report(&podcast, &notes, None));
    }
}
