//! CLI output formatting utilities.

use crate::dialogue::{DialogueTurn, Role};
use crate::notes::{Annotation, AnnotationKind};
use crate::selection::SelectionDescriptor;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Shown in the notes list while an extract is being enriched.
const GENERATING: &str = "Generating insight...";

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a numbered transcript line.
    pub fn transcript_line(number: usize, text: &str) {
        println!("{} {}", style(format!("{:>4}", number)).dim(), text);
    }

    /// Print the current selection and the actions available on it.
    pub fn selection(selection: &SelectionDescriptor) {
        println!(
            "{} \"{}\" {}",
            style("Selected:").cyan().bold(),
            content_preview(&selection.text, 120),
            style(format!(
                "(actions at {:.0},{:.0}: highlight | extract | dive)",
                selection.anchor_position.x, selection.anchor_position.y
            ))
            .dim()
        );
    }

    /// Print one note of the notes panel.
    pub fn note(note: &Annotation) {
        let kind = match note.kind {
            AnnotationKind::Highlight => style(note.kind.label()).yellow().bold(),
            AnnotationKind::Extract => style(note.kind.label()).magenta().bold(),
            AnnotationKind::DeepDive => style(note.kind.label()).blue().bold(),
        };

        println!(
            "\n{} {} {}",
            style(format!("#{}", note.id)).dim(),
            kind,
            style(note.created_at.format("%H:%M").to_string()).dim()
        );
        println!("   \"{}\"", style(content_preview(&note.original_text, 200)).italic());

        if note.is_pending() {
            println!("   {}", style(GENERATING).dim());
        } else if let Some(content) = &note.content {
            for line in content.lines() {
                println!("   {}", line);
            }
        }
    }

    /// Print a finished dialogue turn.
    pub fn turn(turn: &DialogueTurn) {
        match turn.role {
            Role::Assistant => println!("\n{} {}", Self::coach_label(), turn.text),
            Role::User => println!("\n{} {}", style("You:").green().bold(), turn.text),
        }
    }

    /// Label printed before a streamed coach reply.
    pub fn coach_label() -> console::StyledObject<&'static str> {
        style("Coach:").cyan().bold()
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten and truncate content with ellipsis.
pub(crate) fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("ééééé", 3), "ééé...");
    }
}
