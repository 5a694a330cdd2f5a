//! Interactive reading session.

use crate::cli::output::content_preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::dialogue::{ReplyEnd, SendRejected, REPLY_FAILED};
use crate::notes::{AnnotationId, Resolution};
use crate::podcast::Podcast;
use crate::selection::{NodeId, RawSelection, Rect, SelectionBoundary};
use crate::services::{OpenAiServices, ScriptedServices, Services};
use crate::session::ReadingSession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LINE_HEIGHT: f64 = 24.0;
const CHAR_WIDTH: f64 = 8.0;

const HELP: &str = r#"Reading:
  show                    Print the transcript with line numbers
  select <a>[-<b>]        Select transcript lines a through b
  select "phrase"         Select the first occurrence of a phrase
  highlight               Save the selection as a highlight
  extract                 Extract an insight from the selection
  dive                    Reflect on the selection with the coach
  notes                   List your notes
  delete <id>             Delete a note
  export [DIR] [--no-summary] [--print]
                          Save the learning report (and open it for printing)
  print [--no-summary]    Open the learning report for printing
  help                    Show this help
  quit                    End the session

During a deep dive, type to talk to the coach. Commands start with '/':
  /save                   Summarize the conversation into a note
  /close                  Leave without saving"#;

/// The transcript as shown in the terminal, one node per line.
pub struct TranscriptView {
    lines: Vec<String>,
}

impl TranscriptView {
    pub fn new(podcast: &Podcast) -> Self {
        Self {
            lines: podcast
                .transcript_lines()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Selection covering lines `first..=last`, numbered from 1.
    ///
    /// Lines past the end of the transcript leave the selection's focus
    /// outside the view.
    pub fn select_lines(&self, first: usize, last: usize) -> RawSelection {
        let start = first.saturating_sub(1);
        let end = last.min(self.lines.len());
        let covered = self.lines.get(start..end).unwrap_or(&[]);

        let width = covered.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        RawSelection {
            text: covered.join("\n"),
            anchor: NodeId(start),
            focus: NodeId(last.saturating_sub(1)),
            bounds: Rect {
                x: 0.0,
                y: start as f64 * LINE_HEIGHT,
                width: width as f64 * CHAR_WIDTH,
                height: covered.len() as f64 * LINE_HEIGHT,
            },
            scroll_top: 0.0,
        }
    }

    /// Selection of the first occurrence of `phrase` within one line.
    pub fn find_phrase(&self, phrase: &str) -> Option<RawSelection> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return None;
        }

        self.lines.iter().enumerate().find_map(|(index, line)| {
            let offset = line.find(phrase)?;
            let column = line[..offset].chars().count();
            Some(RawSelection {
                text: line[offset..offset + phrase.len()].to_string(),
                anchor: NodeId(index),
                focus: NodeId(index),
                bounds: Rect {
                    x: column as f64 * CHAR_WIDTH,
                    y: index as f64 * LINE_HEIGHT,
                    width: phrase.chars().count() as f64 * CHAR_WIDTH,
                    height: LINE_HEIGHT,
                },
                scroll_top: 0.0,
            })
        })
    }
}

impl SelectionBoundary for TranscriptView {
    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.lines.len()
    }
}

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Show,
    SelectLines { first: usize, last: usize },
    SelectPhrase(String),
    Highlight,
    Extract,
    Dive,
    Say(String),
    Save,
    Close,
    Notes,
    Delete(AnnotationId),
    Export {
        dir: Option<PathBuf>,
        summary: Option<bool>,
        print: bool,
    },
    Print {
        summary: Option<bool>,
    },
    Help,
    Quit,
}

/// Parse one input line. While a deep dive is open, plain text is a message.
fn parse_command(line: &str, in_dive: bool) -> std::result::Result<Command, String> {
    let line = line.trim();
    if in_dive && !line.starts_with('/') {
        return Ok(Command::Say(line.to_string()));
    }

    let line = line.strip_prefix('/').unwrap_or(line);
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "show" => Ok(Command::Show),
        "select" | "sel" => parse_select(rest),
        "highlight" | "hl" => Ok(Command::Highlight),
        "extract" | "x" => Ok(Command::Extract),
        "dive" => Ok(Command::Dive),
        "save" => Ok(Command::Save),
        "close" => Ok(Command::Close),
        "notes" => Ok(Command::Notes),
        "delete" | "rm" => rest.parse().map(Command::Delete),
        "export" => parse_export(rest),
        "print" => {
            let (_, summary, _) = parse_report_flags(rest)?;
            Ok(Command::Print { summary })
        }
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{}'. Type 'help' for commands.", other)),
    }
}

fn parse_select(rest: &str) -> std::result::Result<Command, String> {
    if rest.is_empty() {
        return Err("Usage: select <a>[-<b>] or select \"phrase\"".to_string());
    }

    if let Some(quoted) = rest.strip_prefix('"') {
        let phrase = quoted.strip_suffix('"').unwrap_or(quoted);
        return Ok(Command::SelectPhrase(phrase.to_string()));
    }

    let range = match rest.split_once('-') {
        Some((a, b)) => a.trim().parse::<usize>().ok().zip(b.trim().parse::<usize>().ok()),
        None => rest.parse::<usize>().ok().map(|a| (a, a)),
    };

    match range {
        Some((first, last)) if first >= 1 && first <= last => Ok(Command::SelectLines { first, last }),
        Some(_) => Err("Line ranges start at 1 and must not run backwards".to_string()),
        None => Ok(Command::SelectPhrase(rest.to_string())),
    }
}

fn parse_export(rest: &str) -> std::result::Result<Command, String> {
    let (dir, summary, print) = parse_report_flags(rest)?;
    Ok(Command::Export { dir, summary, print })
}

fn parse_report_flags(rest: &str) -> std::result::Result<(Option<PathBuf>, Option<bool>, bool), String> {
    let mut dir = None;
    let mut summary = None;
    let mut print = false;

    for token in rest.split_whitespace() {
        match token {
            "--no-summary" => summary = Some(false),
            "--summary" => summary = Some(true),
            "--print" => print = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path if dir.is_none() => dir = Some(Settings::expand_path(path)),
            extra => return Err(format!("Unexpected argument '{}'", extra)),
        }
    }

    Ok((dir, summary, print))
}

/// Run the reflect command.
pub async fn run_reflect(
    podcast_path: &Path,
    transcript: Option<&Path>,
    offline: bool,
    settings: Settings,
) -> Result<()> {
    let operation = if offline { Operation::Offline } else { Operation::Reflect };
    if let Err(e) = preflight::check(operation, &settings.llm) {
        Output::error(&format!("{}", e));
        Output::info("Use --offline to try PodEcho without a model API.");
        return Err(e.into());
    }

    let mut podcast = Podcast::load(podcast_path)?;
    if let Some(path) = transcript {
        podcast = podcast.with_transcript_file(path)?;
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let services = if offline {
        info!("Using offline services");
        Services::from_provider(ScriptedServices::new())
    } else {
        Services::from_provider(OpenAiServices::new(&settings.llm, prompts.clone())?)
    };

    let view = TranscriptView::new(&podcast);
    if view.lines().is_empty() {
        Output::warning("This podcast has no transcript to read.");
    }

    let output_dir = settings.output_dir();
    let session = ReadingSession::new(podcast, &settings, prompts, services);
    Repl::new(session, view, output_dir).run().await
}

/// What the loop does after a command.
enum Flow {
    Continue,
    Quit,
}

struct Repl {
    session: ReadingSession,
    view: TranscriptView,
    output_dir: PathBuf,
}

impl Repl {
    fn new(session: ReadingSession, view: TranscriptView, output_dir: PathBuf) -> Self {
        Self {
            session,
            view,
            output_dir,
        }
    }

    async fn run(mut self) -> Result<()> {
        let podcast = self.session.podcast();
        println!("\n{}", style(&podcast.title).bold().cyan());
        println!(
            "{}\n",
            style(format!(
                "{} | {} lines. Type 'show' to read, 'help' for commands.",
                podcast.host,
                self.view.lines().len()
            ))
            .dim()
        );

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            let prompt = if self.session.dialogue().is_some() {
                style("You:").green().bold()
            } else {
                style("podecho>").cyan().bold()
            };
            print!("{} ", prompt);
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match parse_command(input, self.session.dialogue().is_some()) {
                Ok(command) => {
                    if let Flow::Quit = self.handle(command).await? {
                        break;
                    }
                }
                Err(msg) => Output::warning(&msg),
            }
        }

        let stats = self.session.stats();
        Output::info(&format!(
            "Session ended with {} highlights, {} extracts and {} deep dives.",
            stats.highlight_count, stats.extract_count, stats.deep_dive_count
        ));
        Ok(())
    }

    async fn handle(&mut self, command: Command) -> Result<Flow> {
        debug!("Command: {:?}", command);

        match command {
            Command::Show => {
                for (index, line) in self.view.lines().iter().enumerate() {
                    Output::transcript_line(index + 1, line);
                }
            }

            Command::SelectLines { first, last } => {
                let raw = self.view.select_lines(first, last);
                self.apply_selection(raw);
            }

            Command::SelectPhrase(phrase) => match self.view.find_phrase(&phrase) {
                Some(raw) => self.apply_selection(raw),
                None => {
                    self.session.clear_selection();
                    Output::warning(&format!("\"{}\" does not appear in the transcript", phrase));
                }
            },

            Command::Highlight => match self.session.create_highlight() {
                Some(id) => Output::success(&format!("Highlight #{} saved", id)),
                None => Self::no_selection(),
            },

            Command::Extract => match self.session.begin_extract() {
                Some(job) => {
                    let id = job.id();
                    Output::info(&format!("Extract #{} saved, generating insight...", id));
                    tokio::spawn(async move {
                        if job.run().await == Resolution::Applied {
                            Output::success(&format!("Insight ready for note #{}", id));
                        }
                    });
                }
                None => Self::no_selection(),
            },

            Command::Dive => match self.session.begin_deep_dive() {
                Some(dialogue) => {
                    Output::header(&format!("Deep dive: \"{}\"", content_preview(dialogue.anchor_text(), 60)));
                    if let Some(greeting) = dialogue.turns().first() {
                        Output::turn(greeting);
                    }
                    println!("{}", style("Type '/save' to keep this reflection, '/close' to leave.").dim());
                }
                None => Self::no_selection(),
            },

            Command::Say(text) => self.say(&text).await?,

            Command::Save => {
                if self.session.dialogue().is_none() {
                    Output::warning("No deep dive is open.");
                } else {
                    let spinner = Output::spinner("Summarizing your reflection...");
                    let id = self.session.save_deep_dive().await;
                    spinner.finish_and_clear();
                    if let Some(id) = id {
                        Output::success(&format!("Reflection saved as note #{}", id));
                    }
                }
            }

            Command::Close => {
                if self.session.discard_deep_dive() {
                    Output::info("Deep dive closed without saving.");
                } else {
                    Output::warning("No deep dive is open.");
                }
            }

            Command::Notes => {
                let notes = self.session.notes();
                if notes.is_empty() {
                    Output::info("No notes yet. Select some text and highlight, extract or dive.");
                } else {
                    Output::header(&format!("Notes ({})", notes.len()));
                    notes.iter().for_each(Output::note);
                    println!();
                }
            }

            Command::Delete(id) => {
                if self.session.delete_note(id) {
                    Output::success(&format!("Note #{} deleted", id));
                } else {
                    Output::warning(&format!("No note #{}", id));
                }
            }

            Command::Export { dir, summary, print } => {
                let report = self.compile(summary).await;
                let dir = dir.unwrap_or_else(|| self.output_dir.clone());
                let path = report.save_to(&dir)?;
                Output::success(&format!("Report saved to {}", path.display()));

                if print {
                    Self::open_for_print(&report);
                }
            }

            Command::Print { summary } => {
                let report = self.compile(summary).await;
                Self::open_for_print(&report);
            }

            Command::Help => println!("{}", HELP),

            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn apply_selection(&mut self, raw: RawSelection) {
        match self.session.on_selection_change(Some(&raw), &self.view) {
            Some(selection) => Output::selection(selection),
            None => Output::warning("Nothing selected: the selection must lie inside the transcript."),
        }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        print!("\n{} ", Output::coach_label());
        io::stdout().flush()?;

        let result = self
            .session
            .send_message_observed(text, |chunk| {
                print!("{}", chunk);
                let _ = io::stdout().flush();
            })
            .await;
        println!();

        match result {
            Ok(ReplyEnd::Completed) => println!(),
            Ok(ReplyEnd::Failed) => Output::warning(REPLY_FAILED),
            Err(SendRejected::Blank) => {}
            Err(rejected) => Output::warning(&format!("Message not sent: {}", rejected)),
        }
        Ok(())
    }

    async fn compile(&self, summary: Option<bool>) -> crate::report::CompiledReport {
        let pending = self.session.notes().iter().filter(|n| n.is_pending()).count();
        if pending > 0 {
            Output::warning(&format!("{} insights are still being generated", pending));
        }

        let include_summary = summary.unwrap_or_else(|| self.session.summary_by_default());
        if !include_summary {
            return self.session.prepare_report(false).await;
        }

        let spinner = Output::spinner("Generating your learning summary...");
        let report = self.session.prepare_report(true).await;
        spinner.finish_and_clear();
        report
    }

    fn open_for_print(report: &crate::report::CompiledReport) {
        match report.open_for_print() {
            Ok(path) => Output::success(&format!(
                "Opened {} for printing. Use your viewer's print dialog to save a PDF.",
                path.display()
            )),
            Err(e) => Output::error(&format!("Could not open the report: {}", e)),
        }
    }

    fn no_selection() {
        Output::warning("Select some transcript text first (see 'help').");
    }
}
