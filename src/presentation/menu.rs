use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::app::lookup_use_case::{LookupField, LookupUseCase};
use crate::error::Result;

/// Most results printed for a single lookup
pub const MAX_DISPLAYED_RESULTS: usize = 50;

const MAIN_MENU: &str = "\
Catalog lookup
  1) Search by title
  2) Search by actor
  3) Search by director
  4) Search by category
  5) Exit
Choose an option: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    MainMenu,
    AwaitingQuery(LookupField),
    ShowingResults { field: LookupField, query: String },
    ConfirmReturn,
    Exit,
}

/// Outcome of feeding one line of input to a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: MenuState,
    /// Message shown before the next prompt (invalid input, ...)
    pub notice: Option<String>,
}

impl Transition {
    fn to(next: MenuState) -> Self {
        Self { next, notice: None }
    }

    fn stay(state: &MenuState, notice: impl Into<String>) -> Self {
        Self {
            next: state.clone(),
            notice: Some(notice.into()),
        }
    }
}

/// Prompt written before reading input in `state`, if the state reads input
pub fn prompt(state: &MenuState) -> Option<String> {
    match state {
        MenuState::MainMenu => Some(MAIN_MENU.to_string()),
        MenuState::AwaitingQuery(field) => Some(format!("Enter {}: ", field)),
        MenuState::ConfirmReturn => Some("Return to the main menu? (y/n): ".to_string()),
        MenuState::ShowingResults { .. } | MenuState::Exit => None,
    }
}

pub fn transition(state: &MenuState, input: &str) -> Transition {
    let input = input.trim();
    match state {
        MenuState::MainMenu => match input {
            "1" => Transition::to(MenuState::AwaitingQuery(LookupField::Title)),
            "2" => Transition::to(MenuState::AwaitingQuery(LookupField::Actor)),
            "3" => Transition::to(MenuState::AwaitingQuery(LookupField::Director)),
            "4" => Transition::to(MenuState::AwaitingQuery(LookupField::Category)),
            "5" => Transition::to(MenuState::Exit),
            other => Transition::stay(state, format!("Invalid choice {:?}, pick 1-5", other)),
        },
        MenuState::AwaitingQuery(field) => {
            if input.is_empty() {
                Transition::stay(state, "Please enter a search term")
            } else {
                Transition::to(MenuState::ShowingResults {
                    field: *field,
                    query: input.to_string(),
                })
            }
        }
        MenuState::ShowingResults { .. } => Transition::to(MenuState::ConfirmReturn),
        MenuState::ConfirmReturn => match input.to_lowercase().as_str() {
            "y" | "yes" => Transition::to(MenuState::MainMenu),
            "n" | "no" => Transition::to(MenuState::Exit),
            _ => Transition::stay(state, "Please answer y or n"),
        },
        MenuState::Exit => Transition::to(MenuState::Exit),
    }
}

/// Where the menu reads its input lines from
pub trait LineSource {
    /// Show `prompt` and read the next line, `None` once input has ended
    fn read_line(&mut self, prompt: &str, output: &mut dyn Write) -> Result<Option<String>>;
}

/// Plain buffered input (pipes, files, scripted sessions)
pub struct PipedInput<R: BufRead> {
    reader: R,
}

impl<R: BufRead> PipedInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for PipedInput<R> {
    fn read_line(&mut self, prompt: &str, output: &mut dyn Write) -> Result<Option<String>> {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Line editing with history for an interactive terminal
pub struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str, output: &mut dyn Write) -> Result<Option<String>> {
        // The editor redraws only the last prompt line
        let (head, tail) = split_prompt(prompt);
        if !head.is_empty() {
            write!(output, "{}", head)?;
            output.flush()?;
        }

        match self.editor.readline(tail) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Split a prompt into the lines before its last line and the last line itself
pub fn split_prompt(prompt: &str) -> (&str, &str) {
    match prompt.rfind('\n') {
        Some(i) => prompt.split_at(i + 1),
        None => ("", prompt),
    }
}

/// Interactive lookup loop over any line source and sink
pub struct Menu<'a> {
    lookup: &'a LookupUseCase<'a>,
    max_results: usize,
}

impl<'a> Menu<'a> {
    pub fn new(lookup: &'a LookupUseCase<'a>) -> Self {
        Self {
            lookup,
            max_results: MAX_DISPLAYED_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run over buffered input
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<()> {
        self.run_with(PipedInput::new(input), output)
    }

    /// Drive the state machine until Exit or end of input
    pub fn run_with<S: LineSource, W: Write>(&self, mut input: S, mut output: W) -> Result<()> {
        let mut state = MenuState::MainMenu;
        info!("Menu session started");

        loop {
            match &state {
                MenuState::Exit => break,
                MenuState::ShowingResults { field, query } => {
                    self.show_results(*field, query, &mut output)?;
                    state = transition(&state, "").next;
                    continue;
                }
                _ => {}
            }

            let text = prompt(&state).unwrap_or_default();
            let line = match input.read_line(&text, &mut output)? {
                Some(line) => line,
                None => {
                    writeln!(output)?;
                    debug!("End of input in state {:?}", state);
                    break;
                }
            };

            let step = transition(&state, &line);
            if let Some(notice) = &step.notice {
                writeln!(output, "{}", notice)?;
            }
            state = step.next;
        }

        writeln!(output, "Goodbye!")?;
        info!("Menu session ended");
        Ok(())
    }

    fn show_results<W: Write>(&self, field: LookupField, query: &str, output: &mut W) -> Result<()> {
        let results = self.lookup.lookup(field, query)?;

        if results.is_empty() {
            writeln!(output, "No titles found for {} {:?}", field, query)?;
            return Ok(());
        }

        writeln!(output, "{} titles matched {} {:?}", results.len(), field, query)?;
        for summary in results.iter().take(self.max_results) {
            writeln!(output, "  {}", summary)?;
        }
        if results.len() > self.max_results {
            writeln!(output, "  ... and {} more", results.len() - self.max_results)?;
        }
        Ok(())
    }
}
