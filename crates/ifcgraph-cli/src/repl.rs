//! Terminal side of the chat loop: rustyline input and coloured output.

use std::io::Write;

use colored::Colorize;
use ifcgraph_llm::{
    ChatError, ChatEvent, ChatOutput, ChatState, ChatTurn, InputEvent, LineSource, TurnOutcome,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub struct RustylineInput {
    editor: DefaultEditor,
}

impl RustylineInput {
    pub fn new() -> Result<Self, ChatError> {
        let editor =
            DefaultEditor::new().map_err(|e| ChatError::Input(format!("failed to init rustyline: {e}")))?;
        Ok(Self { editor })
    }
}

impl LineSource for RustylineInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, ChatError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor
                        .add_history_entry(line.trim())
                        .map_err(|e| ChatError::Input(format!("failed to record history: {e}")))?;
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(e) => Err(ChatError::Input(format!("readline error: {e}"))),
        }
    }
}

/// Chat transcript on a terminal.
pub struct ColoredOutput<W> {
    out: W,
}

impl<W: Write> ColoredOutput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ChatOutput for ColoredOutput<W> {
    fn event(&mut self, event: &ChatEvent<'_>) -> std::io::Result<()> {
        match event {
            ChatEvent::Entered(ChatState::Synthesizing) => {
                writeln!(self.out, "{} Generating query...", "Bot:".cyan().bold())
            }
            ChatEvent::QueryGenerated(query) => {
                writeln!(self.out, "{} {}", "Generated query:".dimmed(), query.yellow())
            }
            ChatEvent::RowsReturned(rows) => {
                writeln!(self.out, "{}", format!("Query returned {rows} results").dimmed())
            }
            ChatEvent::Entered(_) => Ok(()),
        }
    }

    fn answer(&mut self, turn: &ChatTurn) -> std::io::Result<()> {
        let message = match &turn.outcome {
            TurnOutcome::Failed(text) => text.red().to_string(),
            outcome => outcome.message().to_string(),
        };
        writeln!(self.out, "{} {message}\n", "Bot:".cyan().bold())
    }

    fn farewell(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "{}", "Goodbye!".green())
    }
}
