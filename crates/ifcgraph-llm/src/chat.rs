//! The question/answer loop.
//!
//! Each question walks
//! `AwaitInput -> Synthesizing -> Executing -> Formatting -> Done`, leaving
//! early for `Done` when the query returns no rows and for `Error` when the
//! schema read, query synthesis or query execution fails. Both terminal states
//! go back to waiting for input.

use std::collections::VecDeque;
use std::io::Write;

use ifcgraph_graph::{execute_query, introspect, GraphStore};

use crate::client::CompletionClient;
use crate::formatter::{ResponseFormatter, NO_DATA_MESSAGE};
use crate::synthesizer::{llm_error_message, QuerySynthesizer};

const QUIT_TOKENS: [&str; 3] = ["quit", "exit", "bye"];

pub const PROMPT: &str = "You: ";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("input error: {0}")]
    Input(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    AwaitInput,
    Synthesizing,
    Executing,
    Formatting,
    Done,
    Error,
}

/// Progress of a question, reported while it is being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent<'a> {
    Entered(ChatState),
    QueryGenerated(&'a str),
    RowsReturned(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answer(String),
    NoData,
    /// Human-readable failure text; the loop keeps going.
    Failed(String),
}

impl TurnOutcome {
    pub fn message(&self) -> &str {
        match self {
            TurnOutcome::Answer(text) | TurnOutcome::Failed(text) => text,
            TurnOutcome::NoData => NO_DATA_MESSAGE,
        }
    }
}

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    /// The generated query, when synthesis succeeded.
    pub query: Option<String>,
    pub rows: Option<usize>,
    pub outcome: TurnOutcome,
    /// States visited, starting with `Synthesizing`.
    pub states: Vec<ChatState>,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    Quit,
    EndOfInput,
    Interrupted,
}

// ============================================================================
// Input and output seams
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Interrupted,
    Eof,
}

/// Where questions come from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, ChatError>;
}

/// Replays queued input, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::new(lines.into_iter().map(|l| InputEvent::Line(l.into())))
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<InputEvent, ChatError> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::Eof))
    }
}

/// Where progress and answers go.
pub trait ChatOutput {
    fn event(&mut self, event: &ChatEvent<'_>) -> std::io::Result<()>;

    fn answer(&mut self, turn: &ChatTurn) -> std::io::Result<()>;

    fn farewell(&mut self) -> std::io::Result<()>;
}

/// Uncoloured line output.
pub struct PlainOutput<W> {
    out: W,
}

impl<W: Write> PlainOutput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChatOutput for PlainOutput<W> {
    fn event(&mut self, event: &ChatEvent<'_>) -> std::io::Result<()> {
        match event {
            ChatEvent::Entered(ChatState::Synthesizing) => writeln!(self.out, "Bot: Generating query..."),
            ChatEvent::QueryGenerated(query) => writeln!(self.out, "Generated query: {query}"),
            ChatEvent::RowsReturned(rows) => writeln!(self.out, "Query returned {rows} results"),
            ChatEvent::Entered(_) => Ok(()),
        }
    }

    fn answer(&mut self, turn: &ChatTurn) -> std::io::Result<()> {
        writeln!(self.out, "Bot: {}", turn.outcome.message())
    }

    fn farewell(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "Goodbye!")
    }
}

struct Silent;

impl ChatOutput for Silent {
    fn event(&mut self, _event: &ChatEvent<'_>) -> std::io::Result<()> {
        Ok(())
    }

    fn answer(&mut self, _turn: &ChatTurn) -> std::io::Result<()> {
        Ok(())
    }

    fn farewell(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn is_quit_token(input: &str) -> bool {
    let input = input.trim();
    QUIT_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(input))
}

// ============================================================================
// Session
// ============================================================================

/// One graph connection and one completion client, borrowed for the
/// lifetime of the conversation.
pub struct ChatSession<'a> {
    store: &'a dyn GraphStore,
    client: &'a dyn CompletionClient,
}

struct Turn {
    question: String,
    query: Option<String>,
    rows: Option<usize>,
    states: Vec<ChatState>,
}

impl Turn {
    fn enter<O: ChatOutput + ?Sized>(&mut self, state: ChatState, out: &mut O) -> std::io::Result<()> {
        self.states.push(state);
        out.event(&ChatEvent::Entered(state))
    }

    fn finish(self, outcome: TurnOutcome) -> ChatTurn {
        ChatTurn {
            question: self.question,
            query: self.query,
            rows: self.rows,
            outcome,
            states: self.states,
        }
    }
}

impl<'a> ChatSession<'a> {
    pub fn new(store: &'a dyn GraphStore, client: &'a dyn CompletionClient) -> Self {
        Self { store, client }
    }

    /// Answer one question.
    pub async fn ask(&self, question: &str) -> ChatTurn {
        match self.ask_with(question, &mut Silent).await {
            Ok(turn) => turn,
            // Silent output never fails.
            Err(err) => ChatTurn {
                question: question.to_string(),
                query: None,
                rows: None,
                outcome: TurnOutcome::Failed(err.to_string()),
                states: vec![ChatState::Error],
            },
        }
    }

    /// Answer one question, reporting progress to `out`.
    ///
    /// Only output failures are errors; everything that goes wrong while
    /// answering ends up in [`TurnOutcome::Failed`].
    pub async fn ask_with<O: ChatOutput + ?Sized>(
        &self,
        question: &str,
        out: &mut O,
    ) -> Result<ChatTurn, ChatError> {
        let mut turn = Turn {
            question: question.to_string(),
            query: None,
            rows: None,
            states: Vec::new(),
        };

        turn.enter(ChatState::Synthesizing, out)?;
        let schema = match introspect(self.store).await {
            Ok(schema) => schema,
            Err(err) => {
                tracing::warn!(error = %err, "schema introspection failed");
                turn.enter(ChatState::Error, out)?;
                return Ok(turn.finish(TurnOutcome::Failed(format!(
                    "Error reading graph schema: {err}"
                ))));
            }
        };

        let query = match QuerySynthesizer::new(self.client)
            .synthesize(&schema, question)
            .await
        {
            Ok(query) => query,
            Err(err) => {
                tracing::warn!(error = %err, "query synthesis failed");
                turn.enter(ChatState::Error, out)?;
                return Ok(turn.finish(TurnOutcome::Failed(llm_error_message(&err))));
            }
        };
        out.event(&ChatEvent::QueryGenerated(&query))?;
        turn.query = Some(query.clone());

        turn.enter(ChatState::Executing, out)?;
        let records = match execute_query(self.store, &query).await {
            Ok(records) => records,
            Err(err) => {
                turn.enter(ChatState::Error, out)?;
                return Ok(turn.finish(TurnOutcome::Failed(format!(
                    "Error executing query: {err}"
                ))));
            }
        };
        out.event(&ChatEvent::RowsReturned(records.len()))?;
        turn.rows = Some(records.len());

        if records.is_empty() {
            turn.enter(ChatState::Done, out)?;
            return Ok(turn.finish(TurnOutcome::NoData));
        }

        turn.enter(ChatState::Formatting, out)?;
        match ResponseFormatter::new(self.client).format(question, &records).await {
            Ok(answer) => {
                turn.enter(ChatState::Done, out)?;
                Ok(turn.finish(TurnOutcome::Answer(answer)))
            }
            Err(err) => {
                tracing::warn!(error = %err, "answer formatting failed");
                turn.enter(ChatState::Error, out)?;
                Ok(turn.finish(TurnOutcome::Failed(llm_error_message(&err))))
            }
        }
    }

    /// Read questions until a quit token, end of input or an interrupt.
    ///
    /// Ctrl-C while a question is in flight abandons it and ends the loop.
    pub async fn run<I, O>(&self, input: &mut I, out: &mut O) -> Result<ChatExit, ChatError>
    where
        I: LineSource + ?Sized,
        O: ChatOutput + ?Sized,
    {
        loop {
            let line = match input.read_line(PROMPT)? {
                InputEvent::Line(line) => line,
                InputEvent::Eof => {
                    out.farewell()?;
                    return Ok(ChatExit::EndOfInput);
                }
                InputEvent::Interrupted => {
                    out.farewell()?;
                    return Ok(ChatExit::Interrupted);
                }
            };

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_quit_token(question) {
                out.farewell()?;
                return Ok(ChatExit::Quit);
            }

            let turn = tokio::select! {
                turn = self.ask_with(question, &mut *out) => Some(turn?),
                _ = tokio::signal::ctrl_c() => None,
            };

            match turn {
                Some(turn) => out.answer(&turn)?,
                None => {
                    tracing::info!("interrupted while answering");
                    out.farewell()?;
                    return Ok(ChatExit::Interrupted);
                }
            }
        }
    }
}
