//! Operator prompts
//!
//! Workflows talk to the operator only through [`Prompter`], so the same
//! code runs against a terminal or a scripted list of answers.

use crate::domain::errors::InputError;
use crate::domain::value_objects::amount::Amount;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc;

pub trait Prompter {
    /// Show `message` and read one line of input, without the newline
    fn ask(&mut self, message: &str) -> Result<String, InputError>;

    /// Show text to the operator
    fn say(&mut self, text: &str);
}

/// What reaches [`StdinPrompter`] from the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Line(String),
    Closed,
    Interrupted,
}

/// Cancels the prompt the operator is answering, or the next one
#[derive(Debug, Clone)]
pub struct PromptCanceller(mpsc::Sender<TerminalEvent>);

impl PromptCanceller {
    pub fn cancel(&self) {
        let _ = self.0.send(TerminalEvent::Interrupted);
    }
}

/// Terminal prompter on stdin/stdout.
///
/// Lines are read on a dedicated thread so a Ctrl-C can end a pending
/// prompt without waiting for the operator to press enter.
#[derive(Debug)]
pub struct StdinPrompter {
    events: mpsc::Receiver<TerminalEvent>,
    closed: bool,
}

impl StdinPrompter {
    /// Start reading stdin
    pub fn spawn() -> (Self, PromptCanceller) {
        let (sender, events) = mpsc::channel();
        let reader = sender.clone();
        std::thread::spawn(move || read_stdin(reader));
        (Self::from_events(events), PromptCanceller(sender))
    }

    pub fn from_events(events: mpsc::Receiver<TerminalEvent>) -> Self {
        Self {
            events,
            closed: false,
        }
    }
}

fn read_stdin(events: mpsc::Sender<TerminalEvent>) {
    let mut stdin = std::io::stdin().lock();
    loop {
        let mut line = String::new();
        let event = match stdin.read_line(&mut line) {
            Ok(0) => TerminalEvent::Closed,
            Ok(_) => TerminalEvent::Line(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!("Failed to read from stdin: {}", e);
                TerminalEvent::Closed
            }
        };
        let closed = event == TerminalEvent::Closed;
        if events.send(event).is_err() || closed {
            return;
        }
    }
}

impl Prompter for StdinPrompter {
    fn ask(&mut self, message: &str) -> Result<String, InputError> {
        if self.closed {
            return Err(InputError::EndOfInput);
        }

        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{}", message);
        let _ = stdout.flush();

        match self.events.recv() {
            Ok(TerminalEvent::Line(line)) => Ok(line),
            Ok(TerminalEvent::Interrupted) => {
                println!();
                Err(InputError::Cancelled)
            }
            Ok(TerminalEvent::Closed) | Err(_) => {
                self.closed = true;
                Err(InputError::EndOfInput)
            }
        }
    }

    fn say(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[derive(Debug)]
enum Scripted {
    Answer(String),
    Cancel,
}

/// Prompter fed from a fixed list of answers; everything shown is kept
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Scripted>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().then(answers)
    }

    /// Queue more answers
    pub fn then<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers
            .extend(answers.into_iter().map(|a| Scripted::Answer(a.into())));
        self
    }

    /// The next prompt is cancelled as if by Ctrl-C
    pub fn then_cancel(mut self) -> Self {
        self.answers.push_back(Scripted::Cancel);
        self
    }

    pub fn transcript(&self) -> String {
        self.transcript.join("\n")
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, message: &str) -> Result<String, InputError> {
        self.transcript.push(message.to_string());
        match self.answers.pop_front().ok_or(InputError::EndOfInput)? {
            Scripted::Answer(answer) => {
                self.transcript.push(answer.clone());
                Ok(answer)
            }
            Scripted::Cancel => {
                self.transcript.push("^C".to_string());
                Err(InputError::Cancelled)
            }
        }
    }

    fn say(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }
}

pub fn ask_non_empty(prompter: &mut dyn Prompter, message: &str) -> Result<String, InputError> {
    let answer = prompter.ask(message)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(answer.to_string())
}

/// Coin symbol, upper-cased
pub fn ask_coin(prompter: &mut dyn Prompter) -> Result<String, InputError> {
    Ok(ask_non_empty(prompter, "Coin symbol (e.g. USDT): ")?.to_uppercase())
}

/// Number in `min..=max`
pub fn ask_choice(
    prompter: &mut dyn Prompter,
    message: &str,
    min: usize,
    max: usize,
) -> Result<usize, InputError> {
    let answer = ask_non_empty(prompter, message)?;
    let value = answer
        .parse::<usize>()
        .map_err(|_| InputError::NotANumber(answer.clone()))?;
    if value < min || value > max {
        return Err(InputError::OutOfRange { value, min, max });
    }
    Ok(value)
}

pub fn ask_amount(prompter: &mut dyn Prompter, message: &str) -> Result<Amount, InputError> {
    let answer = ask_non_empty(prompter, message)?;
    let value = answer
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber(answer.clone()))?;
    Amount::new(value).map_err(|_| InputError::NonPositiveAmount)
}

/// Only `y` confirms
pub fn confirm(prompter: &mut dyn Prompter, message: &str) -> Result<bool, InputError> {
    let answer = prompter.ask(message)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Yes unless the operator answers `n`
pub fn confirm_default_yes(prompter: &mut dyn Prompter, message: &str) -> Result<bool, InputError> {
    let answer = prompter.ask(message)?;
    Ok(!answer.trim().eq_ignore_ascii_case("n"))
}
