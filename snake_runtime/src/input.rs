//! Keyboard commands and the sources that produce them.

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use snake_engine::domain::Heading;

use crate::error::{Result, RuntimeError};

/// A decoded key. Role changes go to the arbiter, the rest to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Turn(Heading),
    TogglePause,
    Reset,
    /// Hand the Active role to the other process.
    Relinquish,
    Quit,
}

impl Command {
    /// Single-character tokens, case-insensitive. Anything else is `None`.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(Command::Turn(Heading::Up)),
            's' => Some(Command::Turn(Heading::Down)),
            'a' => Some(Command::Turn(Heading::Left)),
            'd' => Some(Command::Turn(Heading::Right)),
            'p' => Some(Command::TogglePause),
            'r' => Some(Command::Reset),
            't' => Some(Command::Relinquish),
            'q' => Some(Command::Quit),
            _ => None,
        }
    }

    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        match (key.code, key.modifiers) {
            // Raw mode swallows SIGINT; Ctrl-C arrives as a key.
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
            (KeyCode::Up, _) => Some(Command::Turn(Heading::Up)),
            (KeyCode::Down, _) => Some(Command::Turn(Heading::Down)),
            (KeyCode::Left, _) => Some(Command::Turn(Heading::Left)),
            (KeyCode::Right, _) => Some(Command::Turn(Heading::Right)),
            (KeyCode::Char(c), _) => Self::from_char(c),
            _ => None,
        }
    }
}

/// Non-blocking command source, drained once per loop tick.
pub trait InputSource {
    /// Everything available right now; empty when nothing is pending.
    fn poll(&mut self) -> Result<Vec<Command>>;
}

/// Keys from the controlling terminal. Expects raw mode to be enabled
/// by the display.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while event::poll(Duration::ZERO).map_err(RuntimeError::Terminal)? {
            let Event::Key(key) = event::read().map_err(RuntimeError::Terminal)? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match Command::from_key(&key) {
                Some(command) => commands.push(command),
                None => tracing::trace!(code = ?key.code, "ignored key"),
            }
        }
        Ok(commands)
    }
}

/// Queued commands for tests and headless runs.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pending: VecDeque<Command>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a key script; unknown characters are skipped like unknown keys.
    pub fn from_keys(keys: &str) -> Self {
        Self {
            pending: keys.chars().filter_map(Command::from_char).collect(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Result<Vec<Command>> {
        Ok(self.pending.drain(..).collect())
    }
}
