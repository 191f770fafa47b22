//! Rendering sinks. A display only ever sees a read-only frame.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use snake_engine::domain::{Board, Phase, Point};

use crate::arbiter::Role;
use crate::error::{Result, RuntimeError};
use crate::layout::{ProcessId, Snapshot};

/// Everything a display may look at for one render.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub role: Role,
    pub snapshot: &'a Snapshot,
    pub me: ProcessId,
}

pub trait Display {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Headless sink.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn render(&mut self, _frame: &Frame<'_>) -> Result<()> {
        Ok(())
    }
}

const SCREEN_WIDTH: u16 = 80;
const SCREEN_HEIGHT: u16 = 24;
const DIALOG_WIDTH: u16 = 50;
const DIALOG_HEIGHT: u16 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Body,
    Head,
    Food,
}

/// Full-screen terminal view. Raw mode and the alternate screen are held
/// for the lifetime of the value and restored on drop.
pub struct TerminalDisplay {
    out: Stdout,
    last_role: Option<Role>,
}

impl TerminalDisplay {
    pub fn enter() -> Result<Self> {
        let mut out = io::stdout();
        enable_raw_mode().map_err(RuntimeError::Terminal)?;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))
            .map_err(RuntimeError::Terminal)?;
        Ok(Self {
            out,
            last_role: None,
        })
    }

    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        if self.last_role != Some(frame.role) {
            queue!(self.out, Clear(ClearType::All))?;
            self.last_role = Some(frame.role);
        }
        match frame.role {
            Role::Settling => self.draw_settling()?,
            Role::Dormant => self.draw_waiting(frame.snapshot)?,
            Role::Active => self.draw_board(frame.snapshot, frame.me)?,
        }
        self.out.flush()
    }

    fn draw_settling(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(0, SCREEN_HEIGHT / 2),
            SetForegroundColor(Color::Cyan),
            Print(centred("Checking for active process...", SCREEN_WIDTH)),
            ResetColor
        )
    }

    fn draw_board(&mut self, snapshot: &Snapshot, me: ProcessId) -> io::Result<()> {
        let game = &snapshot.game;
        let width = Board::WIDTH as usize;

        let mut grid = vec![Cell::Empty; Board::cell_count()];
        let index = |p: Point| (p.y as usize) * width + p.x as usize;
        if Board::contains(game.food) {
            grid[index(game.food)] = Cell::Food;
        }
        for (i, &p) in game.body.iter().enumerate() {
            if Board::contains(p) {
                grid[index(p)] = if i == 0 { Cell::Head } else { Cell::Body };
            }
        }

        let border = format!("+{}+", "-".repeat(width));
        queue!(
            self.out,
            MoveTo(0, 0),
            SetForegroundColor(Color::Cyan),
            Print("========== SNAKE GAME =========="),
            ResetColor,
            Print(format!("  [{me}]")),
            MoveTo(0, 1),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "Score: {}  |  High Score: {}  |  Length: {}",
                game.score,
                game.high_score,
                game.body.len()
            )),
            MoveTo(0, 2),
            Print(&border)
        )?;

        for (row, cells) in grid.chunks(width).enumerate() {
            queue!(self.out, MoveTo(0, 3 + row as u16), Print('|'))?;
            for cell in cells {
                match cell {
                    Cell::Empty => queue!(self.out, Print(' '))?,
                    Cell::Head => queue!(
                        self.out,
                        SetForegroundColor(Color::Green),
                        Print('@'),
                        ResetColor
                    )?,
                    Cell::Body => queue!(
                        self.out,
                        SetForegroundColor(Color::DarkGreen),
                        Print('o'),
                        ResetColor
                    )?,
                    Cell::Food => queue!(
                        self.out,
                        SetForegroundColor(Color::Red),
                        Print('*'),
                        ResetColor
                    )?,
                }
            }
            queue!(self.out, Print('|'))?;
        }

        let bottom = 3 + Board::HEIGHT as u16;
        let (colour, status) = match game.phase {
            Phase::Paused => (Color::Yellow, "*** PAUSED - Press P to resume ***"),
            Phase::Over => (
                Color::Red,
                "*** GAME OVER - Press R to restart, Q to quit ***",
            ),
            Phase::Running => (
                Color::Reset,
                "Arrows/WASD: Move | P: Pause | T: Transfer | Q: Quit",
            ),
        };
        queue!(
            self.out,
            MoveTo(0, bottom),
            Print(&border),
            MoveTo(0, bottom + 1),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(colour),
            Print(status),
            ResetColor
        )
    }

    fn draw_waiting(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let inner = DIALOG_WIDTH - 2;
        let left = (SCREEN_WIDTH - DIALOG_WIDTH) / 2;
        let top = (SCREEN_HEIGHT - DIALOG_HEIGHT) / 2;
        let edge = format!("+{}+", "-".repeat(inner as usize));
        let score = format!(
            "Score: {}  |  High Score: {}",
            snapshot.game.score, snapshot.game.high_score
        );

        for row in 0..DIALOG_HEIGHT {
            queue!(self.out, MoveTo(left, top + row))?;
            if row == 0 || row == DIALOG_HEIGHT - 1 {
                queue!(
                    self.out,
                    SetForegroundColor(Color::Cyan),
                    Print(&edge),
                    ResetColor
                )?;
                continue;
            }
            let (colour, text) = match row {
                2 => (Color::Yellow, "WAITING FOR CONTROL"),
                4 => (Color::Reset, "Another process is running the game."),
                5 => (Color::Reset, score.as_str()),
                7 => (Color::White, "Press Q to quit"),
                _ => (Color::Reset, ""),
            };
            queue!(
                self.out,
                SetForegroundColor(Color::Cyan),
                Print('|'),
                SetForegroundColor(colour),
                Print(centred(text, inner)),
                SetForegroundColor(Color::Cyan),
                Print('|'),
                ResetColor
            )?;
        }
        Ok(())
    }
}

impl Display for TerminalDisplay {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.draw(frame).map_err(RuntimeError::Terminal)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.out, ResetColor, Show, LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
    }
}

fn centred(text: &str, width: u16) -> String {
    format!("{text:^width$}", width = width as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_pads_both_sides() {
        assert_eq!(centred("ab", 6), "  ab  ");
        assert_eq!(centred("WAITING FOR CONTROL", 48).len(), 48);
    }

    #[test]
    fn null_display_accepts_any_frame() {
        let snapshot = Snapshot::canonical();
        let frame = Frame {
            role: Role::Dormant,
            snapshot: &snapshot,
            me: ProcessId::from_raw(1),
        };
        NullDisplay.render(&frame).unwrap();
    }
}
