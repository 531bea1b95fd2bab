//! ASCII rendering of a [`Snapshot`] into a terminal.

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use particle_common::Snapshot;
use std::io::{self, Stdout, Write};
use std::time::Duration;

/// Glyph per particle type.
pub const TYPE_GLYPHS: [char; 3] = ['o', '*', '+'];
/// Foreground colour per particle type.
pub const TYPE_COLORS: [Color; 3] = [Color::Red, Color::Green, Color::Blue];
/// Background of a particle inside its highlight window.
pub const HIGHLIGHT_BACKGROUND: Color = Color::DarkYellow;

/// One occupied character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
    pub highlighted: bool,
}

/// A width x height grid of cells, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].as_ref()
        } else {
            None
        }
    }

    fn row(&self, y: usize) -> &[Option<Cell>] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// The frame as plain text, one line per row, without colours.
    pub fn to_plain_string(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            out.extend(self.row(y).iter().map(|c| c.map_or(' ', |c| c.glyph)));
            out.push('\n');
        }
        out
    }
}

/// Places every particle of the snapshot on a character grid.
///
/// A particle lands on the cell under `floor(position)`; particles outside the grid are
/// skipped and, when several share a cell, the last one in store order is drawn.
pub fn compose_frame(snapshot: &Snapshot) -> Frame {
    let width = snapshot.width as usize;
    let height = snapshot.height as usize;
    let mut cells = vec![None; width * height];

    for p in &snapshot.particles {
        let (x, y) = (p.position.x.floor(), p.position.y.floor());
        if x < 0.0 || y < 0.0 {
            continue;
        }
        let (gx, gy) = (x as usize, y as usize);
        if gx >= width || gy >= height {
            continue;
        }
        let slot = p.type_id % TYPE_GLYPHS.len();
        cells[gy * width + gx] = Some(Cell {
            glyph: TYPE_GLYPHS[slot],
            color: TYPE_COLORS[slot],
            highlighted: p.highlighted,
        });
    }

    Frame { width, height, cells }
}

/// What the user asked for from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Reset,
    TogglePause,
}

/// Maps a key to a command, ignoring everything else.
pub fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reset),
        KeyCode::Char(' ') => Some(Command::TogglePause),
        _ => None,
    }
}

/// Current terminal size as (columns, rows).
pub fn terminal_size() -> Result<(u16, u16)> {
    terminal::size().context("failed to query terminal size")
}

/// Owns the terminal for the duration of a live run: raw mode, alternate screen and a
/// hidden cursor, all restored on drop.
pub struct TerminalSession {
    stdout: Stdout,
}

impl TerminalSession {
    pub fn start() -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))
            .context("failed to enter alternate screen")?;
        Ok(Self { stdout })
    }

    /// Draws a full frame from the top-left corner.
    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        for y in 0..frame.height() {
            queue!(self.stdout, MoveTo(0, y as u16))?;
            for cell in frame.row(y) {
                match cell {
                    Some(c) => {
                        if c.highlighted {
                            queue!(self.stdout, SetBackgroundColor(HIGHLIGHT_BACKGROUND))?;
                        }
                        queue!(self.stdout, SetForegroundColor(c.color), Print(c.glyph), ResetColor)?;
                    }
                    None => queue!(self.stdout, Print(' '))?,
                }
            }
        }
        self.stdout.flush().context("failed to flush frame")?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press and translates it.
    pub fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>> {
        if !event::poll(timeout).context("failed to poll terminal events")? {
            return Ok(None);
        }
        match event::read().context("failed to read terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(command_for(key.code)),
            _ => Ok(None),
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.stdout, ResetColor, Show, LeaveAlternateScreen) {
            log::error!("failed to leave alternate screen: {}", err);
        }
        if let Err(err) = terminal::disable_raw_mode() {
            log::error!("failed to disable raw mode: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_common::{ParticleView, Vec2};

    fn view(x: f32, y: f32, type_id: usize, highlighted: bool) -> ParticleView {
        ParticleView { position: Vec2::new(x, y), type_id, highlighted }
    }

    fn snapshot(width: u32, height: u32, particles: Vec<ParticleView>) -> Snapshot {
        Snapshot { tick: 0, width, height, particles }
    }

    #[test]
    fn particles_land_on_their_floor_cell() {
        let frame = compose_frame(&snapshot(
            4,
            2,
            vec![view(0.2, 0.9, 0, false), view(3.99, 1.5, 1, false), view(2.0, 0.0, 2, true)],
        ));
        assert_eq!(frame.to_plain_string(), "o + \n   *\n");
        assert_eq!(frame.cell(2, 0).map(|c| c.highlighted), Some(true));
        assert_eq!(frame.cell(3, 1).map(|c| c.color), Some(Color::Green));
        assert_eq!(frame.cell(1, 1), None);
    }

    #[test]
    fn last_particle_wins_a_shared_cell() {
        let frame = compose_frame(&snapshot(2, 1, vec![view(1.1, 0.1, 0, false), view(1.7, 0.6, 2, false)]));
        assert_eq!(frame.cell(1, 0).map(|c| c.glyph), Some('+'));
    }

    #[test]
    fn out_of_grid_particles_are_skipped() {
        let frame = compose_frame(&snapshot(
            3,
            3,
            vec![view(-0.5, 1.0, 0, false), view(3.0, 1.0, 0, false), view(1.0, 9.0, 0, false)],
        ));
        assert_eq!(frame.to_plain_string(), "   \n   \n   \n");
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(command_for(KeyCode::Char('q')), Some(Command::Quit));
        assert_eq!(command_for(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(command_for(KeyCode::Char('r')), Some(Command::Reset));
        assert_eq!(command_for(KeyCode::Char(' ')), Some(Command::TogglePause));
        assert_eq!(command_for(KeyCode::Char('x')), None);
    }
}
