//! Terminal output through crossterm.
//!
//! The [`Driver`] only writes escape sequences; raw mode is a process-wide
//! switch owned by the app's terminal guard. Writing to any `io::Write`
//! lets tests capture output in a `Vec<u8>`.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};

use super::compositor::CellUpdate;
use super::strip::CellStyle;

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Buffered terminal writer.
pub struct Driver<W: Write = BufWriter<Stdout>> {
    writer: W,
    mouse: bool,
    entered: bool,
}

impl Driver {
    /// A driver on stdout.
    pub fn stdout() -> Self {
        Self::with_writer(BufWriter::new(io::stdout()))
    }

    /// Current terminal size as `(columns, rows)`.
    pub fn terminal_size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl<W: Write> Driver<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer, mouse: false, entered: false }
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Switch to the alternate screen, hide the cursor and optionally turn on
    /// mouse reporting (SGR mode, via crossterm).
    pub fn enter(&mut self, mouse: bool) -> io::Result<()> {
        queue!(self.writer, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        if mouse {
            queue!(self.writer, EnableMouseCapture)?;
        }
        self.mouse = mouse;
        self.entered = true;
        self.writer.flush()
    }

    /// Undo [`enter`](Self::enter). Safe to call more than once.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        if self.mouse {
            queue!(self.writer, DisableMouseCapture)?;
        }
        queue!(self.writer, ResetColor, cursor::Show, LeaveAlternateScreen)?;
        self.entered = false;
        self.mouse = false;
        self.writer.flush()
    }

    pub fn set_title(&mut self, title: &str) -> io::Result<()> {
        queue!(self.writer, SetTitle(title))?;
        self.writer.flush()
    }

    /// Queue the changed cells and flush them.
    pub fn apply_updates(&mut self, updates: &[CellUpdate]) -> io::Result<()> {
        for update in updates {
            queue!(self.writer, cursor::MoveTo(update.x, update.y))?;
            self.apply_cell_style(&update.cell.style)?;
            queue!(
                self.writer,
                Print(update.cell.ch),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
        self.writer.flush()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn apply_cell_style(&mut self, style: &CellStyle) -> io::Result<()> {
        if let Some(color) = style.fg.as_deref().and_then(parse_color) {
            queue!(self.writer, SetForegroundColor(color))?;
        }
        if let Some(color) = style.bg.as_deref().and_then(parse_color) {
            queue!(self.writer, SetBackgroundColor(color))?;
        }
        if style.bold {
            queue!(self.writer, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(self.writer, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(self.writer, SetAttribute(Attribute::Underlined))?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for Driver<W> {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ---------------------------------------------------------------------------
// Color parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb`, `#rgb`, an ANSI index (`0`..`255`) or a color name.
/// Unknown values yield `None` and the cell keeps the terminal default.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Ok(index) = s.parse::<u8>() {
        return Some(Color::AnsiValue(index));
    }
    let color = match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "default" | "reset" => Color::Reset,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "dark_red" | "darkred" => Color::DarkRed,
        "dark_green" | "darkgreen" => Color::DarkGreen,
        "dark_yellow" | "darkyellow" => Color::DarkYellow,
        "dark_blue" | "darkblue" => Color::DarkBlue,
        "dark_magenta" | "darkmagenta" => Color::DarkMagenta,
        "dark_cyan" | "darkcyan" => Color::DarkCyan,
        "dark_grey" | "dark_gray" | "darkgrey" | "darkgray" => Color::DarkGrey,
        "grey" | "gray" => Color::Grey,
        _ => return None,
    };
    Some(color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
        }),
        // #abc is #aabbcc
        3 => Some(Color::Rgb {
            r: channel(&hex[0..1])? * 17,
            g: channel(&hex[1..2])? * 17,
            b: channel(&hex[2..3])? * 17,
        }),
        _ => None,
    }
}
