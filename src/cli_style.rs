use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// ─── Clap styles ──────────────────────────────────────────────────────────────

pub fn get_styles() -> Styles {
    let accent = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    Styles::styled()
        .usage(accent.underline())
        .header(accent.underline())
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ─── Palette ──────────────────────────────────────────────────────────────────

pub mod colors {
    use crossterm::style::Color;

    pub const GOLD: Color = Color::Rgb {
        r: 255,
        g: 200,
        b: 60,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 220,
        b: 120,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 150,
        b: 0,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 240,
        g: 240,
        b: 240,
    };
}

mod glyphs {
    pub const TOP_LEFT: &str = "╭";
    pub const TOP_RIGHT: &str = "╮";
    pub const BOTTOM_LEFT: &str = "╰";
    pub const BOTTOM_RIGHT: &str = "╯";
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const CROSS: &str = "┼";
    pub const BULLET: &str = "•";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const ELLIPSIS: &str = "…";
}

const SECTION_WIDTH: usize = 60;

// ─── Status lines ─────────────────────────────────────────────────────────────

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        glyphs::CHECK.with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        " {} {}",
        glyphs::CROSS_MARK.with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        glyphs::WARNING.with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

// ─── Sections ─────────────────────────────────────────────────────────────────

pub fn print_section_header(title: &str) {
    let title_width = title.width() + 2;
    let left = SECTION_WIDTH.saturating_sub(title_width) / 2;
    let right = SECTION_WIDTH.saturating_sub(title_width + left);

    println!();
    println!(
        "{}{} {} {}{}",
        glyphs::TOP_LEFT.with(colors::GOLD),
        glyphs::HORIZONTAL.repeat(left).with(colors::GOLD),
        title.with(colors::GOLD).bold(),
        glyphs::HORIZONTAL.repeat(right).with(colors::GOLD),
        glyphs::TOP_RIGHT.with(colors::GOLD)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        glyphs::BOTTOM_LEFT.with(colors::GOLD),
        glyphs::HORIZONTAL.repeat(SECTION_WIDTH).with(colors::GOLD),
        glyphs::BOTTOM_RIGHT.with(colors::GOLD)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        glyphs::BULLET.with(colors::GOLD),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {}",
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ─── Tables ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Cut `text` to at most `max_width` display columns, marking the cut.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width + 1 > max_width {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out.push_str(glyphs::ELLIPSIS);
    out
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    match align {
        Align::Left => format!("{}{}", text, fill),
        Align::Right => format!("{}{}", fill, text),
    }
}

pub struct TableBuilder {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    max_cell_width: usize,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        TableBuilder {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            aligns: vec![Align::Left; headers.len()],
            rows: Vec::new(),
            max_cell_width: 40,
        }
    }

    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(slot) = self.aligns.get_mut(column) {
            *slot = align;
        }
        self
    }

    pub fn max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width.max(2);
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        let cells = (0..self.headers.len())
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                truncate_to_width(cell, self.max_cell_width)
            })
            .collect();
        self.rows.push(cells);
    }

    fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| row[i].width())
                    .chain(std::iter::once(header.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn border(widths: &[usize], left: &str, join: &str, right: &str) -> String {
        let segments: Vec<String> = widths
            .iter()
            .map(|w| glyphs::HORIZONTAL.repeat(w + 2))
            .collect();
        format!("{}{}{}", left, segments.join(join), right)
    }

    fn line(&self, widths: &[usize], cells: &[String], is_header: bool) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.aligns)
            .map(|((cell, width), align)| {
                let align = if is_header { Align::Left } else { *align };
                format!(" {} ", pad(cell, *width, align))
            })
            .collect();
        format!(
            "{}{}{}",
            glyphs::VERTICAL,
            padded.join(glyphs::VERTICAL),
            glyphs::VERTICAL
        )
    }

    /// Unstyled table lines, borders included.
    pub fn render(&self) -> Vec<String> {
        let widths = self.column_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(Self::border(
            &widths,
            glyphs::TOP_LEFT,
            glyphs::T_TOP,
            glyphs::TOP_RIGHT,
        ));
        lines.push(self.line(&widths, &self.headers, true));
        lines.push(Self::border(
            &widths,
            glyphs::T_LEFT,
            glyphs::CROSS,
            glyphs::T_RIGHT,
        ));
        for row in &self.rows {
            lines.push(self.line(&widths, row, false));
        }
        lines.push(Self::border(
            &widths,
            glyphs::BOTTOM_LEFT,
            glyphs::T_BOTTOM,
            glyphs::BOTTOM_RIGHT,
        ));
        lines
    }

    pub fn print(&self) {
        let lines = self.render();
        let last = lines.len() - 1;
        for (i, line) in lines.into_iter().enumerate() {
            match i {
                1 => println!("{}", line.with(colors::GOLD).bold()),
                0 | 2 => println!("{}", line.with(colors::GOLD)),
                i if i == last => println!("{}", line.with(colors::GOLD)),
                _ => println!("{}", line.with(colors::WHITE)),
            }
        }
    }
}
