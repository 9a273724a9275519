//! Terminal table rendering
//!
//! Builds the "CAN Messages" table as plain text, then draws it on a cleared
//! screen with crossterm.

use crate::history::History;
use crossterm::{cursor, style, terminal, QueueableCommand};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

pub const TITLE: &str = "CAN Messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

struct Column {
    header: &'static str,
    align: Align,
}

const COLUMNS: [Column; 3] = [
    Column { header: "ID", align: Align::Right },
    Column { header: "Timestamp", align: Align::Right },
    Column { header: "Data", align: Align::Left },
];

/// Render the history as a boxed table, oldest entry first
pub fn render_table(history: &History) -> String {
    let rows: Vec<[String; 3]> = history
        .iter()
        .map(|entry| [entry.id.clone(), entry.timestamp.clone(), entry.data_string()])
        .collect();

    let mut widths = COLUMNS.map(|col| col.header.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    // Two spaces of padding plus one separator per column, plus the closing border
    let table_width: usize = widths.iter().map(|w| w + 3).sum::<usize>() + 1;

    let mut out = String::new();
    out.push_str(&center(TITLE, table_width));
    out.push('\n');
    out.push_str(&border(&widths, '┏', '━', '┳', '┓'));

    let headers = COLUMNS.map(|col| col.header.to_string());
    out.push_str(&line(&headers, &widths, '┃'));
    out.push_str(&border(&widths, '┡', '━', '╇', '┩'));

    for row in &rows {
        out.push_str(&line(row, &widths, '│'));
    }
    out.push_str(&border(&widths, '└', '─', '┴', '┘'));

    out
}

/// Clear the screen and draw the table at the top-left corner
pub fn draw<W: Write>(out: &mut W, history: &History) -> io::Result<()> {
    out.queue(cursor::MoveTo(0, 0))?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    for text_line in render_table(history).lines() {
        out.queue(style::Print(text_line))?;
        out.queue(style::Print("\r\n"))?;
    }
    out.flush()
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn border(widths: &[usize; 3], left: char, fill: char, join: char, right: char) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("{}{}{}\n", left, segments.join(&join.to_string()), right)
}

fn line(cells: &[String; 3], widths: &[usize; 3], edge: char) -> String {
    let mut out = String::new();
    for ((cell, width), column) in cells.iter().zip(widths).zip(&COLUMNS) {
        out.push(edge);
        out.push(' ');
        out.push_str(&pad(cell, *width, column.align));
        out.push(' ');
    }
    out.push(edge);
    out.push('\n');
    out
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match align {
        Align::Left => format!("{}{}", cell, fill),
        Align::Right => format!("{}{}", fill, cell),
    }
}
