use crate::terminal::Terminal;
use crossterm::event::KeyCode;
use crossterm::style::Color;
use std::io;

/// Draw a centered, boxed help overlay into the back buffer.
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    if help_text.is_empty() {
        return;
    }

    let (width, height) = term.size();
    let lines: Vec<&str> = help_text.lines().collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines.len() + 2;

    let x0 = ((width as usize).saturating_sub(box_width) / 2) as i32;
    let y0 = ((height as usize).saturating_sub(box_height) / 2) as i32;
    let right = x0 + box_width as i32 - 1;
    let bottom = y0 + box_height as i32 - 1;
    let border = Some(Color::White);

    for x in x0 + 1..right {
        term.set(x, y0, '─', border, false);
        term.set(x, bottom, '─', border, false);
    }
    term.set(x0, y0, '┌', border, false);
    term.set(right, y0, '┐', border, false);
    term.set(x0, bottom, '└', border, false);
    term.set(right, bottom, '┘', border, false);

    for (i, line) in lines.iter().enumerate() {
        let y = y0 + 1 + i as i32;
        let padding = max_width.saturating_sub(line.chars().count());
        term.set(x0, y, '│', border, false);
        term.set_str(x0 + 1, y, &format!(" {}{} ", line, " ".repeat(padding)), Some(Color::Grey), false);
        term.set(right, y, '│', border, false);
    }
}

/// Show the overlay until `?` closes it.
/// Returns true if the user requested quit (q/Esc) while the overlay is open.
pub fn show_help_modal(term: &mut Terminal, help_text: &str) -> io::Result<bool> {
    if help_text.is_empty() {
        return Ok(false);
    }

    render_help_overlay(term, help_text);
    term.present()?;

    loop {
        if let Some(code) = term.wait_key(50)? {
            match code {
                KeyCode::Char('?') => return Ok(false),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_is_centered_and_boxed() {
        let mut term = Terminal::headless(20, 5);
        render_help_overlay(&mut term, "ab\ncdef");
        // 8 wide, 4 tall box centered in 20x5
        assert_eq!(term.get(6, 0).map(|c| c.ch), Some('┌'));
        assert_eq!(term.get(13, 0).map(|c| c.ch), Some('┐'));
        assert_eq!(term.get(6, 3).map(|c| c.ch), Some('└'));
        assert_eq!(term.get(8, 1).map(|c| c.ch), Some('a'));
        assert_eq!(term.get(8, 2).map(|c| c.ch), Some('c'));
    }
}
