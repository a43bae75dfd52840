use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::actor::Facing;
use crate::assets::Frame;
use crate::game::{Arena, Game};

const TITLE: &str = " spell-race ";
const GATE_WIDTH: f64 = 50.0;
const GATE_HEIGHT: f64 = 100.0;
/// The gate's top edge sits this far above the arena's midline.
const GATE_RISE: f64 = 25.0;
/// Offsets of the white stripes from the gate's left edge, in arena units.
const GATE_STRIPES: [(f64, f64); 2] = [(10.0, 20.0), (30.0, 40.0)];

/// Maps arena coordinates onto terminal cells of the inner area.
struct Projection {
    area: Rect,
    arena: Arena,
}

impl Projection {
    fn col(&self, x: f64) -> i32 {
        let scaled = x * f64::from(self.area.width) / self.arena.width;
        i32::from(self.area.x) + scaled.floor() as i32
    }

    fn row(&self, y: f64) -> i32 {
        let scaled = y * f64::from(self.area.height) / self.arena.height;
        i32::from(self.area.y) + scaled.floor() as i32
    }

    /// Arena x at the middle of terminal column `col`.
    fn arena_x(&self, col: i32) -> f64 {
        let offset = f64::from(col - i32::from(self.area.x)) + 0.5;
        offset * self.arena.width / f64::from(self.area.width)
    }

    fn contains(&self, col: i32, row: i32) -> bool {
        let a = self.area;
        col >= i32::from(a.x)
            && row >= i32::from(a.y)
            && col < i32::from(a.x) + i32::from(a.width)
            && row < i32::from(a.y) + i32::from(a.height)
    }

    /// One-line strip at arena height `y`, clipped to the inner area.
    fn line(&self, y: f64) -> Option<Rect> {
        let row = self.row(y);
        self.contains(i32::from(self.area.x), row).then(|| Rect {
            x: self.area.x,
            y: row as u16,
            width: self.area.width,
            height: 1,
        })
    }
}

fn put(buf: &mut Buffer, proj: &Projection, col: i32, row: i32, c: char, style: Style) {
    if !proj.contains(col, row) {
        return;
    }
    if let Some(cell) = buf.cell_mut((col as u16, row as u16)) {
        cell.set_char(c).set_style(style);
    }
}

/// Horizontal mirror of one line of text art, padded to `width` first so
/// every line of a frame flips around the same axis.
pub fn mirror_line(line: &str, width: usize) -> String {
    let padding = width.saturating_sub(line.width());
    line.chars()
        .chain(std::iter::repeat(' ').take(padding))
        .rev()
        .map(|c| match c {
            '/' => '\\',
            '\\' => '/',
            '(' => ')',
            ')' => '(',
            '<' => '>',
            '>' => '<',
            '[' => ']',
            ']' => '[',
            '{' => '}',
            '}' => '{',
            other => other,
        })
        .collect()
}

fn sprite_color(color: &str) -> Color {
    match color {
        "blue" => Color::LightBlue,
        "green" => Color::LightGreen,
        "red" => Color::LightRed,
        "yellow" => Color::LightYellow,
        _ => Color::White,
    }
}

fn render_gate(proj: &Projection, buf: &mut Buffer) {
    let arena = proj.arena;
    let left = proj.col(arena.goal_x);
    let right = proj.col(arena.goal_x + GATE_WIDTH).max(left + 1);
    let top_y = arena.height / 2.0 - GATE_RISE;
    let top = proj.row(top_y);
    let bottom = proj.row(top_y + GATE_HEIGHT).max(top + 1);

    let black = Style::default().bg(Color::Black);
    let white = Style::default().bg(Color::White);
    for col in left..right {
        let dx = proj.arena_x(col) - arena.goal_x;
        let style = if GATE_STRIPES.iter().any(|&(a, b)| dx >= a && dx < b) {
            white
        } else {
            black
        };
        for row in top..bottom {
            put(buf, proj, col, row, ' ', style);
        }
    }
}

fn render_sprite(
    proj: &Projection,
    buf: &mut Buffer,
    frame: &Frame,
    facing: Facing,
    at: (i32, i32),
    fg: Color,
) {
    let width = frame.width();
    let left = at.0 - (width / 2) as i32;
    let top = at.1 - (frame.height() / 2) as i32;
    let style = Style::default().fg(fg).add_modifier(Modifier::BOLD);

    for (dy, line) in frame.art().iter().enumerate() {
        let line = match facing {
            Facing::Right => line.clone(),
            Facing::Left => mirror_line(line, width),
        };
        for (dx, c) in line.chars().enumerate() {
            if c != ' ' {
                put(buf, proj, left + dx as i32, top + dy as i32, c, style);
            }
        }
    }
}

impl Widget for &Game {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(TITLE);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        buf.set_style(inner, Style::default().bg(Color::Green));

        let arena = *self.arena();
        let proj = Projection { area: inner, arena };
        let session = self.session();

        render_gate(&proj, buf);

        let actor = &session.actor;
        if let Some(frame) = actor.current_frame() {
            let pos = actor.position();
            render_sprite(
                &proj,
                buf,
                frame,
                actor.facing(),
                (proj.col(pos.x), proj.row(pos.y)),
                sprite_color(actor.sprites().color()),
            );
        }

        let yellow_bold = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let red_bold = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);

        if let Some(mut strip) = proj.line(arena.height / 16.0) {
            let right_edge = proj.col(arena.width * 15.0 / 16.0) - i32::from(inner.x);
            strip.width = strip.width.min(right_edge.max(0) as u16);
            let clock = format!("Time: {}", session.elapsed_secs);
            Paragraph::new(Span::styled(clock, yellow_bold))
                .alignment(Alignment::Right)
                .render(strip, buf);
        }

        let target = session.display_target();
        if let (Some(target), Some(strip)) = (target, proj.line(arena.height * 3.0 / 4.0)) {
            Paragraph::new(Span::styled(target.to_string(), yellow_bold))
                .alignment(Alignment::Center)
                .render(strip, buf);
        }

        let typed = session.matcher.typed_prefix();
        match proj.line(arena.height * 7.0 / 8.0) {
            Some(strip) if !typed.is_empty() => {
                Paragraph::new(Span::styled(typed.to_string(), red_bold))
                    .alignment(Alignment::Center)
                    .render(strip, buf);
            }
            _ => {}
        }
    }
}
