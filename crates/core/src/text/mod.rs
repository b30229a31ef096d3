//! Font-based text on the 8x8 grid, either one character at a time or as a
//! scrolling banner.

use crate::grid::GRID_SIZE;
use crate::patterns::{effective_duration, Direction};
use crate::{FadeRequest, GridPos, Rgb};

/// Width of a character cell when scrolling.
const CHAR_WIDTH: i32 = 8;
/// Column of the glyph's leftmost pixel inside its 8x8 cell.
const GLYPH_LEFT: i32 = 1;

/// 5x7 glyph rows, top to bottom; bit 4 is the leftmost pixel.
type Glyph = [u8; 7];

const BLANK: Glyph = [0; 7];

fn glyph(c: char) -> Option<&'static Glyph> {
    let rows: &'static Glyph = match c.to_ascii_uppercase() {
        'A' => &[0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => &[0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => &[0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => &[0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => &[0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => &[0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => &[0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => &[0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => &[0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => &[0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => &[0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => &[0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => &[0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => &[0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => &[0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => &[0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => &[0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => &[0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => &[0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => &[0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => &[0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => &[0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => &[0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => &[0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => &[0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => &[0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => &[0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => &[0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => &[0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => &[0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => &[0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => &[0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => &[0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => &[0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => &[0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => &[0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '!' => &[0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => &[0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
        '.' => &[0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '-' => &[0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '+' => &[0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        ':' => &[0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        // heart
        '*' => &[0b00000, 0b01010, 0b11111, 0b11111, 0b01110, 0b00100, 0b00000],
        ' ' => &BLANK,
        _ => return None,
    };
    Some(rows)
}

/// Lit cells of `c` inside a single 8x8 frame. Unknown characters are blank.
pub fn char_points(c: char) -> Vec<GridPos> {
    let rows = glyph(c).unwrap_or_else(|| {
        tracing::debug!(%c, "no glyph for character, rendering blank");
        &BLANK
    });
    rows.iter()
        .enumerate()
        .flat_map(|(y, row)| {
            (0..5)
                .filter(move |col| row & (0b10000 >> col) != 0)
                .map(move |col| GridPos::new(GLYPH_LEFT + col, y as i32))
        })
        .collect()
}

pub fn is_supported(c: char) -> bool {
    glyph(c).is_some()
}

#[derive(Debug, Clone)]
enum Mode {
    /// One character per interval; `shown` is the last index drawn.
    Static { shown: Option<usize> },
    Scroll {
        direction: Direction,
        last_offset: Option<i32>,
    },
}

/// Text drawn either character by character or as a scrolling banner.
#[derive(Debug, Clone)]
pub struct TextAnimation {
    start_ms: f64,
    duration_ms: f64,
    color: Rgb,
    glyphs: Vec<Vec<GridPos>>,
    mode: Mode,
}

impl TextAnimation {
    /// Shows each character for `duration / len`.
    pub fn show(text: &str, color: Rgb, duration_ms: f64, start_ms: f64) -> Self {
        Self::build(text, color, duration_ms, start_ms, Mode::Static { shown: None })
    }

    /// Scrolls the whole string across the grid in `direction`.
    pub fn scroll(
        text: &str,
        direction: Direction,
        color: Rgb,
        duration_ms: f64,
        start_ms: f64,
    ) -> Self {
        Self::build(
            text,
            color,
            duration_ms,
            start_ms,
            Mode::Scroll {
                direction,
                last_offset: None,
            },
        )
    }

    fn build(text: &str, color: Rgb, duration_ms: f64, start_ms: f64, mode: Mode) -> Self {
        Self {
            start_ms,
            duration_ms: effective_duration(duration_ms),
            color,
            glyphs: text.chars().map(char_points).collect(),
            mode,
        }
    }

    /// Cells the banner travels before the last character has left the grid.
    pub fn scroll_distance(&self) -> i32 {
        self.glyphs.len() as i32 * CHAR_WIDTH + GRID_SIZE
    }

    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        let elapsed = now_ms - self.start_ms;
        if elapsed < 0.0 {
            return false;
        }
        if self.glyphs.is_empty() {
            return true;
        }
        let distance = self.scroll_distance();
        match &mut self.mode {
            Mode::Static { shown } => {
                let interval = self.duration_ms / self.glyphs.len() as f64;
                let index = (elapsed / interval).floor() as usize;
                if index >= self.glyphs.len() {
                    return true;
                }
                if *shown != Some(index) {
                    *shown = Some(index);
                    out.extend(
                        self.glyphs[index]
                            .iter()
                            .map(|&pos| FadeRequest::instant(pos, self.color, interval)),
                    );
                }
                false
            }
            Mode::Scroll {
                direction,
                last_offset,
            } => {
                if elapsed >= self.duration_ms {
                    return true;
                }
                let offset = (elapsed * distance as f64 / self.duration_ms).floor() as i32;
                if *last_offset == Some(offset) {
                    return false;
                }
                *last_offset = Some(offset);
                let hold = self.duration_ms / distance as f64;
                let banner = self.glyphs.len() as i32 * CHAR_WIDTH;
                for (index, points) in self.glyphs.iter().enumerate() {
                    let lead = index as i32 * CHAR_WIDTH;
                    // Later characters always sit further right or lower.
                    let shift = match direction {
                        Direction::Left | Direction::Up => lead + GRID_SIZE - offset,
                        Direction::Right | Direction::Down => lead - banner + offset,
                    };
                    out.extend(
                        points
                            .iter()
                            .map(|&pos| translate(pos, shift, *direction))
                            .filter(GridPos::is_main_grid)
                            .map(|pos| FadeRequest::instant(pos, self.color, hold)),
                    );
                }
                false
            }
        }
    }
}

/// Places a glyph point `shift` cells along the travel axis.
fn translate(pos: GridPos, shift: i32, direction: Direction) -> GridPos {
    match direction {
        Direction::Left | Direction::Right => GridPos::new(pos.x + shift, pos.y),
        Direction::Up | Direction::Down => GridPos::new(pos.x, pos.y + shift),
    }
}
