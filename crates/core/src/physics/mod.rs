use rand::{Rng, RngCore};

use crate::grid::GRID_SIZE;
use crate::patterns::{effective_duration, Direction};
use crate::{FadeRequest, GridPos, Rgb};

/// Duration the random ranges below are tuned for; they scale with the
/// effective duration relative to it.
pub const BASE_DURATION_MS: f64 = 1_000.0;
const MAX_START_DELAY_MS: f64 = 350.0;
const MIN_SPEED_MS: f64 = 35.0;
const MAX_SPEED_MS: f64 = 75.0;
/// Fade length as a multiple of a line's per-cell speed.
const FADE_FACTOR: f64 = 4.0;
const LAST_INDEX: i32 = GRID_SIZE - 1;

#[derive(Debug, Clone, PartialEq)]
struct Line {
    delay_ms: f64,
    speed_ms: f64,
    last_index: i32,
}

/// Eight independently timed lines falling across the grid.
#[derive(Debug, Clone)]
pub struct PhysicsSweep {
    start_ms: f64,
    direction: Direction,
    color: Rgb,
    lines: Vec<Line>,
}

impl PhysicsSweep {
    pub fn new(
        direction: Direction,
        color: Rgb,
        duration_ms: f64,
        start_ms: f64,
        rng: &mut dyn RngCore,
    ) -> Self {
        let factor = effective_duration(duration_ms) / BASE_DURATION_MS;
        let lines = (0..GRID_SIZE)
            .map(|_| Line {
                delay_ms: rng.gen_range(0.0..MAX_START_DELAY_MS) * factor,
                speed_ms: rng.gen_range(MIN_SPEED_MS..MAX_SPEED_MS) * factor,
                last_index: -1,
            })
            .collect();
        Self {
            start_ms,
            direction,
            color,
            lines,
        }
    }

    fn cell(&self, line: i32, index: i32) -> GridPos {
        match self.direction {
            Direction::Down => GridPos::new(line, index),
            Direction::Up => GridPos::new(line, LAST_INDEX - index),
            Direction::Right => GridPos::new(index, line),
            Direction::Left => GridPos::new(LAST_INDEX - index, line),
        }
    }

    /// Dispatches each cell a line has newly crossed. Returns `true` once
    /// every line has run past the last cell.
    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        let elapsed = now_ms - self.start_ms;
        let mut finished = true;
        for line in 0..self.lines.len() {
            let Line {
                delay_ms,
                speed_ms,
                last_index,
            } = self.lines[line];
            let line_elapsed = elapsed - delay_ms;
            if line_elapsed < 0.0 {
                finished = false;
                continue;
            }
            let current = (line_elapsed / speed_ms).floor() as i32;
            let reached = current.min(LAST_INDEX);
            for index in (last_index + 1)..=reached {
                out.push(FadeRequest::standard(
                    self.cell(line as i32, index),
                    self.color,
                    speed_ms * FADE_FACTOR,
                ));
            }
            self.lines[line].last_index = last_index.max(reached);
            if current <= LAST_INDEX {
                finished = false;
            }
        }
        finished
    }
}
