//! Pure event-timeline generators.
//!
//! Every generator maps `(origin, duration)` to a list of [`LightEvent`]s and
//! is deterministic. Step lengths are a fixed fraction of the duration, so a
//! longer trigger stretches the whole pattern uniformly. The returned lists
//! are not necessarily ordered by time; the timeline player sorts them.

use crate::grid::{self, GRID_SIZE};
use crate::{GridPos, LightEvent, Rgb};

/// Duration used when a trigger supplies none.
pub const DEFAULT_DURATION_MS: f64 = 800.0;

/// Fade length as a multiple of the step length.
const FADE_FACTOR: f64 = 2.0;
/// Distance a wavefront covers before early termination is allowed.
const CORE_RADIUS: usize = 7;
const MAX_STEPS: usize = 32;
/// Inclusion window around each wavefront step.
const WAVEFRONT_TOLERANCE: f64 = 0.6;

/// Steps per duration for the single-axis patterns (eight cells plus a tail).
const AXIS_STEPS: f64 = 9.0;
/// Steps per duration for the diagonal metric (largest distance is 14).
const DIAGONAL_STEPS: f64 = 15.0;
const BOUNCE_STEPS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Down, Self::Up, Self::Left, Self::Right];

    pub fn name(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn unit(self) -> (i32, i32) {
        match self {
            Self::Down => (0, 1),
            Self::Up => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    DownRight,
    DownLeft,
    UpRight,
    UpLeft,
}

impl Diagonal {
    pub const ALL: [Diagonal; 4] = [
        Self::DownRight,
        Self::DownLeft,
        Self::UpRight,
        Self::UpLeft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::DownRight => "down_right",
            Self::DownLeft => "down_left",
            Self::UpRight => "up_right",
            Self::UpLeft => "up_left",
        }
    }

    fn signs(self) -> (i32, i32) {
        match self {
            Self::DownRight => (1, 1),
            Self::DownLeft => (-1, 1),
            Self::UpRight => (1, -1),
            Self::UpLeft => (-1, -1),
        }
    }
}

/// Axis a full line travels along. `Horizontal` moves a column left/right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Self::Horizontal, Self::Vertical];

    pub fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    fn line(self, index: i32) -> impl Iterator<Item = GridPos> {
        (0..GRID_SIZE).map(move |i| match self {
            Self::Horizontal => GridPos::new(index, i),
            Self::Vertical => GridPos::new(i, index),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVariant {
    Forward,
    Reverse,
    Bounce,
    ReverseBounce,
}

impl ScanVariant {
    pub const ALL: [ScanVariant; 4] = [
        Self::Forward,
        Self::Reverse,
        Self::Bounce,
        Self::ReverseBounce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
            Self::Bounce => "bounce",
            Self::ReverseBounce => "reverse_bounce",
        }
    }

    fn sequence(self) -> Vec<i32> {
        let forward: Vec<i32> = (0..GRID_SIZE).collect();
        let reverse: Vec<i32> = (0..GRID_SIZE).rev().collect();
        match self {
            Self::Forward => forward,
            Self::Reverse => reverse,
            Self::Bounce => concat_without_boundary(forward, reverse),
            Self::ReverseBounce => concat_without_boundary(reverse, forward),
        }
    }
}

/// Joins two passes, dropping the line shared by the end of the first and
/// the start of the second.
fn concat_without_boundary(first: Vec<i32>, second: Vec<i32>) -> Vec<i32> {
    let mut out = first;
    let skip = usize::from(out.last() == second.first());
    out.extend(second.into_iter().skip(skip));
    out
}

/// Falls back to [`DEFAULT_DURATION_MS`] for absent or nonsensical durations.
pub fn effective_duration(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        duration_ms
    } else {
        DEFAULT_DURATION_MS
    }
}

/// Step length for the single-axis patterns.
pub fn axis_step(duration_ms: f64) -> f64 {
    effective_duration(duration_ms) / AXIS_STEPS
}

/// Step length for the diagonal-metric patterns.
pub fn diagonal_step(duration_ms: f64) -> f64 {
    effective_duration(duration_ms) / DIAGONAL_STEPS
}

/// `(dx + dy) + 0.5 * |dx - dy|` for non-negative offsets.
pub fn diagonal_distance(dx: i32, dy: i32) -> f64 {
    (dx + dy) as f64 + 0.5 * (dx - dy).abs() as f64
}

/// A single cell travelling from `origin` to the edge of the grid.
pub fn rain(origin: GridPos, direction: Direction, duration_ms: f64) -> Vec<LightEvent> {
    let step = axis_step(duration_ms);
    let (ux, uy) = direction.unit();
    (0..GRID_SIZE)
        .map(|k| (k, GridPos::new(origin.x + ux * k, origin.y + uy * k)))
        .take_while(|(_, pos)| pos.is_main_grid())
        .map(|(k, pos)| LightEvent::new(pos, k as f64 * step, step * FADE_FACTOR))
        .collect()
}

/// A full row or column advancing from the origin's line to the edge.
pub fn sweep(origin: GridPos, direction: Direction, duration_ms: f64) -> Vec<LightEvent> {
    let (ux, uy) = direction.unit();
    wavefront(origin, axis_step(duration_ms), |dx, dy| {
        let progress = dx * ux + dy * uy;
        (progress >= 0).then_some(progress as f64)
    })
}

/// Rounded diagonal front covering the quadrant ahead of the origin.
pub fn diagonal_sweep(origin: GridPos, diagonal: Diagonal, duration_ms: f64) -> Vec<LightEvent> {
    let (sx, sy) = diagonal.signs();
    wavefront(origin, diagonal_step(duration_ms), |dx, dy| {
        let (ax, ay) = (dx * sx, dy * sy);
        (ax >= 0 && ay >= 0).then(|| diagonal_distance(ax, ay))
    })
}

/// Rounded diagonal front expanding in every direction.
pub fn ripple(origin: GridPos, duration_ms: f64) -> Vec<LightEvent> {
    wavefront(origin, diagonal_step(duration_ms), |dx, dy| {
        Some(diagonal_distance(dx.abs(), dy.abs()))
    })
}

/// Square rings expanding from the origin.
pub fn expand(origin: GridPos, duration_ms: f64) -> Vec<LightEvent> {
    wavefront(origin, axis_step(duration_ms), |dx, dy| {
        Some(dx.abs().max(dy.abs()) as f64)
    })
}

/// Fronts running out along the origin's row and column.
pub fn cross(origin: GridPos, duration_ms: f64) -> Vec<LightEvent> {
    wavefront(origin, axis_step(duration_ms), |dx, dy| {
        (dx == 0 || dy == 0).then(|| (dx.abs() + dy.abs()) as f64)
    })
}

/// A full line running from the origin to the far edge and back to zero.
pub fn bounce(origin: GridPos, axis: Axis, duration_ms: f64) -> Vec<LightEvent> {
    let step = effective_duration(duration_ms) / BOUNCE_STEPS;
    let start = match axis {
        Axis::Horizontal => origin.x,
        Axis::Vertical => origin.y,
    };
    let outward: Vec<i32> = (start.clamp(0, GRID_SIZE - 1)..GRID_SIZE).collect();
    let back: Vec<i32> = (0..GRID_SIZE).rev().collect();
    lines(axis, &concat_without_boundary(outward, back), step)
}

/// A full line scanning the whole grid; the origin is irrelevant.
pub fn scanline(axis: Axis, variant: ScanVariant, duration_ms: f64) -> Vec<LightEvent> {
    let sequence = variant.sequence();
    let step = effective_duration(duration_ms) / sequence.len() as f64;
    lines(axis, &sequence, step)
}

/// Assigns `colors` round-robin by step index.
pub fn colorize_by_step(events: Vec<LightEvent>, step_ms: f64, colors: &[Rgb]) -> Vec<LightEvent> {
    if colors.is_empty() || step_ms <= 0.0 {
        return events;
    }
    events
        .into_iter()
        .map(|event| {
            let index = (event.time_ms / step_ms).round() as usize % colors.len();
            event.with_color(colors[index])
        })
        .collect()
}

fn lines(axis: Axis, sequence: &[i32], step: f64) -> Vec<LightEvent> {
    sequence
        .iter()
        .enumerate()
        .flat_map(|(k, &index)| {
            axis.line(index)
                .map(move |pos| LightEvent::new(pos, k as f64 * step, step * FADE_FACTOR))
        })
        .collect()
}

/// Emits every grid cell whose `metric` distance lies within the tolerance
/// window of each integer step.
fn wavefront(
    origin: GridPos,
    step_ms: f64,
    metric: impl Fn(i32, i32) -> Option<f64>,
) -> Vec<LightEvent> {
    let mut events = Vec::new();
    for step in 0..MAX_STEPS {
        let mut hit = false;
        for pos in grid::main_grid() {
            let Some(distance) = metric(pos.x - origin.x, pos.y - origin.y) else {
                continue;
            };
            if (distance - step as f64).abs() < WAVEFRONT_TOLERANCE {
                hit = true;
                events.push(LightEvent::new(
                    pos,
                    step as f64 * step_ms,
                    step_ms * FADE_FACTOR,
                ));
            }
        }
        if step > CORE_RADIUS && !hit {
            break;
        }
    }
    events
}
