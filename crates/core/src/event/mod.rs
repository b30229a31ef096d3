use serde::{Deserialize, Serialize};

use crate::{GridPos, Rgb};

/// How the compositor should treat a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeMode {
    Instant,
    Standard,
    Multi,
}

/// One entry of a multi-color fade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Rgb,
    pub weight: f64,
}

impl ColorStop {
    pub fn new(color: Rgb, weight: f64) -> Self {
        Self { color, weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FadeKind {
    /// Snap to the color and hold it for the request duration.
    Instant(Rgb),
    /// Envelope from the current color towards the target and back to rest.
    Standard(Rgb),
    /// Step through weighted colors across the duration.
    Multi(Vec<ColorStop>),
}

/// A single compositor operation for one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeRequest {
    pub pos: GridPos,
    pub duration_ms: f64,
    pub kind: FadeKind,
}

impl FadeRequest {
    pub fn instant(pos: GridPos, color: Rgb, duration_ms: f64) -> Self {
        Self {
            pos,
            duration_ms,
            kind: FadeKind::Instant(color),
        }
    }

    pub fn standard(pos: GridPos, color: Rgb, duration_ms: f64) -> Self {
        Self {
            pos,
            duration_ms,
            kind: FadeKind::Standard(color),
        }
    }

    pub fn multi(pos: GridPos, stops: Vec<ColorStop>, duration_ms: f64) -> Self {
        Self {
            pos,
            duration_ms,
            kind: FadeKind::Multi(stops),
        }
    }

    /// Builds a single-color request of the given mode.
    pub fn with_mode(pos: GridPos, color: Rgb, duration_ms: f64, mode: FadeMode) -> Self {
        match mode {
            FadeMode::Instant => Self::instant(pos, color, duration_ms),
            FadeMode::Standard => Self::standard(pos, color, duration_ms),
            FadeMode::Multi => Self::multi(pos, vec![ColorStop::new(color, 1.0)], duration_ms),
        }
    }

    pub fn mode(&self) -> FadeMode {
        match self.kind {
            FadeKind::Instant(_) => FadeMode::Instant,
            FadeKind::Standard(_) => FadeMode::Standard,
            FadeKind::Multi(_) => FadeMode::Multi,
        }
    }

    /// Whether the compositor can apply this request at all.
    pub fn is_valid(&self) -> bool {
        let stops_ok = match &self.kind {
            FadeKind::Multi(stops) => {
                !stops.is_empty()
                    && stops
                        .iter()
                        .all(|stop| stop.weight.is_finite() && stop.weight >= 0.0)
                    && stops.iter().map(|stop| stop.weight).sum::<f64>() > 0.0
            }
            _ => true,
        };
        self.pos.is_valid()
            && self.duration_ms.is_finite()
            && self.duration_ms >= 0.0
            && stops_ok
    }
}

/// A timed color change produced by a pattern generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightEvent {
    pub pos: GridPos,
    /// Offset from the animation start.
    pub time_ms: f64,
    pub fade_ms: f64,
    pub color: Option<Rgb>,
    pub mode: Option<FadeMode>,
}

impl LightEvent {
    pub fn new(pos: GridPos, time_ms: f64, fade_ms: f64) -> Self {
        Self {
            pos,
            time_ms,
            fade_ms,
            color: None,
            mode: None,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_mode(mut self, mode: FadeMode) -> Self {
        self.mode = Some(mode);
        self
    }
}
