use std::fmt;
use std::sync::Arc;

use crate::{FadeMode, FadeRequest, LightEvent, Rgb};

/// Custom per-event dispatch for composite or multi-color effects.
pub type DispatchFn = Arc<dyn Fn(&LightEvent, &mut Vec<FadeRequest>)>;

/// How a due [`LightEvent`] turns into fade requests.
#[derive(Clone)]
pub enum Dispatch {
    /// One request per event. Per-event overrides win over these defaults.
    Fade { color: Rgb, mode: FadeMode },
    Custom(DispatchFn),
}

impl Dispatch {
    pub fn standard(color: Rgb) -> Self {
        Self::Fade {
            color,
            mode: FadeMode::Standard,
        }
    }

    pub fn custom(f: impl Fn(&LightEvent, &mut Vec<FadeRequest>) + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    fn emit(&self, event: &LightEvent, out: &mut Vec<FadeRequest>) {
        match self {
            Self::Fade { color, mode } => out.push(FadeRequest::with_mode(
                event.pos,
                event.color.unwrap_or(*color),
                event.fade_ms,
                event.mode.unwrap_or(*mode),
            )),
            Self::Custom(f) => f(event, out),
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fade { color, mode } => f
                .debug_struct("Fade")
                .field("color", color)
                .field("mode", mode)
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Plays a finite, precomputed list of events against the clock.
#[derive(Debug, Clone)]
pub struct TimelinePlayer {
    events: Vec<LightEvent>,
    next_event: usize,
    start_ms: f64,
    dispatch: Dispatch,
}

impl TimelinePlayer {
    pub fn new(mut events: Vec<LightEvent>, start_ms: f64, dispatch: Dispatch) -> Self {
        events.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        Self {
            events,
            next_event: 0,
            start_ms,
            dispatch,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.next_event
    }

    /// Dispatches every event that has come due and reports whether the
    /// whole list has been consumed. The cursor never moves backwards, so a
    /// repeated or earlier `now` dispatches nothing.
    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        let elapsed = now_ms - self.start_ms;
        while let Some(event) = self.events.get(self.next_event) {
            if event.time_ms > elapsed {
                break;
            }
            self.dispatch.emit(event, out);
            self.next_event += 1;
        }
        self.next_event == self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorStop, FadeKind, GridPos};

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn events() -> Vec<LightEvent> {
        // Deliberately out of order.
        vec![
            LightEvent::new(GridPos::new(2, 0), 200.0, 50.0),
            LightEvent::new(GridPos::new(0, 0), 0.0, 50.0),
            LightEvent::new(GridPos::new(1, 0), 100.0, 50.0),
        ]
    }

    #[test]
    fn dispatches_each_event_once_in_time_order() {
        let mut player = TimelinePlayer::new(events(), 1_000.0, Dispatch::standard(RED));
        let mut out = Vec::new();

        assert!(!player.update(1_050.0, &mut out));
        assert_eq!(out.len(), 1);
        assert!(!player.update(1_050.0, &mut out));
        assert!(!player.update(1_010.0, &mut out));
        assert!(!player.update(900.0, &mut out));
        assert_eq!(out.len(), 1);

        assert!(player.update(1_250.0, &mut out));
        let xs: Vec<i32> = out.iter().map(|r| r.pos.x).collect();
        assert_eq!(xs, vec![0, 1, 2]);
        assert!(out.iter().all(|r| r.kind == FadeKind::Standard(RED)));

        assert!(player.update(5_000.0, &mut out));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn empty_timeline_finishes_immediately() {
        let mut player = TimelinePlayer::new(Vec::new(), 0.0, Dispatch::standard(RED));
        let mut out = Vec::new();
        assert!(player.update(0.0, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn per_event_overrides_win() {
        let blue = Rgb::new(0, 0, 255);
        let event = LightEvent::new(GridPos::new(4, 4), 0.0, 30.0)
            .with_color(blue)
            .with_mode(FadeMode::Instant);
        let mut player = TimelinePlayer::new(vec![event], 0.0, Dispatch::standard(RED));
        let mut out = Vec::new();
        player.update(0.0, &mut out);
        assert_eq!(out[0], FadeRequest::instant(GridPos::new(4, 4), blue, 30.0));
    }

    #[test]
    fn custom_dispatch_can_fan_out() {
        let dispatch = Dispatch::custom(|event, out| {
            out.push(FadeRequest::multi(
                event.pos,
                vec![ColorStop::new(Rgb::WHITE, 1.0), ColorStop::new(RED, 2.0)],
                event.fade_ms,
            ));
        });
        let mut player = TimelinePlayer::new(events(), 0.0, dispatch);
        let mut out = Vec::new();
        assert!(player.update(200.0, &mut out));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.mode() == FadeMode::Multi));
    }
}
