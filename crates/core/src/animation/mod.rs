use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::{
    FadeRequest, GridPos, PhysicsSweep, PulseAnimation, Rgb, TextAnimation, TimelinePlayer,
};

/// Tag describing which concrete animation a registry entry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Timeline,
    Physics,
    Pulse,
    Text,
    Hold,
}

/// A running effect. Each variant owns its own clock state and only talks to
/// the compositor through the requests it pushes into `out`.
#[derive(Debug, Clone)]
pub enum Animation {
    Timeline(TimelinePlayer),
    Physics(PhysicsSweep),
    Pulse(PulseAnimation),
    Text(TextAnimation),
    Hold(HoldAnimation),
}

impl Animation {
    pub fn kind(&self) -> AnimationKind {
        match self {
            Self::Timeline(_) => AnimationKind::Timeline,
            Self::Physics(_) => AnimationKind::Physics,
            Self::Pulse(_) => AnimationKind::Pulse,
            Self::Text(_) => AnimationKind::Text,
            Self::Hold(_) => AnimationKind::Hold,
        }
    }

    /// Advances to `now_ms`; returns `true` once the animation is done.
    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        match self {
            Self::Timeline(player) => player.update(now_ms, out),
            Self::Physics(sweep) => sweep.update(now_ms, out),
            Self::Pulse(pulse) => pulse.update(now_ms, out),
            Self::Text(text) => text.update(now_ms, out),
            Self::Hold(hold) => hold.update(now_ms, out),
        }
    }

    /// Lets the animation leave its cells in a settled state when it is
    /// cancelled. Only held effects have anything to settle.
    pub fn release(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) {
        if let Self::Hold(hold) = self {
            hold.release(now_ms, out);
        }
    }
}

/// Light tied to a held pad: latched on press, faded out on release or
/// after `max_hold_ms`.
#[derive(Debug, Clone)]
pub struct HoldAnimation {
    pos: GridPos,
    color: Rgb,
    start_ms: f64,
    max_hold_ms: f64,
    release_fade_ms: f64,
    lit: bool,
    settled: bool,
}

impl HoldAnimation {
    pub fn new(
        pos: GridPos,
        color: Rgb,
        start_ms: f64,
        max_hold_ms: f64,
        release_fade_ms: f64,
    ) -> Self {
        Self {
            pos,
            color,
            start_ms,
            max_hold_ms,
            release_fade_ms,
            lit: false,
            settled: false,
        }
    }

    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        if self.settled {
            return true;
        }
        if !self.lit {
            // Zero duration latches until the next request for the cell.
            out.push(FadeRequest::instant(self.pos, self.color, 0.0));
            self.lit = true;
        }
        if now_ms - self.start_ms >= self.max_hold_ms {
            self.release(now_ms, out);
            return true;
        }
        false
    }

    pub fn release(&mut self, _now_ms: f64, out: &mut Vec<FadeRequest>) {
        if self.settled {
            return;
        }
        self.settled = true;
        if self.lit {
            out.push(FadeRequest::standard(
                self.pos,
                Rgb::OFF,
                self.release_fade_ms,
            ));
        }
    }
}

/// An animation together with the trigger that started it.
#[derive(Debug, Clone)]
pub struct ActiveAnimation {
    pub name: String,
    pub origin: GridPos,
    pub animation: Animation,
}

/// Running animations, advanced in insertion order.
#[derive(Debug, Default)]
pub struct ActiveSet {
    animations: Vec<ActiveAnimation>,
    scratch: Vec<FadeRequest>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveAnimation> {
        self.animations.iter()
    }

    pub fn push(&mut self, name: impl Into<String>, origin: GridPos, animation: Animation) {
        self.animations.push(ActiveAnimation {
            name: name.into(),
            origin,
            animation,
        });
    }

    /// Updates every animation, forwarding its requests to `out` and
    /// dropping the ones that report completion. Requests the compositor
    /// could not apply are discarded per animation. An animation whose
    /// update panics (a custom dispatch callback, say) is removed together
    /// with whatever it emitted that frame; the rest keep running.
    pub fn advance(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) {
        let scratch = &mut self.scratch;
        self.animations.retain_mut(|active| {
            scratch.clear();
            let animation = &mut active.animation;
            let update = panic::catch_unwind(AssertUnwindSafe(|| {
                animation.update(now_ms, scratch)
            }));
            let finished = match update {
                Ok(finished) => finished,
                Err(_) => {
                    tracing::error!(name = %active.name, "animation panicked, removing it");
                    scratch.clear();
                    return false;
                }
            };
            forward_valid(&active.name, scratch, out);
            if finished {
                tracing::debug!(name = %active.name, "animation finished");
            }
            !finished
        });
    }

    /// Removes every animation started as `name` at `origin`, letting each
    /// settle first. Returns how many were removed.
    pub fn release(
        &mut self,
        name: &str,
        origin: GridPos,
        now_ms: f64,
        out: &mut Vec<FadeRequest>,
    ) -> usize {
        let before = self.animations.len();
        let scratch = &mut self.scratch;
        self.animations.retain_mut(|active| {
            if active.name != name || active.origin != origin {
                return true;
            }
            scratch.clear();
            active.animation.release(now_ms, scratch);
            forward_valid(&active.name, scratch, out);
            false
        });
        before - self.animations.len()
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }
}

fn forward_valid(name: &str, requests: &mut Vec<FadeRequest>, out: &mut Vec<FadeRequest>) {
    for request in requests.drain(..) {
        if request.is_valid() {
            out.push(request);
        } else {
            tracing::warn!(
                name,
                x = request.pos.x,
                y = request.pos.y,
                "dropping invalid fade request"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dispatch, FadeKind, LightEvent};

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn timeline(events: Vec<LightEvent>) -> Animation {
        Animation::Timeline(TimelinePlayer::new(events, 0.0, Dispatch::standard(RED)))
    }

    fn blink(x: i32, y: i32, at_ms: f64) -> Animation {
        timeline(vec![LightEvent::new(GridPos::new(x, y), at_ms, 10.0)])
    }

    #[test]
    fn finished_animations_are_pruned() {
        let mut set = ActiveSet::new();
        set.push("short", GridPos::new(0, 0), blink(0, 0, 0.0));
        set.push("long", GridPos::new(1, 1), blink(1, 1, 500.0));

        let mut out = Vec::new();
        set.advance(0.0, &mut out);
        assert_eq!(set.len(), 1);
        assert_eq!(out.len(), 1);
        set.advance(500.0, &mut out);
        assert!(set.is_empty());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn invalid_requests_are_contained_to_their_animation() {
        let mut set = ActiveSet::new();
        let faulty = Animation::Timeline(TimelinePlayer::new(
            vec![
                LightEvent::new(GridPos::new(12, -3), 0.0, 10.0),
                LightEvent::new(GridPos::new(2, 2), 0.0, 10.0),
            ],
            0.0,
            Dispatch::standard(RED),
        ));
        set.push("faulty", GridPos::new(0, 0), faulty);
        set.push("healthy", GridPos::new(0, 0), blink(3, 3, 0.0));

        let mut out = Vec::new();
        set.advance(0.0, &mut out);
        let cells: Vec<GridPos> = out.iter().map(|r| r.pos).collect();
        assert_eq!(cells, vec![GridPos::new(2, 2), GridPos::new(3, 3)]);
    }

    #[test]
    fn a_panicking_animation_is_removed_without_touching_the_others() {
        let mut set = ActiveSet::new();
        let broken = Dispatch::custom(|event, out| {
            out.push(FadeRequest::instant(event.pos, RED, 10.0));
            panic!("dispatch callback failed");
        });
        let faulty = Animation::Timeline(TimelinePlayer::new(
            vec![LightEvent::new(GridPos::new(1, 1), 0.0, 10.0)],
            0.0,
            broken,
        ));
        set.push("before", GridPos::new(0, 0), blink(0, 0, 0.0));
        set.push("faulty", GridPos::new(0, 0), faulty);
        set.push("after", GridPos::new(0, 0), blink(2, 2, 100.0));

        let mut out = Vec::new();
        set.advance(0.0, &mut out);
        let cells: Vec<GridPos> = out.iter().map(|r| r.pos).collect();
        assert_eq!(cells, vec![GridPos::new(0, 0)]);
        let names: Vec<&str> = set.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["after"]);

        set.advance(100.0, &mut out);
        assert_eq!(out.last().map(|r| r.pos), Some(GridPos::new(2, 2)));
        assert!(set.is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut set = ActiveSet::new();
        for x in 0..4 {
            set.push(format!("a{x}"), GridPos::new(x, 0), blink(x, 0, 0.0));
        }
        let mut out = Vec::new();
        set.advance(0.0, &mut out);
        let xs: Vec<i32> = out.iter().map(|r| r.pos.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn release_settles_held_light_and_removes_it() {
        let mut set = ActiveSet::new();
        let pos = GridPos::new(4, 5);
        let hold = HoldAnimation::new(pos, RED, 0.0, 10_000.0, 150.0);
        set.push("hold_red", pos, Animation::Hold(hold));
        let mut out = Vec::new();
        set.advance(0.0, &mut out);
        assert_eq!(out, vec![FadeRequest::instant(pos, RED, 0.0)]);

        assert_eq!(set.release("hold_red", GridPos::new(0, 0), 10.0, &mut out), 0);
        assert_eq!(set.release("hold_red", pos, 10.0, &mut out), 1);
        assert!(set.is_empty());
        assert_eq!(out[1].kind, FadeKind::Standard(Rgb::OFF));
    }

    #[test]
    fn held_light_times_out() {
        let pos = GridPos::new(0, 7);
        let mut hold = Animation::Hold(HoldAnimation::new(pos, RED, 0.0, 1_000.0, 100.0));
        assert_eq!(hold.kind(), AnimationKind::Hold);
        let mut out = Vec::new();
        assert!(!hold.update(999.0, &mut out));
        assert!(hold.update(1_000.0, &mut out));
        assert_eq!(out.len(), 2);
        assert!(hold.update(2_000.0, &mut out));
        assert_eq!(out.len(), 2);
    }
}
