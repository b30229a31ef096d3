use crate::grid;
use crate::patterns::effective_duration;
use crate::{FadeRequest, Rgb};

/// Color applied on each strobe cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PulseColors {
    Fixed(Rgb),
    /// `colors[cycle % len]`.
    Sequence(Vec<Rgb>),
}

impl PulseColors {
    fn for_cycle(&self, cycle: usize) -> Rgb {
        match self {
            Self::Fixed(color) => *color,
            Self::Sequence(colors) if colors.is_empty() => Rgb::OFF,
            Self::Sequence(colors) => colors[cycle % colors.len()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    On,
}

/// Full-grid flashes, one per cycle.
#[derive(Debug, Clone)]
pub struct PulseAnimation {
    start_ms: f64,
    cycles: usize,
    flash_interval_ms: f64,
    flash_ms: f64,
    colors: PulseColors,
    cycle: Option<usize>,
    phase: Phase,
    flashes: usize,
}

impl PulseAnimation {
    pub fn new(
        colors: PulseColors,
        duration_ms: f64,
        cycles: usize,
        on_fraction: f64,
        start_ms: f64,
    ) -> Self {
        let cycles = cycles.max(1);
        let flash_interval_ms = effective_duration(duration_ms) / cycles as f64;
        Self {
            start_ms,
            cycles,
            flash_interval_ms,
            flash_ms: flash_interval_ms * on_fraction.clamp(0.0, 1.0),
            colors,
            cycle: None,
            phase: Phase::Waiting,
            flashes: 0,
        }
    }

    pub fn flash_interval_ms(&self) -> f64 {
        self.flash_interval_ms
    }

    /// Number of flashes fired so far.
    pub fn flashes(&self) -> usize {
        self.flashes
    }

    pub fn update(&mut self, now_ms: f64, out: &mut Vec<FadeRequest>) -> bool {
        let elapsed = now_ms - self.start_ms;
        if elapsed < 0.0 {
            return false;
        }
        let target = (elapsed / self.flash_interval_ms).floor() as usize;
        if target >= self.cycles {
            return true;
        }
        if self.cycle != Some(target) {
            self.cycle = Some(target);
            self.phase = Phase::Waiting;
        }

        let into_cycle = elapsed - target as f64 * self.flash_interval_ms;
        if into_cycle < self.flash_ms && self.phase == Phase::Waiting {
            let color = self.colors.for_cycle(target);
            out.extend(
                grid::main_grid().map(|pos| FadeRequest::instant(pos, color, self.flash_ms)),
            );
            self.phase = Phase::On;
            self.flashes += 1;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FadeKind, GRID_CELLS};

    const WHITE: Rgb = Rgb::WHITE;

    #[test]
    fn fires_once_per_cycle_under_heavy_polling() {
        let mut pulse = PulseAnimation::new(PulseColors::Fixed(WHITE), 400.0, 4, 0.4, 0.0);
        let mut out = Vec::new();
        let mut now = 0.0;
        while !pulse.update(now, &mut out) {
            now += 1.0;
        }
        assert_eq!(pulse.flashes(), 4);
        assert_eq!(out.len(), 4 * GRID_CELLS);
    }

    #[test]
    fn burst_flashes_at_each_interval() {
        let colors = vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)];
        let mut pulse = PulseAnimation::new(PulseColors::Sequence(colors), 480.0, 4, 0.4, 0.0);
        let mut fired_at = Vec::new();
        let mut out = Vec::new();
        for now in (0..=500).step_by(4) {
            let before = out.len();
            pulse.update(now as f64, &mut out);
            if out.len() > before {
                assert_eq!(out.len() - before, GRID_CELLS);
                fired_at.push(now);
            }
        }
        assert_eq!(fired_at, vec![0, 120, 240, 360]);
        assert_eq!(out[0].kind, FadeKind::Instant(Rgb::new(255, 0, 0)));
        assert_eq!(out[GRID_CELLS].kind, FadeKind::Instant(Rgb::new(0, 255, 0)));
        assert!((out[0].duration_ms - 48.0).abs() < 1e-9);
    }

    #[test]
    fn polls_in_the_dark_phase_fire_nothing() {
        let mut pulse = PulseAnimation::new(PulseColors::Fixed(WHITE), 400.0, 4, 0.4, 0.0);
        let mut out = Vec::new();
        pulse.update(60.0, &mut out);
        pulse.update(90.0, &mut out);
        assert!(out.is_empty());
        pulse.update(100.0, &mut out);
        assert_eq!(out.len(), GRID_CELLS);
    }

    #[test]
    fn zero_duration_uses_default_timing() {
        let pulse = PulseAnimation::new(PulseColors::Fixed(WHITE), 0.0, 4, 0.4, 0.0);
        assert!((pulse.flash_interval_ms() - 200.0).abs() < 1e-9);
    }
}
