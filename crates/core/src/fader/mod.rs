use crate::grid::{self, Region, CELL_COUNT};
use crate::output::{LightSink, OutputStage};
use crate::{ColorStop, FadeKind, FadeMode, FadeRequest, FaderConfig, GridPos, Rgb};

#[derive(Debug, Clone, PartialEq)]
struct ActiveFade {
    start_ms: f64,
    duration_ms: f64,
    /// Color the cell showed when the fade was issued.
    from: Rgb,
    kind: FadeKind,
}

#[derive(Debug, Clone, PartialEq)]
struct CellState {
    color: Rgb,
    base: Rgb,
    fade: Option<ActiveFade>,
}

impl Default for CellState {
    fn default() -> Self {
        Self {
            color: Rgb::OFF,
            base: Rgb::OFF,
            fade: None,
        }
    }
}

/// Owner of every cell's color. Animations describe what they want through
/// [`FadeRequest`]s and the fader decides what is actually visible.
#[derive(Debug)]
pub struct Fader {
    cells: Vec<CellState>,
    /// Color last handed to the output stage; `None` forces a rewrite.
    flushed: Vec<Option<Rgb>>,
    attack_fraction: f64,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(&FaderConfig::default())
    }
}

impl Fader {
    pub fn new(config: &FaderConfig) -> Self {
        Self {
            cells: vec![CellState::default(); CELL_COUNT],
            flushed: vec![Some(Rgb::OFF); CELL_COUNT],
            attack_fraction: config.attack_fraction.clamp(0.0, 1.0),
        }
    }

    /// Applies a request, replacing whatever fade the cell had in flight.
    /// Requests the fader cannot apply are logged and ignored.
    pub fn add(&mut self, request: FadeRequest, now_ms: f64) {
        if !request.is_valid() {
            tracing::debug!(?request, "ignoring invalid fade request");
            return;
        }
        let Some(index) = request.pos.index() else {
            return;
        };
        let from = self.resolve(index, now_ms);
        let cell = &mut self.cells[index];
        if let FadeKind::Instant(color) = request.kind {
            cell.color = color;
        }
        cell.fade = Some(ActiveFade {
            start_ms: now_ms,
            duration_ms: request.duration_ms,
            from,
            kind: request.kind,
        });
    }

    /// Sets the color a cell rests at when no fade is running.
    pub fn set_base(&mut self, pos: GridPos, color: Rgb) {
        if let Some(index) = pos.index() {
            let cell = &mut self.cells[index];
            cell.base = color;
            if cell.fade.is_none() {
                cell.color = color;
            }
        }
    }

    /// Resolves every cell at `now_ms`, retiring completed fades.
    pub fn advance(&mut self, now_ms: f64) {
        for index in 0..self.cells.len() {
            self.resolve(index, now_ms);
        }
    }

    /// Most recently resolved color of a cell.
    pub fn color_at(&self, pos: GridPos) -> Option<Rgb> {
        pos.index().map(|index| self.cells[index].color)
    }

    pub fn active_mode(&self, pos: GridPos) -> Option<FadeMode> {
        let index = pos.index()?;
        self.cells[index].fade.as_ref().map(|fade| match fade.kind {
            FadeKind::Instant(_) => FadeMode::Instant,
            FadeKind::Standard(_) => FadeMode::Standard,
            FadeKind::Multi(_) => FadeMode::Multi,
        })
    }

    pub fn active_fades(&self) -> usize {
        self.cells.iter().filter(|cell| cell.fade.is_some()).count()
    }

    /// Forces the cells of `region` to be rewritten on the next flush.
    pub fn mark_dirty(&mut self, region: Region) {
        for pos in grid::all_cells().filter(|pos| pos.in_region(region)) {
            if let Some(index) = pos.index() {
                self.flushed[index] = None;
            }
        }
    }

    /// Drops every fade and returns all cells to their base colors.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.fade = None;
            cell.color = cell.base;
        }
    }

    /// Stages every cell whose color changed since the last flush and
    /// commits them as one batch.
    pub fn flush<S: LightSink>(&mut self, stage: &mut OutputStage<S>) {
        for (index, cell) in self.cells.iter().enumerate() {
            if self.flushed[index] == Some(cell.color) {
                continue;
            }
            if let Some(pos) = GridPos::from_index(index) {
                stage.set_physical_color(cell.color, pos, false);
                self.flushed[index] = Some(cell.color);
            }
        }
        stage.flush_physical_colors();
    }

    fn resolve(&mut self, index: usize, now_ms: f64) -> Rgb {
        let attack = self.attack_fraction;
        let cell = &mut self.cells[index];
        let Some(fade) = &cell.fade else {
            return cell.color;
        };
        let elapsed = (now_ms - fade.start_ms).max(0.0);
        let color = match &fade.kind {
            // Zero-length instant requests latch until preempted.
            FadeKind::Instant(color) if fade.duration_ms == 0.0 => Some(*color),
            _ if elapsed >= fade.duration_ms => None,
            FadeKind::Instant(color) => Some(*color),
            FadeKind::Standard(target) => Some(envelope(
                fade.from,
                *target,
                cell.base,
                elapsed / fade.duration_ms,
                attack,
            )),
            FadeKind::Multi(stops) => Some(step_color(stops, elapsed / fade.duration_ms)),
        };
        match color {
            Some(color) => cell.color = color,
            None => {
                cell.fade = None;
                cell.color = cell.base;
            }
        }
        cell.color
    }
}

/// Rises from `from` to `target` over the attack share of the fade, then
/// decays to `base`.
fn envelope(from: Rgb, target: Rgb, base: Rgb, progress: f64, attack: f64) -> Rgb {
    if progress < attack {
        from.lerp(target, progress / attack)
    } else if attack >= 1.0 {
        target
    } else {
        target.lerp(base, (progress - attack) / (1.0 - attack))
    }
}

fn step_color(stops: &[ColorStop], progress: f64) -> Rgb {
    let total: f64 = stops.iter().map(|stop| stop.weight).sum();
    let mut reached = 0.0;
    for stop in stops {
        reached += stop.weight / total;
        if progress < reached {
            return stop.color;
        }
    }
    stops.last().map(|stop| stop.color).unwrap_or(Rgb::OFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn fader() -> Fader {
        Fader::new(&FaderConfig {
            attack_fraction: 0.5,
        })
    }

    #[test]
    fn instant_preempts_standard() {
        let mut fader = fader();
        let pos = GridPos::new(2, 3);
        fader.add(FadeRequest::standard(pos, RED, 1_000.0), 0.0);
        fader.advance(100.0);
        assert_ne!(fader.color_at(pos), Some(Rgb::OFF));

        fader.add(FadeRequest::instant(pos, BLUE, 500.0), 100.0);
        fader.advance(150.0);
        assert_eq!(fader.color_at(pos), Some(BLUE));
        assert_eq!(fader.active_mode(pos), Some(FadeMode::Instant));
        assert_eq!(fader.active_fades(), 1);

        fader.advance(700.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::OFF));
        assert_eq!(fader.active_mode(pos), None);
    }

    #[test]
    fn standard_rises_then_decays_to_base() {
        let mut fader = fader();
        let pos = GridPos::new(0, 0);
        fader.add(FadeRequest::standard(pos, RED, 200.0), 0.0);
        fader.advance(50.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::new(128, 0, 0)));
        fader.advance(100.0);
        assert_eq!(fader.color_at(pos), Some(RED));
        fader.advance(150.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::new(128, 0, 0)));
        fader.advance(200.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::OFF));
    }

    #[test]
    fn standard_starts_from_the_current_color() {
        let mut fader = fader();
        let pos = GridPos::new(1, 1);
        fader.add(FadeRequest::instant(pos, BLUE, 0.0), 0.0);
        fader.add(FadeRequest::standard(pos, RED, 100.0), 10.0);
        fader.advance(10.0);
        assert_eq!(fader.color_at(pos), Some(BLUE));
        fader.advance(35.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::new(128, 0, 128)));
    }

    #[test]
    fn multi_steps_through_weighted_colors() {
        let mut fader = fader();
        let pos = GridPos::new(5, 5);
        let stops = vec![ColorStop::new(Rgb::WHITE, 1.0), ColorStop::new(RED, 3.0)];
        fader.add(FadeRequest::multi(pos, stops, 400.0), 0.0);
        fader.advance(50.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::WHITE));
        fader.advance(150.0);
        assert_eq!(fader.color_at(pos), Some(RED));
        fader.advance(400.0);
        assert_eq!(fader.color_at(pos), Some(Rgb::OFF));
    }

    #[test]
    fn latched_instant_holds_until_preempted() {
        let mut fader = fader();
        let pos = GridPos::new(8, 2);
        fader.add(FadeRequest::instant(pos, RED, 0.0), 0.0);
        fader.advance(1_000_000.0);
        assert_eq!(fader.color_at(pos), Some(RED));
    }

    #[test]
    fn fades_revert_to_base_color() {
        let mut fader = fader();
        let pos = GridPos::new(3, 8);
        fader.set_base(pos, BLUE);
        assert_eq!(fader.color_at(pos), Some(BLUE));
        fader.add(FadeRequest::instant(pos, RED, 10.0), 0.0);
        fader.advance(20.0);
        assert_eq!(fader.color_at(pos), Some(BLUE));
    }

    #[test]
    fn invalid_requests_never_touch_state() {
        let mut fader = fader();
        fader.add(FadeRequest::instant(GridPos::new(8, 8), RED, 10.0), 0.0);
        fader.add(FadeRequest::instant(GridPos::new(0, 0), RED, -1.0), 0.0);
        assert_eq!(fader.active_fades(), 0);
    }

    #[test]
    fn flush_sends_only_changed_cells_in_one_batch() {
        let mut fader = fader();
        let mut stage = OutputStage::new(MemorySink::default());
        fader.add(FadeRequest::instant(GridPos::new(0, 0), RED, 100.0), 0.0);
        fader.add(FadeRequest::instant(GridPos::new(7, 7), BLUE, 100.0), 0.0);
        fader.advance(0.0);
        fader.flush(&mut stage);
        fader.flush(&mut stage);

        let batches = &stage.sink().batches;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);

        fader.mark_dirty(Region::ControlRow);
        fader.flush(&mut stage);
        let batches = &stage.sink().batches;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].len(), 8);
        assert!(batches[1].iter().all(|write| write.pos.y == 8));
    }
}
