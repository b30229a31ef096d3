use rand::{rngs::StdRng, SeedableRng};

use crate::animation::{ActiveSet, Animation};
use crate::grid::{Region, GRID_SIZE};
use crate::output::{LightSink, OutputStage};
use crate::patterns::Direction;
use crate::registry::{self, AnimationRegistry, Spawn};
use crate::{EngineConfig, Fader, FadeRequest, GridPos, Palette, Rgb, TextAnimation};

/// Everything that runs the grid: registry, running animations, compositor
/// and output. One [`Engine::tick`] per frame.
#[derive(Debug)]
pub struct Engine<S> {
    config: EngineConfig,
    palette: Palette,
    registry: AnimationRegistry,
    active: ActiveSet,
    fader: Fader,
    output: OutputStage<S>,
    rng: StdRng,
    pending: Vec<FadeRequest>,
}

impl<S: LightSink> Engine<S> {
    /// Builds an engine with a fully populated registry. Randomized effects
    /// are seeded from `config.seed` when set.
    pub fn new(config: EngineConfig, sink: S) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, sink, rng)
    }

    pub fn with_rng(config: EngineConfig, sink: S, rng: StdRng) -> Self {
        let palette = config.palette();
        let mut registry = AnimationRegistry::new(config.timing.clone());
        registry::register(&mut registry, &palette);
        registry::register_words(&mut registry, &palette, &config.text.words);
        Self {
            fader: Fader::new(&config.fader),
            palette,
            registry,
            active: ActiveSet::new(),
            output: OutputStage::new(sink),
            rng,
            pending: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn fader(&self) -> &Fader {
        &self.fader
    }

    pub fn output(&self) -> &OutputStage<S> {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputStage<S> {
        &mut self.output
    }

    /// Resolved color of any cell, as last computed by [`Engine::tick`].
    pub fn color_at(&self, pos: GridPos) -> Option<Rgb> {
        self.fader.color_at(pos)
    }

    /// Starts the named effect at `(x, y)`. Unknown names and off-grid
    /// positions are logged and ignored; returns whether anything started.
    pub fn trigger_animation(
        &mut self,
        name: &str,
        x: i32,
        y: i32,
        duration_ms: f64,
        now_ms: f64,
    ) -> bool {
        let origin = match GridPos::checked(x, y) {
            Ok(origin) => origin,
            Err(err) => {
                tracing::warn!(name, %err, "ignoring trigger");
                return false;
            }
        };
        let spawn = Spawn {
            origin,
            duration_ms,
            now_ms,
        };
        match self.registry.spawn(name, spawn, &mut self.rng) {
            Ok(animation) => {
                tracing::debug!(name, x, y, duration_ms, kind = ?animation.kind(), "triggered");
                self.active.push(name, origin, animation);
                true
            }
            Err(err) => {
                tracing::warn!(%err, x, y, "ignoring trigger");
                false
            }
        }
    }

    /// Cancels every instance of `name` started at `(x, y)`, settling held
    /// lights. Returns how many instances were removed.
    pub fn release_animation(&mut self, name: &str, x: i32, y: i32, now_ms: f64) -> usize {
        let removed = self
            .active
            .release(name, GridPos::new(x, y), now_ms, &mut self.pending);
        for request in self.pending.drain(..) {
            self.fader.add(request, now_ms);
        }
        tracing::debug!(name, x, y, removed, "released");
        removed
    }

    /// Shows arbitrary text one character at a time.
    pub fn show_text(&mut self, text: &str, color: Rgb, duration_ms: f64, now_ms: f64) {
        self.active.push(
            format!("text:{text}"),
            GridPos::new(0, 0),
            Animation::Text(TextAnimation::show(text, color, duration_ms, now_ms)),
        );
    }

    /// Scrolls arbitrary text across the grid.
    pub fn scroll_text(
        &mut self,
        text: &str,
        direction: Direction,
        color: Rgb,
        duration_ms: f64,
        now_ms: f64,
    ) {
        self.active.push(
            format!("scroll:{text}"),
            GridPos::new(0, 0),
            Animation::Text(TextAnimation::scroll(
                text,
                direction,
                color,
                duration_ms,
                now_ms,
            )),
        );
    }

    /// Runs one frame: advance animations in insertion order, apply their
    /// requests, resolve every cell and flush the changes as one batch.
    pub fn tick(&mut self, now_ms: f64) {
        self.active.advance(now_ms, &mut self.pending);
        for request in self.pending.drain(..) {
            self.fader.add(request, now_ms);
        }
        self.fader.advance(now_ms);
        self.fader.flush(&mut self.output);
    }

    /// Rewrites `region` wholesale on the output, regardless of what was
    /// sent before.
    pub fn resync(&mut self, region: Region) {
        tracing::info!(?region, "resyncing output");
        self.fader.mark_dirty(region);
        self.fader.flush(&mut self.output);
    }

    /// The controller came back; everything it shows is stale.
    pub fn reconnect(&mut self) {
        self.resync(Region::All);
    }

    /// Lights the page indicator on the control column.
    pub fn set_page(&mut self, page: i32) {
        self.set_indicator(page, Region::ControlColumn);
    }

    /// Lights the mode indicator on the control row.
    pub fn set_mode(&mut self, mode: i32) {
        self.set_indicator(mode, Region::ControlRow);
    }

    /// Drops every running animation and fade.
    pub fn clear(&mut self) {
        self.active.clear();
        self.fader.reset();
        self.resync(Region::All);
    }

    fn set_indicator(&mut self, selected: i32, region: Region) {
        let color = self
            .palette
            .rgb(&self.config.output.indicator_color)
            .unwrap_or(Rgb::WHITE);
        for i in 0..GRID_SIZE {
            let pos = match region {
                Region::ControlRow => GridPos::new(i, GRID_SIZE),
                _ => GridPos::new(GRID_SIZE, i),
            };
            let base = if i == selected { color } else { Rgb::OFF };
            self.fader.set_base(pos, base);
        }
        self.resync(region);
    }
}
