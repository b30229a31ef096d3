//! Effect names mapped to the factories that build them.
//!
//! [`register`] fills a registry once at startup with every effect family
//! for every palette color; lookups are read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use rand::RngCore;

use crate::animation::{Animation, AnimationKind, HoldAnimation};
use crate::patterns::{self, Axis, Diagonal, Direction, ScanVariant};
use crate::{
    ColorStop, Dispatch, FadeRequest, GridPos, LightEvent, LightsError, Palette, PhysicsSweep,
    PulseAnimation, PulseColors, Result, Rgb, TextAnimation, TimelinePlayer, TimingConfig,
};

/// Words registered as text effects out of the box.
pub const DEFAULT_WORDS: [&str; 4] = ["hi", "go", "drop", "321"];

/// Everything a factory gets to know about the trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub origin: GridPos,
    pub duration_ms: f64,
    pub now_ms: f64,
}

pub type Factory = Box<dyn Fn(Spawn, &mut dyn RngCore) -> Animation>;

pub struct RegistryEntry {
    pub name: String,
    pub kind: AnimationKind,
    factory: Factory,
}

impl RegistryEntry {
    pub fn build(&self, spawn: Spawn, rng: &mut dyn RngCore) -> Animation {
        (self.factory)(spawn, rng)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug)]
pub struct AnimationRegistry {
    entries: HashMap<String, RegistryEntry>,
    timing: TimingConfig,
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl AnimationRegistry {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            entries: HashMap::new(),
            timing,
        }
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        kind: AnimationKind,
        factory: impl Fn(Spawn, &mut dyn RngCore) -> Animation + 'static,
    ) {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            RegistryEntry {
                name,
                kind,
                factory: Box::new(factory),
            },
        );
    }

    /// Registers a static timeline built from a pattern generator.
    pub fn insert_timeline(
        &mut self,
        name: impl Into<String>,
        dispatch: Dispatch,
        generate: impl Fn(GridPos, f64) -> Vec<LightEvent> + 'static,
    ) {
        self.insert(name, AnimationKind::Timeline, move |spawn, _| {
            Animation::Timeline(TimelinePlayer::new(
                generate(spawn.origin, spawn.duration_ms),
                spawn.now_ms,
                dispatch.clone(),
            ))
        });
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn spawn(&self, name: &str, spawn: Spawn, rng: &mut dyn RngCore) -> Result<Animation> {
        self.get(name)
            .map(|entry| entry.build(spawn, rng))
            .ok_or_else(|| LightsError::UnknownEffect(name.to_string()))
    }
}

/// Populates `registry` with every effect family for every palette color,
/// plus the color-independent effects.
pub fn register(registry: &mut AnimationRegistry, palette: &Palette) {
    for entry in palette.colors() {
        register_color(registry, &entry.name, entry.rgb);
    }
    register_words(registry, palette, DEFAULT_WORDS);

    let rainbow: Vec<Rgb> = palette
        .colors()
        .filter(|entry| entry.name != "white")
        .map(|entry| entry.rgb)
        .collect();
    let timing = registry.timing.clone();
    let burst = rainbow.clone();
    registry.insert("strobe_burst", AnimationKind::Pulse, move |spawn, _| {
        Animation::Pulse(PulseAnimation::new(
            PulseColors::Sequence(burst.clone()),
            spawn.duration_ms,
            timing.strobe_cycles,
            timing.strobe_on_fraction,
            spawn.now_ms,
        ))
    });
    let fallback = rainbow.first().copied().unwrap_or(Rgb::WHITE);
    registry.insert_timeline("rainbow_ripple", Dispatch::standard(fallback), move |origin, d| {
        patterns::colorize_by_step(
            patterns::ripple(origin, d),
            patterns::diagonal_step(d),
            &rainbow,
        )
    });

    tracing::info!(effects = registry.len(), "animation registry populated");
}

/// Adds `text_<word>_<color>` and `scroll_<word>_<color>` for each word.
pub fn register_words<I, S>(registry: &mut AnimationRegistry, palette: &Palette, words: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for word in words {
        let word = word.as_ref().to_lowercase();
        if word.is_empty() {
            continue;
        }
        for entry in palette.colors() {
            let color = entry.rgb;
            let text = word.clone();
            registry.insert(
                format!("text_{word}_{}", entry.name),
                AnimationKind::Text,
                move |spawn, _| {
                    let show = TextAnimation::show(&text, color, spawn.duration_ms, spawn.now_ms);
                    Animation::Text(show)
                },
            );
            let text = word.clone();
            registry.insert(
                format!("scroll_{word}_{}", entry.name),
                AnimationKind::Text,
                move |spawn, _| {
                    Animation::Text(TextAnimation::scroll(
                        &text,
                        Direction::Left,
                        color,
                        spawn.duration_ms,
                        spawn.now_ms,
                    ))
                },
            );
        }
    }
}

fn register_color(registry: &mut AnimationRegistry, name: &str, color: Rgb) {
    let dispatch = Dispatch::standard(color);

    for direction in Direction::ALL {
        let dir = direction.name();
        registry.insert_timeline(format!("rain_{dir}_{name}"), dispatch.clone(), move |o, d| {
            patterns::rain(o, direction, d)
        });
        registry.insert_timeline(format!("sweep_{dir}_{name}"), dispatch.clone(), move |o, d| {
            patterns::sweep(o, direction, d)
        });
        registry.insert(
            format!("cascade_{dir}_{name}"),
            AnimationKind::Physics,
            move |spawn, rng| {
                Animation::Physics(PhysicsSweep::new(
                    direction,
                    color,
                    spawn.duration_ms,
                    spawn.now_ms,
                    rng,
                ))
            },
        );
    }
    for diagonal in Diagonal::ALL {
        registry.insert_timeline(
            format!("diag_{}_{name}", diagonal.name()),
            dispatch.clone(),
            move |o, d| patterns::diagonal_sweep(o, diagonal, d),
        );
    }
    registry.insert_timeline(format!("ripple_{name}"), dispatch.clone(), patterns::ripple);
    registry.insert_timeline(format!("expand_{name}"), dispatch.clone(), patterns::expand);
    registry.insert_timeline(format!("cross_{name}"), dispatch.clone(), patterns::cross);
    for axis in Axis::ALL {
        let axis_name = axis.name();
        registry.insert_timeline(
            format!("bounce_{axis_name}_{name}"),
            dispatch.clone(),
            move |o, d| patterns::bounce(o, axis, d),
        );
        for variant in ScanVariant::ALL {
            registry.insert_timeline(
                format!("scan_{axis_name}_{}_{name}", variant.name()),
                dispatch.clone(),
                move |_, d| patterns::scanline(axis, variant, d),
            );
        }
    }

    // White flash, then the color, then a dim tail.
    let firework = Dispatch::custom(move |event: &LightEvent, out: &mut Vec<FadeRequest>| {
        out.push(FadeRequest::multi(
            event.pos,
            vec![
                ColorStop::new(Rgb::WHITE, 1.0),
                ColorStop::new(color, 2.0),
                ColorStop::new(color.scale(0.3), 1.0),
            ],
            event.fade_ms * 2.0,
        ));
    });
    registry.insert_timeline(format!("firework_{name}"), firework, patterns::ripple);

    let timing = registry.timing.clone();
    registry.insert(format!("strobe_{name}"), AnimationKind::Pulse, move |spawn, _| {
        Animation::Pulse(PulseAnimation::new(
            PulseColors::Fixed(color),
            spawn.duration_ms,
            timing.strobe_cycles,
            timing.strobe_on_fraction,
            spawn.now_ms,
        ))
    });

    let timing = registry.timing.clone();
    registry.insert(format!("hold_{name}"), AnimationKind::Hold, move |spawn, _| {
        Animation::Hold(HoldAnimation::new(
            spawn.origin,
            color,
            spawn.now_ms,
            timing.max_hold_ms,
            timing.release_fade_ms,
        ))
    });
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::FadeMode;

    fn registry() -> AnimationRegistry {
        let mut registry = AnimationRegistry::default();
        register(&mut registry, &Palette::launchpad());
        registry
    }

    fn spawn(x: i32, y: i32, duration_ms: f64) -> Spawn {
        Spawn {
            origin: GridPos::new(x, y),
            duration_ms,
            now_ms: 0.0,
        }
    }

    #[test]
    fn every_color_gets_every_family() {
        let registry = registry();
        for color in ["red", "white", "pink"] {
            for effect in [
                "rain_down",
                "sweep_left",
                "cascade_up",
                "diag_up_left",
                "ripple",
                "expand",
                "cross",
                "bounce_vertical",
                "scan_horizontal_reverse_bounce",
                "firework",
                "strobe",
                "hold",
                "text_hi",
                "scroll_drop",
            ] {
                let name = format!("{effect}_{color}");
                assert!(registry.contains(&name), "{name}");
            }
        }
        assert!(registry.contains("strobe_burst"));
        assert!(registry.contains("rainbow_ripple"));
        assert!(!registry.contains("rain_down_off"));
        assert_eq!(registry.get("cascade_up_red").unwrap().kind, AnimationKind::Physics);
    }

    #[test]
    fn unknown_names_are_errors() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(0);
        let err = registry
            .spawn("nope", spawn(0, 0, 0.0), &mut rng)
            .unwrap_err();
        assert!(matches!(err, LightsError::UnknownEffect(name) if name == "nope"));
    }

    #[test]
    fn rain_down_red_plays_the_reference_timeline() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(0);
        let mut animation = registry
            .spawn("rain_down_red", spawn(3, 2, 900.0), &mut rng)
            .unwrap();
        let mut out = Vec::new();
        assert!(animation.update(10_000.0, &mut out));
        assert_eq!(out.len(), 6);
        for (request, ty) in out.iter().zip(2..8) {
            assert_eq!(request.pos, GridPos::new(3, ty));
            assert_eq!(request.mode(), FadeMode::Standard);
            assert!((request.duration_ms - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn firework_dispatches_multi_color_fades() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(0);
        let mut animation = registry
            .spawn("firework_blue", spawn(4, 4, 0.0), &mut rng)
            .unwrap();
        let mut out = Vec::new();
        animation.update(0.0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mode(), FadeMode::Multi);
    }

    #[test]
    fn extra_words_are_lowercased() {
        let mut registry = AnimationRegistry::default();
        register_words(&mut registry, &Palette::launchpad(), ["Drop!"]);
        assert!(registry.contains("text_drop!_red"));
        assert!(registry.contains("scroll_drop!_cyan"));
    }

    #[test]
    fn rainbow_ripple_colors_each_ring() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(0);
        let mut animation = registry
            .spawn("rainbow_ripple", spawn(0, 0, 1_500.0), &mut rng)
            .unwrap();
        let mut out = Vec::new();
        animation.update(100.0, &mut out);
        let colors: std::collections::HashSet<_> = out
            .iter()
            .map(|r| match &r.kind {
                crate::FadeKind::Standard(color) => *color,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(colors.len(), 2);
    }
}
