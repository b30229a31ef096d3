//! Core library for the Launchpad Lights engine.
//!
//! Effects are triggered by name on an 8x8 pad grid, run concurrently as
//! [`Animation`]s, and describe their output as [`FadeRequest`]s. The
//! [`Fader`] owns the color of every cell, resolves conflicting requests
//! (the latest request for a cell always wins) and flushes changed cells to a
//! [`LightSink`] once per frame. [`Engine`] ties these together behind a
//! single `tick(now)` call.

pub mod animation;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fader;
pub mod grid;
pub mod output;
pub mod patterns;
pub mod physics;
pub mod pulse;
pub mod registry;
pub mod text;
pub mod timeline;

pub use animation::{ActiveAnimation, ActiveSet, Animation, AnimationKind, HoldAnimation};
pub use color::{Palette, PaletteEntry, Rgb};
pub use config::{EngineConfig, FaderConfig, OutputConfig, TextConfig, TimingConfig};
pub use engine::Engine;
pub use error::{LightsError, Result};
pub use event::{ColorStop, FadeKind, FadeMode, FadeRequest, LightEvent};
pub use fader::Fader;
pub use grid::{GridPos, Region, CELL_COUNT, GRID_CELLS, GRID_SIZE};
pub use output::{
    CellWrite, DeviceSink, DeviceTransport, DeviceWrite, LightSink, MemorySink, OutputStage,
    ScreenSink,
};
pub use patterns::{Axis, Diagonal, Direction, ScanVariant};
pub use physics::PhysicsSweep;
pub use pulse::{PulseAnimation, PulseColors};
pub use registry::{register, register_words, AnimationRegistry, Spawn};
pub use text::TextAnimation;
pub use timeline::{Dispatch, TimelinePlayer};
