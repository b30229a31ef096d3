use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use launchpad_lights_core::{
    Direction, Engine, EngineConfig, GridPos, LightsError, Rgb, ScreenSink, GRID_SIZE,
};
use tracing_subscriber::EnvFilter;

/// Simulated time is capped so a stuck effect cannot spin forever.
const MAX_RUN_MS: f64 = 60_000.0;

fn main() -> launchpad_lights_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::List { filter } => run_list(config, filter.as_deref()),
        Commands::Play {
            name,
            x,
            y,
            duration,
            clock,
        } => run_play(config, &name, x, y, duration, &clock),
        Commands::Text {
            text,
            color,
            scroll,
            duration,
            clock,
        } => run_text(config, &text, &color, scroll, duration, &clock),
    }
}

fn run_list(config: EngineConfig, filter: Option<&str>) -> launchpad_lights_core::Result<()> {
    let engine = Engine::new(config, ScreenSink::new(1.0));
    let registry = engine.registry();
    for name in registry.names() {
        if filter.map_or(true, |f| name.contains(f)) {
            if let Some(entry) = registry.get(name) {
                println!("{name:<48} {:?}", entry.kind);
            }
        }
    }
    Ok(())
}

fn run_play(
    config: EngineConfig,
    name: &str,
    x: i32,
    y: i32,
    duration: f64,
    clock: &ClockArgs,
) -> launchpad_lights_core::Result<()> {
    tracing::info!(name, x, y, duration, "playing effect");
    let alpha = config.output.screen_alpha;
    let mut engine = Engine::new(config, ScreenSink::new(alpha));
    if !engine.trigger_animation(name, x, y, duration, 0.0) {
        return Err(LightsError::UnknownEffect(name.to_string()));
    }
    run_frames(&mut engine, clock);
    Ok(())
}

fn run_text(
    config: EngineConfig,
    text: &str,
    color: &str,
    scroll: Option<ScrollDirection>,
    duration: f64,
    clock: &ClockArgs,
) -> launchpad_lights_core::Result<()> {
    let alpha = config.output.screen_alpha;
    let mut engine = Engine::new(config, ScreenSink::new(alpha));
    let rgb = engine
        .palette()
        .rgb(color)
        .ok_or_else(|| LightsError::msg(format!("unknown palette color `{color}`")))?;
    match scroll {
        Some(direction) => engine.scroll_text(text, direction.into(), rgb, duration, 0.0),
        None => engine.show_text(text, rgb, duration, 0.0),
    }
    run_frames(&mut engine, clock);
    Ok(())
}

/// Drives the engine with a simulated frame clock until every animation has
/// finished and the grid has gone dark, printing each frame that changed.
fn run_frames(engine: &mut Engine<ScreenSink>, clock: &ClockArgs) {
    let frame_ms = 1_000.0 / clock.fps.max(1) as f64;
    let mut now = 0.0;
    let mut printed = engine.output().batches_sent();
    loop {
        engine.tick(now);
        if engine.output().batches_sent() != printed {
            printed = engine.output().batches_sent();
            println!("t = {now:.0} ms");
            print!("{}", render(engine.output().sink()));
        }
        let dark = engine.fader().active_fades() == 0;
        if (engine.active().is_empty() && dark) || now >= MAX_RUN_MS {
            break;
        }
        if clock.realtime {
            std::thread::sleep(Duration::from_secs_f64(frame_ms / 1_000.0));
        }
        now += frame_ms;
    }
    tracing::info!(elapsed_ms = now, "playback finished");
}

/// The grid laid out like the hardware: control row on top, control column
/// on the right.
fn render(screen: &ScreenSink) -> String {
    let mut out = String::new();
    let rows = std::iter::once(GRID_SIZE).chain(0..GRID_SIZE);
    for y in rows {
        for x in 0..=GRID_SIZE {
            let cell = screen.color(GridPos::new(x, y));
            match cell {
                Some(color) => out.push_str(&swatch(color)),
                None => out.push_str("  "),
            }
        }
        out.push('\n');
    }
    out
}

fn swatch(color: Rgb) -> String {
    if color.is_off() {
        " .".to_string()
    } else {
        format!(
            "\x1b[48;2;{};{};{}m  \x1b[0m",
            color.r, color.g, color.b
        )
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pad grid light show engine", long_about = None)]
struct Cli {
    /// JSON engine configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every registered effect name and its kind.
    List {
        /// Only show names containing this string.
        filter: Option<String>,
    },
    /// Trigger one effect on a simulated clock and print the grid.
    Play {
        /// Registered effect name, e.g. `rain_down_red`.
        name: String,
        #[arg(short, long, default_value_t = 0)]
        x: i32,
        #[arg(short, long, default_value_t = 0)]
        y: i32,
        /// Effect duration in milliseconds; 0 picks the default timing.
        #[arg(short, long, default_value_t = 0.0)]
        duration: f64,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Render arbitrary text, character by character or scrolling.
    Text {
        text: String,
        /// Palette color name.
        #[arg(long, default_value = "white")]
        color: String,
        /// Scroll instead of showing one character at a time.
        #[arg(short, long, value_enum)]
        scroll: Option<ScrollDirection>,
        #[arg(short, long, default_value_t = 2_000.0)]
        duration: f64,
        #[command(flatten)]
        clock: ClockArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ClockArgs {
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Sleep between frames instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScrollDirection {
    Left,
    Right,
    Up,
    Down,
}

impl From<ScrollDirection> for Direction {
    fn from(value: ScrollDirection) -> Self {
        match value {
            ScrollDirection::Left => Direction::Left,
            ScrollDirection::Right => Direction::Right,
            ScrollDirection::Up => Direction::Up,
            ScrollDirection::Down => Direction::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use launchpad_lights_core::{CellWrite, LightSink};

    use super::*;

    #[test]
    fn control_row_renders_above_the_grid() {
        let mut screen = ScreenSink::new(1.0);
        screen
            .write_batch(&[
                CellWrite {
                    pos: GridPos::new(0, GRID_SIZE),
                    color: Rgb::WHITE,
                },
                CellWrite {
                    pos: GridPos::new(0, 0),
                    color: Rgb::OFF,
                },
            ])
            .unwrap();
        let frame = render(&screen);
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with(&swatch(Rgb::WHITE)));
        assert!(lines[1].starts_with(" ."));
    }
}
