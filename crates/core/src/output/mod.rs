//! Batched delivery of resolved cell colors to whatever displays them.

use crate::grid::CELL_COUNT;
use crate::{GridPos, Palette, Result, Rgb};

/// One cell of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWrite {
    pub pos: GridPos,
    pub color: Rgb,
}

/// Destination for flushed batches. Implementations own their transport and
/// its failure handling; the engine never retries.
pub trait LightSink {
    fn write_batch(&mut self, writes: &[CellWrite]) -> Result<()>;
}

/// Collects cell writes and hands them to the sink as one batch.
#[derive(Debug)]
pub struct OutputStage<S> {
    sink: S,
    pending: Vec<Option<Rgb>>,
    batches_sent: u64,
}

impl<S: LightSink> OutputStage<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pending: vec![None; CELL_COUNT],
            batches_sent: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent
    }

    /// Stages a cell write. `immediate` bypasses the batch and writes the
    /// single cell straight away. Positions outside the grid and control
    /// strip are dropped.
    pub fn set_physical_color(&mut self, color: Rgb, pos: GridPos, immediate: bool) {
        let Some(index) = pos.index() else {
            tracing::debug!(x = pos.x, y = pos.y, "dropping write outside the grid");
            return;
        };
        if immediate {
            self.pending[index] = None;
            self.send(&[CellWrite { pos, color }]);
        } else {
            self.pending[index] = Some(color);
        }
    }

    /// Sends every staged write as a single batch in cell order.
    pub fn flush_physical_colors(&mut self) {
        let batch: Vec<CellWrite> = self
            .pending
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let color = slot.take()?;
                GridPos::from_index(index).map(|pos| CellWrite { pos, color })
            })
            .collect();
        if !batch.is_empty() {
            self.send(&batch);
        }
    }

    fn send(&mut self, batch: &[CellWrite]) {
        self.batches_sent += 1;
        if let Err(err) = self.sink.write_batch(batch) {
            tracing::warn!(%err, cells = batch.len(), "output sink rejected batch");
        }
    }
}

/// Keeps every batch it receives.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub batches: Vec<Vec<CellWrite>>,
}

impl LightSink for MemorySink {
    fn write_batch(&mut self, writes: &[CellWrite]) -> Result<()> {
        self.batches.push(writes.to_vec());
        Ok(())
    }
}

/// On-screen mirror of the grid holding one RGBA string per cell.
#[derive(Debug, Clone)]
pub struct ScreenSink {
    alpha: f32,
    cells: Vec<Rgb>,
}

impl ScreenSink {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            cells: vec![Rgb::OFF; CELL_COUNT],
        }
    }

    pub fn color(&self, pos: GridPos) -> Option<Rgb> {
        pos.index().map(|index| self.cells[index])
    }

    pub fn rgba(&self, pos: GridPos) -> Option<String> {
        self.color(pos).map(|color| color.to_rgba_string(self.alpha))
    }
}

impl LightSink for ScreenSink {
    fn write_batch(&mut self, writes: &[CellWrite]) -> Result<()> {
        for write in writes {
            if let Some(index) = write.pos.index() {
                self.cells[index] = write.color;
            }
        }
        Ok(())
    }
}

/// Controller-native cell write: programmer-mode note and palette velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceWrite {
    pub note: u8,
    pub velocity: u8,
}

/// Whatever actually talks to the controller.
pub trait DeviceTransport {
    fn send(&mut self, writes: &[DeviceWrite]) -> Result<()>;
}

/// Programmer-mode note number for a cell. Row 0 of the grid is the top row.
pub fn device_note(pos: GridPos) -> Option<u8> {
    if pos.is_main_grid() {
        Some(((8 - pos.y) * 10 + pos.x + 1) as u8)
    } else if pos.y == 8 && (0..8).contains(&pos.x) {
        Some((91 + pos.x) as u8)
    } else if pos.x == 8 && (0..8).contains(&pos.y) {
        Some(((8 - pos.y) * 10 + 9) as u8)
    } else {
        None
    }
}

/// Converts batches to palette velocities for a physical controller.
#[derive(Debug)]
pub struct DeviceSink<T> {
    palette: Palette,
    transport: T,
}

impl<T: DeviceTransport> DeviceSink<T> {
    pub fn new(palette: Palette, transport: T) -> Self {
        Self { palette, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: DeviceTransport> LightSink for DeviceSink<T> {
    fn write_batch(&mut self, writes: &[CellWrite]) -> Result<()> {
        let device: Vec<DeviceWrite> = writes
            .iter()
            .filter_map(|write| {
                device_note(write.pos).map(|note| DeviceWrite {
                    note,
                    velocity: self.palette.nearest_velocity(write.color),
                })
            })
            .collect();
        self.transport.send(&device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LightsError;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<Vec<DeviceWrite>>,
    }

    impl DeviceTransport for Recorder {
        fn send(&mut self, writes: &[DeviceWrite]) -> Result<()> {
            self.sent.push(writes.to_vec());
            Ok(())
        }
    }

    struct Broken;

    impl LightSink for Broken {
        fn write_batch(&mut self, _writes: &[CellWrite]) -> Result<()> {
            Err(LightsError::Sink("unplugged".to_string()))
        }
    }

    #[test]
    fn staged_writes_go_out_as_one_batch() {
        let mut stage = OutputStage::new(MemorySink::default());
        stage.set_physical_color(RED, GridPos::new(3, 3), false);
        stage.set_physical_color(RED, GridPos::new(0, 0), false);
        stage.set_physical_color(Rgb::WHITE, GridPos::new(3, 3), false);
        stage.set_physical_color(RED, GridPos::new(9, 9), false);
        stage.flush_physical_colors();
        stage.flush_physical_colors();

        let batches = &stage.sink().batches;
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![
                CellWrite {
                    pos: GridPos::new(0, 0),
                    color: RED,
                },
                CellWrite {
                    pos: GridPos::new(3, 3),
                    color: Rgb::WHITE,
                },
            ]
        );
    }

    #[test]
    fn immediate_writes_skip_the_batch() {
        let mut stage = OutputStage::new(MemorySink::default());
        stage.set_physical_color(RED, GridPos::new(1, 1), false);
        stage.set_physical_color(Rgb::WHITE, GridPos::new(1, 1), true);
        stage.flush_physical_colors();
        assert_eq!(stage.sink().batches.len(), 1);
        assert_eq!(stage.sink().batches[0][0].color, Rgb::WHITE);
    }

    #[test]
    fn sink_failures_do_not_propagate() {
        let mut stage = OutputStage::new(Broken);
        stage.set_physical_color(RED, GridPos::new(1, 1), false);
        stage.flush_physical_colors();
        assert_eq!(stage.batches_sent(), 1);
    }

    #[test]
    fn device_sink_maps_notes_and_velocities() {
        let mut sink = DeviceSink::new(Palette::launchpad(), Recorder::default());
        sink.write_batch(&[
            CellWrite {
                pos: GridPos::new(0, 0),
                color: RED,
            },
            CellWrite {
                pos: GridPos::new(7, 7),
                color: Rgb::OFF,
            },
            CellWrite {
                pos: GridPos::new(2, 8),
                color: Rgb::WHITE,
            },
            CellWrite {
                pos: GridPos::new(8, 0),
                color: RED,
            },
        ])
        .unwrap();
        assert_eq!(
            sink.transport().sent[0],
            vec![
                DeviceWrite {
                    note: 81,
                    velocity: 5,
                },
                DeviceWrite {
                    note: 18,
                    velocity: 0,
                },
                DeviceWrite {
                    note: 93,
                    velocity: 3,
                },
                DeviceWrite {
                    note: 89,
                    velocity: 5,
                },
            ]
        );
    }

    #[test]
    fn screen_sink_formats_rgba() {
        let mut sink = ScreenSink::new(0.5);
        sink.write_batch(&[CellWrite {
            pos: GridPos::new(4, 4),
            color: RED,
        }])
        .unwrap();
        assert_eq!(
            sink.rgba(GridPos::new(4, 4)).as_deref(),
            Some("rgba(255, 0, 0, 0.5)")
        );
        assert_eq!(sink.rgba(GridPos::new(8, 8)), None);
    }
}
