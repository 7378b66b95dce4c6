use anyhow::{bail, Result};
use crate::core::frame::BYTES_PER_PIXEL;
use crate::core::{DrawableShape, Frame, MotionState};
use std::ops::Range;
use super::MotionEngine;

/// Side length of the square windows flow is estimated over
pub const WINDOW_SIZE: usize = 8;

/// Flow (px/frame) below which a window counts as still
const MIN_FLOW: f64 = 0.5;

/// Flow estimates at or above a window width are not trustworthy
const MAX_FLOW: f64 = WINDOW_SIZE as f64;

/// Windows whose structure tensor is this flat have no usable texture
const MIN_DETERMINANT: f64 = 1e-6;

/// Whole-frame motion summary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalMotion {
    /// Percentage of windows in motion (0-100)
    pub amount: f64,
    /// Mean motion heading in degrees, 0 = up, 90 = right
    pub direction: f64,
}

#[derive(Debug, Default)]
struct FlowSummary {
    windows: usize,
    moving: usize,
    sum_u: f64,
    sum_v: f64,
}

impl FlowSummary {
    fn amount(&self) -> f64 {
        if self.windows == 0 {
            return 0.0;
        }
        (100.0 * self.moving as f64 / self.windows as f64).round()
    }

    fn direction(&self) -> Option<f64> {
        if self.moving == 0 {
            return None;
        }
        // Image y grows downwards, headings grow clockwise from up
        Some(self.sum_u.atan2(-self.sum_v).to_degrees())
    }
}

/// Per-window flow of one frame pair.
///
/// Window `(c, r)` covers pixels `1 + c*W .. 1 + (c+1)*W` horizontally (and
/// likewise vertically), leaving the one-pixel margin central differences need.
#[derive(Debug)]
struct FlowGrid {
    frame_number: u64,
    cols: usize,
    rows: usize,
    flows: Vec<Option<(f64, f64)>>,
}

impl FlowGrid {
    fn compute(prev: &[u8], curr: &[u8], width: usize, height: usize, frame_number: u64) -> Self {
        let cols = width.saturating_sub(2) / WINDOW_SIZE;
        let rows = height.saturating_sub(2) / WINDOW_SIZE;

        let mut flows = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                let (wx, wy) = (1 + c * WINDOW_SIZE, 1 + r * WINDOW_SIZE);
                flows.push(window_flow(prev, curr, width, wx, wy));
            }
        }

        Self { frame_number, cols, rows, flows }
    }

    fn summarize(&self, cols: Range<usize>, rows: Range<usize>) -> FlowSummary {
        let mut summary = FlowSummary::default();
        for r in rows {
            for c in cols.clone() {
                summary.windows += 1;
                if let Some((u, v)) = self.flows[r * self.cols + c] {
                    let magnitude = u.hypot(v);
                    if magnitude > MIN_FLOW && magnitude < MAX_FLOW {
                        summary.moving += 1;
                        summary.sum_u += u;
                        summary.sum_v += v;
                    }
                }
            }
        }
        summary
    }

    fn summarize_all(&self) -> FlowSummary {
        self.summarize(0..self.cols, 0..self.rows)
    }

    /// Windows overlapping the pixel rectangle `x0..x1` by `y0..y1`
    fn summarize_rect(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> FlowSummary {
        self.summarize(window_span(x0, x1, self.cols), window_span(y0, y1, self.rows))
    }
}

/// Gradient-based optical flow over the two most recent luma planes.
///
/// Flow is solved once per ingested frame; the global and local analyses
/// both summarise the same cached grid.
pub struct VideoMotion {
    width: u32,
    height: u32,
    frame_number: u64,
    prev: Option<Vec<u8>>,
    curr: Option<Vec<u8>>,
    brightness: Option<f64>,
    global: GlobalMotion,
    grid: Option<FlowGrid>,
}

impl VideoMotion {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_number: 0,
            prev: None,
            curr: None,
            brightness: None,
            global: GlobalMotion::default(),
            grid: None,
        }
    }

    /// Result of the last `refresh_global_analysis`
    pub fn global_motion(&self) -> GlobalMotion {
        self.global
    }

    /// Flow grid of the current frame pair, solved on first use
    fn flow_grid(&mut self) -> Option<&FlowGrid> {
        let (prev, curr) = (self.prev.as_ref()?, self.curr.as_ref()?);

        let stale = !self.grid.as_ref().is_some_and(|grid| grid.frame_number == self.frame_number);
        if stale {
            self.grid = Some(FlowGrid::compute(
                prev,
                curr,
                self.width as usize,
                self.height as usize,
                self.frame_number,
            ));
        }
        self.grid.as_ref()
    }
}

impl MotionEngine for VideoMotion {
    fn ingest(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            bail!(
                "Frame is {}x{}, engine expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
        }

        let mut luma = self.prev.take().unwrap_or_default();
        luma.clear();
        luma.reserve(frame.pixel_count());

        let mut total: u64 = 0;
        for px in frame.data().chunks_exact(BYTES_PER_PIXEL) {
            let l = ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8;
            total += l as u64;
            luma.push(l);
        }

        self.brightness = if luma.is_empty() {
            None
        } else {
            Some(100.0 * total as f64 / (luma.len() as f64 * 255.0))
        };
        self.prev = self.curr.take();
        self.curr = Some(luma);
        self.frame_number += 1;
        Ok(())
    }

    fn current_brightness(&self) -> Result<Option<f64>> {
        Ok(self.brightness)
    }

    fn refresh_global_analysis(&mut self) -> Result<()> {
        let previous = self.global.direction;
        let summary = self.flow_grid().map(FlowGrid::summarize_all);
        self.global = match summary {
            Some(summary) => GlobalMotion {
                amount: summary.amount(),
                direction: summary.direction().unwrap_or(previous),
            },
            None => GlobalMotion::default(),
        };
        Ok(())
    }

    fn compute_local_motion(&mut self, shape: &DrawableShape, state: &mut MotionState) -> Result<()> {
        if state.last_analyzed_frame_number == self.frame_number {
            return Ok(());
        }

        let summary = match shape.bounds.to_frame_rect(self.width, self.height) {
            Some((x0, y0, x1, y1)) => self
                .flow_grid()
                .map(|grid| grid.summarize_rect(x0, y0, x1, y1)),
            None => None,
        };

        match summary {
            Some(summary) => {
                state.motion_amount = summary.amount();
                if let Some(direction) = summary.direction() {
                    state.motion_direction = direction;
                }
            }
            None => state.motion_amount = 0.0,
        }
        state.last_analyzed_frame_number = self.frame_number;
        Ok(())
    }

    fn frame_number(&self) -> u64 {
        self.frame_number
    }
}

fn window_span(lo: usize, hi: usize, count: usize) -> Range<usize> {
    let first = lo.saturating_sub(1) / WINDOW_SIZE;
    let end = (hi.saturating_sub(1) + WINDOW_SIZE - 1) / WINDOW_SIZE;
    first.min(count)..end.min(count)
}

/// Least-squares flow `(u, v)` of one window under brightness constancy
fn window_flow(prev: &[u8], curr: &[u8], width: usize, wx: usize, wy: usize) -> Option<(f64, f64)> {
    let (mut a2, mut a1b2, mut b1, mut c2, mut c1) = (0.0, 0.0, 0.0, 0.0, 0.0);

    for y in wy..wy + WINDOW_SIZE {
        for x in wx..wx + WINDOW_SIZE {
            let i = y * width + x;
            let gx = (curr[i + 1] as f64 - curr[i - 1] as f64) / 2.0;
            let gy = (curr[i + width] as f64 - curr[i - width] as f64) / 2.0;
            let gt = curr[i] as f64 - prev[i] as f64;

            a2 += gx * gx;
            a1b2 += gx * gy;
            b1 += gy * gy;
            c2 += gx * gt;
            c1 += gy * gt;
        }
    }

    let det = a2 * b1 - a1b2 * a1b2;
    if det.abs() < MIN_DETERMINANT {
        return None;
    }

    let u = -(b1 * c2 - a1b2 * c1) / det;
    let v = -(a2 * c1 - a1b2 * c2) / det;
    Some((u, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Bounds;

    fn textured(shift: u32) -> Frame {
        Frame::from_luma_fn(480, 360, |x, y| {
            let x = x as f64 - shift as f64;
            (128.0 + 50.0 * (0.4 * x).sin() + 50.0 * (0.4 * y as f64).sin()) as u8
        })
    }

    #[test]
    fn test_brightness_unset_before_first_frame() {
        let engine = VideoMotion::new(480, 360);
        assert_eq!(engine.current_brightness().unwrap(), None);
    }

    #[test]
    fn test_brightness_scales_to_percent() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&Frame::filled(480, 360, [255, 255, 255, 255])).unwrap();
        let brightness = engine.current_brightness().unwrap().unwrap();
        assert!((brightness - 100.0).abs() < 1e-9);

        engine.ingest(&Frame::filled(480, 360, [0, 0, 0, 255])).unwrap();
        assert_eq!(engine.current_brightness().unwrap(), Some(0.0));
    }

    #[test]
    fn test_rejects_wrong_dimensions() {
        let mut engine = VideoMotion::new(480, 360);
        assert!(engine.ingest(&Frame::filled(10, 10, [0, 0, 0, 255])).is_err());
        assert_eq!(engine.frame_number(), 0);
    }

    #[test]
    fn test_static_scene_has_no_motion() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&textured(0)).unwrap();
        engine.ingest(&textured(0)).unwrap();
        engine.refresh_global_analysis().unwrap();
        assert_eq!(engine.global_motion().amount, 0.0);
    }

    #[test]
    fn test_horizontal_shift_points_right() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&textured(0)).unwrap();
        engine.ingest(&textured(1)).unwrap();
        engine.refresh_global_analysis().unwrap();

        let global = engine.global_motion();
        assert!(global.amount > 10.0, "amount was {}", global.amount);
        assert!((global.direction - 90.0).abs() < 20.0, "direction was {}", global.direction);
    }

    #[test]
    fn test_flow_solved_once_per_frame() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&textured(0)).unwrap();
        engine.ingest(&textured(1)).unwrap();
        engine.refresh_global_analysis().unwrap();
        assert_eq!(engine.grid.as_ref().unwrap().frame_number, 2);

        // Whole-stage local pass reads the cached grid and agrees with the global one
        let mut state = MotionState::default();
        engine.compute_local_motion(&DrawableShape::new(Bounds::stage()), &mut state).unwrap();
        assert_eq!(state.motion_amount, engine.global_motion().amount);

        engine.ingest(&textured(2)).unwrap();
        engine.compute_local_motion(&DrawableShape::new(Bounds::stage()), &mut state).unwrap();
        assert_eq!(engine.grid.as_ref().unwrap().frame_number, 3);
        assert_eq!(state.last_analyzed_frame_number, 3);
    }

    #[test]
    fn test_window_span_covers_overlapping_windows() {
        // Windows start at pixel 1, so pixel 8 is still in window 0
        assert_eq!(window_span(0, 9, 59), 0..1);
        assert_eq!(window_span(8, 10, 59), 0..2);
        assert_eq!(window_span(0, 480, 59), 0..59);
        assert_eq!(window_span(470, 480, 59), 58..59);
    }

    #[test]
    fn test_local_motion_skips_already_analyzed_frame() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&textured(0)).unwrap();
        engine.ingest(&textured(1)).unwrap();

        let shape = DrawableShape::new(Bounds::new(-100.0, 100.0, -100.0, 100.0));
        let mut state = MotionState {
            last_analyzed_frame_number: engine.frame_number(),
            motion_amount: 3.0,
            motion_direction: 0.0,
        };
        engine.compute_local_motion(&shape, &mut state).unwrap();
        assert_eq!(state.motion_amount, 3.0);
    }

    #[test]
    fn test_local_motion_offstage_shape_reads_zero() {
        let mut engine = VideoMotion::new(480, 360);
        engine.ingest(&textured(0)).unwrap();
        engine.ingest(&textured(1)).unwrap();

        let shape = DrawableShape::new(Bounds::new(500.0, 600.0, 0.0, 10.0));
        let mut state = MotionState::default();
        engine.compute_local_motion(&shape, &mut state).unwrap();
        assert_eq!(state.motion_amount, 0.0);
        assert_eq!(state.last_analyzed_frame_number, 2);
    }
}
