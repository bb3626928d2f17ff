use eframe::egui::{Pos2, Vec2};

use super::Engine;
use super::error::EngineError;

/// Owns an engine while it is attached to a drawing surface. Releasing the
/// loop happens exactly once, either explicitly or on drop; afterwards frames
/// are ignored.
pub struct FrameLoop {
    engine: Engine,
    released: bool,
}

impl FrameLoop {
    pub fn start(engine: Engine, surface: Option<Vec2>) -> Result<Self, EngineError> {
        let size = surface.unwrap_or(Vec2::ZERO);
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(EngineError::SurfaceUnavailable {
                width: size.x,
                height: size.y,
            });
        }

        log::info!("frame loop started on {:.0}x{:.0} surface", size.x, size.y);
        Ok(Self {
            engine,
            released: false,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.released
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Runs one frame in fixed order: simulation step, `paint`, then pointer
    /// sampling against the radii just painted. Returns the hovered topic.
    pub fn frame(
        &mut self,
        now: f64,
        canvas: Vec2,
        pointer: Option<Pos2>,
        paint: impl FnOnce(&Engine),
    ) -> Option<usize> {
        if self.released || canvas.x <= 0.0 || canvas.y <= 0.0 {
            return None;
        }

        self.engine.step(now, canvas);
        paint(&self.engine);
        self.engine.sample_pointer(pointer)
    }

    /// Returns `true` only for the call that actually released the loop.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.engine.sample_pointer(None);
        log::info!("frame loop released");
        true
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use eframe::egui::vec2;

    use super::super::tests::engine;
    use super::super::LayoutKind;
    use super::*;

    #[test]
    fn missing_surface_refuses_to_start() {
        let result = FrameLoop::start(engine(LayoutKind::Grid, 3, 3), None);
        assert!(matches!(result, Err(EngineError::SurfaceUnavailable { .. })));

        let result = FrameLoop::start(engine(LayoutKind::Grid, 3, 3), Some(vec2(0.0, 200.0)));
        assert!(result.is_err());
    }

    #[test]
    fn frame_paints_after_step_and_samples_after_paint() {
        let mut frame_loop =
            FrameLoop::start(engine(LayoutKind::Grid, 3, 3), Some(vec2(600.0, 400.0)))
                .expect("surface available");
        let painted = Cell::new(0usize);
        let mut now = 0.0;
        for _ in 0..90 {
            now += 1.0 / 60.0;
            frame_loop.frame(now, vec2(600.0, 400.0), None, |engine| {
                painted.set(engine.bubbles().len());
            });
        }
        assert_eq!(painted.get(), 3);

        let target = frame_loop.engine().bubbles()[0].pos;
        let hovered = frame_loop.frame(now + 0.016, vec2(600.0, 400.0), Some(target), |_| {});
        assert_eq!(hovered, Some(frame_loop.engine().bubbles()[0].topic_index));
    }

    #[test]
    fn release_happens_exactly_once() {
        let mut frame_loop =
            FrameLoop::start(engine(LayoutKind::Grid, 3, 3), Some(vec2(600.0, 400.0)))
                .expect("surface available");
        assert!(frame_loop.release());
        assert!(!frame_loop.release());
        assert!(!frame_loop.is_active());

        let painted = Cell::new(false);
        let hovered = frame_loop.frame(1.0, vec2(600.0, 400.0), None, |_| painted.set(true));
        assert_eq!(hovered, None);
        assert!(!painted.get());
    }
}
