use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("drawing surface unavailable ({width}x{height})")]
    SurfaceUnavailable { width: f32, height: f32 },
}
