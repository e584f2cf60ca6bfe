use crate::error::StageError;
use crate::frame::Frame;
use crate::stage::{Stage, StageContext};

/// Forwards every frame unchanged; useful as a fan-out point.
#[derive(Debug, Default)]
pub struct Multiplex;

impl Multiplex {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Multiplex {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        ctx.output(frame);
        Ok(())
    }
}
