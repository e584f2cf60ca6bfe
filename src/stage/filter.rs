use crate::error::StageError;
use crate::frame::Frame;
use crate::stage::{FramePredicate, Stage, StageContext};

/// Forwards only the frames the predicate accepts
///
/// For filtering at a stage boundary without a dedicated node, see
/// [`crate::pipeline::Pipeline::set_input_filter`] and
/// [`crate::pipeline::Pipeline::set_output_filter`].
pub struct FilterFrames {
    predicate: FramePredicate,
}

impl FilterFrames {
    pub fn new(predicate: impl FnMut(&Frame) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Keep frames carrying at least one tag of `kind`.
    pub fn with_tag(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(move |frame| frame.first_tag(&kind).is_some())
    }
}

impl Stage for FilterFrames {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if (self.predicate)(&frame) {
            ctx.output(frame);
        }
        Ok(())
    }
}
