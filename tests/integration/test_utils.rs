//! Shared helpers for integration tests: image fixtures and recording stages.

use bamboo::error::StageError;
use bamboo::frame::Frame;
use bamboo::stage::{Stage, StageContext};
use image::{DynamicImage, RgbImage};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Gradient test image; a distinct `seed` gives distinct pixels.
pub fn test_image(width: u32, height: u32, seed: u8) -> DynamicImage {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) as u8).wrapping_add(seed),
        ])
    });
    DynamicImage::ImageRgb8(image)
}

/// Write a gradient image to `dir/name`; the extension picks the format.
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    test_image(width, height, 0).save(&path).unwrap();
    path
}

/// Stage that records every frame it receives and forwards it
pub struct Recorder {
    name: String,
    seen: Rc<RefCell<Vec<Frame>>>,
}

impl Recorder {
    pub fn new(name: &str) -> (Self, Rc<RefCell<Vec<Frame>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                name: name.to_string(),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl Stage for Recorder {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        self.seen.borrow_mut().push(frame.clone());
        ctx.output(frame);
        Ok(())
    }
}

/// Stage that emits every frame `copies` times
pub struct Repeat {
    pub copies: usize,
}

impl Stage for Repeat {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        for _ in 0..self.copies {
            ctx.output(frame.copy());
        }
        Ok(())
    }
}

/// Stage that decodes each frame, so unreadable inputs fail here
pub struct Decode;

impl Stage for Decode {
    fn process(&mut self, frame: Frame, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        frame.image(ctx.cache())?;
        ctx.output(frame);
        Ok(())
    }
}
