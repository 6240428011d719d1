//! Display sink at the end of the pipeline.
//!
//! Mirrors the fragment stage's output into its own frame: FRAGMENT sets a
//! pixel, CLEAR_FB clears the frame and SYNC completes it. Completed frames
//! can be dumped as PNG files. The pipeline's origin is the lower-left
//! corner, so images are written with the Y axis flipped.

use std::io::Read;
use std::path::{Path, PathBuf};

use ffp_twin_core::color::argb_to_rgba8;
use ffp_twin_core::{Command, CommandReader, Fragment, Opcode, PipeError};
use image::RgbaImage;

/// Commands the display understands.
pub const DECODE_TABLE: &[Opcode] = &[Opcode::Fragment, Opcode::ClearFramebuffer, Opcode::Sync];

/// Counters reported when the display's input closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayReport {
    /// SYNC commands seen.
    pub frames: u64,
    /// FRAGMENT commands applied.
    pub fragments: u64,
    /// Commands logged and dropped.
    pub ignored: u64,
}

/// Display frame and counters.
#[derive(Debug, Clone)]
pub struct Display {
    width: u32,
    height: u32,
    frame: Vec<u32>,
    frame_dir: Option<PathBuf>,
    report: DisplayReport,
}

impl Display {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; width as usize * height as usize],
            frame_dir: None,
            report: DisplayReport::default(),
        }
    }

    /// Dump every completed frame as `frame_NNNNN.png` into `dir`.
    pub fn with_frame_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frame_dir = Some(dir.into());
        self
    }

    pub fn report(&self) -> DisplayReport {
        self.report
    }

    /// Row-major ARGB pixels, row 0 at the bottom.
    pub fn frame(&self) -> &[u32] {
        &self.frame
    }

    pub fn put_fragment(&mut self, frag: &Fragment) -> Result<(), PipeError> {
        let (x, y) = (frag.x as u32, frag.y as u32);
        if x >= self.width || y >= self.height {
            return Err(PipeError::FragmentOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.frame[y as usize * self.width as usize + x as usize] = frag.color;
        self.report.fragments += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.frame.fill(0);
    }

    /// The current frame as an image, top row first.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let row = (self.height - 1 - y) as usize;
            image::Rgba(argb_to_rgba8(self.frame[row * self.width as usize + x as usize]))
        })
    }

    /// Write the current frame to `path` as PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), PipeError> {
        self.to_image()
            .save(path)
            .map_err(|e| PipeError::Io(std::io::Error::other(e)))
    }

    fn end_frame(&mut self) -> Result<(), PipeError> {
        self.report.frames += 1;
        log::info!("display: frame {}", self.report.frames);
        if let Some(dir) = &self.frame_dir {
            let path = dir.join(format!("frame_{:05}.png", self.report.frames));
            self.save_png(&path)?;
            log::debug!("display: wrote {}", path.display());
        }
        Ok(())
    }

    /// Apply one command from the fragment stage.
    pub fn apply(&mut self, cmd: Command) -> Result<(), PipeError> {
        match cmd {
            Command::Fragment(frag) => self.put_fragment(&frag)?,
            Command::ClearFramebuffer => self.clear(),
            Command::Sync => self.end_frame()?,
            other => {
                log::warn!("display: unexpected command {:#010X}", other.word());
                self.report.ignored += 1;
            }
        }
        Ok(())
    }

    /// Consume `input` until it closes.
    pub fn run<R: Read>(&mut self, input: R) -> Result<DisplayReport, PipeError> {
        let mut reader = CommandReader::new(input);
        while let Some(cmd) = reader.next_command(DECODE_TABLE)? {
            self.apply(cmd)?;
        }
        log::info!(
            "display: input closed after {} frames, {} fragments",
            self.report.frames,
            self.report.fragments
        );
        Ok(self.report)
    }
}
