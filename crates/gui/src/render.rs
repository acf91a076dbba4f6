//! Software rendering of the splash
//!
//! Draws the stage checklist as four markers and the progress bar below
//! them. Text lives in the window title.

use loading_screen_core::view_model::SplashModel;
use softbuffer::{Context, SoftBufferError, Surface};
use std::num::NonZeroU32;
use std::rc::Rc;
use winit::window::Window;

const BACKGROUND: u32 = 0x0000_0000;
const TEXT_BACKGROUND: u32 = 0x0059_5959;
const BAR_COLOR: u32 = 0x0034_b233;
const BAR_BACKGROUND: u32 = 0x00ff_ffff;
const MARKER_IDLE: u32 = 0x0030_3030;

const MARGIN: u32 = 16;
const BAR_HEIGHT: u32 = 12;
const MARKER_SIZE: u32 = 14;
const MARKER_GAP: u32 = 8;

pub struct Renderer {
    // Must outlive the surface
    _context: Context<Rc<Window>>,
    surface: Surface<Rc<Window>, Rc<Window>>,
}

impl Renderer {
    pub fn new(window: Rc<Window>) -> Result<Self, SoftBufferError> {
        let context = Context::new(Rc::clone(&window))?;
        let surface = Surface::new(&context, window)?;
        Ok(Self {
            _context: context,
            surface,
        })
    }

    pub fn draw(&mut self, model: &SplashModel, width: u32, height: u32) -> Result<(), SoftBufferError> {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            // Minimized
            return Ok(());
        };
        self.surface.resize(w, h)?;

        let mut buffer = self.surface.buffer_mut()?;
        paint(model, width, height, &mut buffer);
        buffer.present()
    }
}

/// Paint the model into a `width` x `height` 0RGB pixel buffer
pub fn paint(model: &SplashModel, width: u32, height: u32, pixels: &mut [u32]) {
    pixels.fill(BACKGROUND);

    if width <= MARGIN * 2 || height <= MARGIN * 3 + BAR_HEIGHT + MARKER_SIZE + MARKER_GAP {
        return;
    }

    let bar_width = width - MARGIN * 2;
    let bar_top = height - MARGIN - BAR_HEIGHT;

    // Strip behind the checklist
    let strip_top = bar_top - MARGIN - MARKER_SIZE - MARKER_GAP;
    fill_rect(pixels, width, 0, strip_top, width, height - strip_top, TEXT_BACKGROUND);

    let marker_top = bar_top - MARKER_GAP - MARKER_SIZE;
    for (i, item) in model.items.iter().enumerate() {
        let color = if item.checked {
            BAR_COLOR
        } else if !item.suffix.is_empty() {
            BAR_BACKGROUND
        } else {
            MARKER_IDLE
        };
        let left = MARGIN + i as u32 * (MARKER_SIZE + MARKER_GAP);
        fill_rect(pixels, width, left, marker_top, MARKER_SIZE, MARKER_SIZE, color);
    }

    fill_rect(pixels, width, MARGIN, bar_top, bar_width, BAR_HEIGHT, BAR_BACKGROUND);
    let filled = (bar_width as f32 * model.progress_fraction()).round() as u32;
    fill_rect(pixels, width, MARGIN, bar_top, filled.min(bar_width), BAR_HEIGHT, BAR_COLOR);
}

fn fill_rect(pixels: &mut [u32], stride: u32, left: u32, top: u32, width: u32, height: u32, color: u32) {
    for row in top..top + height {
        let start = (row * stride + left) as usize;
        let end = start + width as usize;
        if let Some(span) = pixels.get_mut(start..end) {
            span.fill(color);
        }
    }
}
