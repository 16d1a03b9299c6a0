//! Live microphone waveform for the listening state.
//!
//! [`AudioCapture`] owns the microphone stream, the analyser graph and the
//! animation loop drawing into the canvas. All of it is released when the
//! capture is dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AnalyserNode, AudioContext, CanvasRenderingContext2d, HtmlCanvasElement, MediaStream,
    MediaStreamAudioSourceNode, MediaStreamConstraints, MediaStreamTrack, Window,
};

pub const FFT_SIZE: u32 = 2048;
const BAR_COLOR: &str = "white";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Lays out one bar per frequency bin, mirrored around the vertical centre
/// line and vertically centred. Silent bins produce no bar.
pub fn mirrored_bars(levels: &[u8], width: f64, height: f64) -> Vec<Bar> {
    if levels.is_empty() || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }

    let center_x = width / 2.0;
    let center_y = height / 2.0;
    let slot = center_x / levels.len() as f64;
    // leave a 1px gap between bars when there is room for one
    let bar_width = if slot > 2.0 { slot - 1.0 } else { slot };

    let mut bars = Vec::with_capacity(levels.len() * 2);
    for (i, &level) in levels.iter().enumerate() {
        if level == 0 {
            continue;
        }
        let bar_height = f64::from(level) / 255.0 * height;
        let y = center_y - bar_height / 2.0;
        let offset = i as f64 * slot;
        bars.push(Bar {
            x: center_x + offset,
            y,
            width: bar_width,
            height: bar_height,
        });
        bars.push(Bar {
            x: center_x - offset - slot,
            y,
            width: bar_width,
            height: bar_height,
        });
    }
    bars
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

pub struct AudioCapture {
    context: AudioContext,
    analyser: AnalyserNode,
    source: MediaStreamAudioSourceNode,
    stream: MediaStream,
    frame: Rc<Cell<Option<i32>>>,
    draw: FrameCallback,
}

impl AudioCapture {
    /// Asks for the microphone, feeds it into an analyser and starts drawing
    /// its spectrum into `canvas`. Anything acquired before a failure is
    /// released again.
    pub async fn acquire(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("window not available")?;
        let context = AudioContext::new()?;

        match Self::wire(&window, &context).await {
            Ok((analyser, source, stream)) => {
                let capture = Self {
                    context,
                    analyser,
                    source,
                    stream,
                    frame: Rc::new(Cell::new(None)),
                    draw: Rc::new(RefCell::new(None)),
                };
                capture.start_drawing(&window, canvas)?;
                Ok(capture)
            }
            Err(e) => {
                let _ = context.close();
                Err(e)
            }
        }
    }

    async fn wire(
        window: &Window,
        context: &AudioContext,
    ) -> Result<(AnalyserNode, MediaStreamAudioSourceNode, MediaStream), JsValue> {
        let analyser = context.create_analyser()?;
        analyser.set_fft_size(FFT_SIZE);

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        let promise = window
            .navigator()
            .media_devices()?
            .get_user_media_with_constraints(&constraints)?;
        let stream: MediaStream = JsFuture::from(promise).await?.dyn_into()?;

        let source = context
            .create_media_stream_source(&stream)
            .and_then(|source| {
                source.connect_with_audio_node(&analyser)?;
                Ok(source)
            })
            .inspect_err(|_| stop_tracks(&stream))?;

        Ok((analyser, source, stream))
    }

    fn start_drawing(&self, window: &Window, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2d context not available")?
            .dyn_into()?;
        canvas.set_width(canvas.offset_width().max(0) as u32);
        canvas.set_height(canvas.offset_height().max(0) as u32);

        let mut levels = vec![0u8; self.analyser.frequency_bin_count() as usize];
        let analyser = self.analyser.clone();
        let frame = Rc::clone(&self.frame);
        let draw = Rc::clone(&self.draw);
        let loop_window = window.clone();

        *self.draw.borrow_mut() = Some(Closure::new(move || {
            analyser.get_byte_frequency_data(&mut levels);
            let width = f64::from(canvas.width());
            let height = f64::from(canvas.height());
            ctx.clear_rect(0.0, 0.0, width, height);
            ctx.set_fill_style_str(BAR_COLOR);
            for bar in mirrored_bars(&levels, width, height) {
                ctx.fill_rect(bar.x, bar.y, bar.width, bar.height);
            }
            frame.set(schedule(&loop_window, &draw));
        }));

        self.frame.set(schedule(window, &self.draw));
        Ok(())
    }
}

fn schedule(window: &Window, draw: &FrameCallback) -> Option<i32> {
    let draw = draw.borrow();
    let callback = draw.as_ref()?;
    window
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        track.unchecked_into::<MediaStreamTrack>().stop();
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        if let (Some(window), Some(id)) = (web_sys::window(), self.frame.take()) {
            let _ = window.cancel_animation_frame(id);
        }
        // breaks the closure's reference back to itself
        self.draw.borrow_mut().take();
        stop_tracks(&self.stream);
        let _ = self.source.disconnect();
        let _ = self.analyser.disconnect();
        let _ = self.context.close();
    }
}
