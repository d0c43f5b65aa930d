// ============================================================================
// PREVIEW WINDOW
// ============================================================================
//
// Renders a gauge through the raster sink every frame and blits it into a
// `pixels` surface. Values arriving on the channel become the needle's target;
// the displayed value eases towards it.

use crate::config::{FaceGeometry, GaugeSpec, OutputFormat, RenderOptions};
use crate::compositor::GaugeOutput;
use crate::render::Renderer;
use crate::shape::ShapeVariant;
use crate::theme::RenderContext;
use pixels::{Pixels, SurfaceTexture};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

const TARGET_FPS: f64 = 60.0;
const EASING: f64 = 0.1;

/// Displayed value easing towards the last received one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedValue {
    pub current: f64,
    pub target: f64,
}

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        Self {
            current: value,
            target: value,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn update(&mut self) {
        self.current += (self.target - self.current) * EASING;
    }

    /// Takes the newest value waiting on the channel, then steps once.
    pub fn update_with(&mut self, receiver: &Receiver<f64>) {
        while let Ok(value) = receiver.try_recv() {
            self.set_target(value);
        }
        self.update();
    }
}

/// Opens a window showing the gauge until it is closed.
pub fn show(
    title: &str,
    renderer: Renderer,
    face: FaceGeometry,
    shape: ShapeVariant,
    spec: GaugeSpec,
    ctx: RenderContext,
    receiver: Option<Receiver<f64>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = (face.bounds_width.round() as u32, face.bounds_height.round() as u32);
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(width as f64, height as f64))
        .with_resizable(true)
        .build(&event_loop)?;
    let window = std::sync::Arc::new(window);

    let size = window.inner_size();
    let mut fb_width = size.width.max(1);
    let mut fb_height = size.height.max(1);
    let surface_texture = SurfaceTexture::new(fb_width, fb_height, &window);
    let mut pixels = Pixels::new(fb_width, fb_height, surface_texture)?;

    let mut value = AnimatedValue::new(spec.value);
    let frame_duration = Duration::from_secs_f64(1.0 / TARGET_FPS);
    let mut last_frame = Instant::now();
    let window_clone = window.clone();
    info!(title, width = fb_width, height = fb_height, "preview window opened");

    event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    fb_width = new_size.width.max(1);
                    fb_height = new_size.height.max(1);
                    let _ = pixels.resize_buffer(fb_width, fb_height);
                    let _ = pixels.resize_surface(fb_width, fb_height);
                }
                WindowEvent::RedrawRequested => {
                    match &receiver {
                        Some(receiver) => value.update_with(receiver),
                        None => value.update(),
                    }
                    let frame_spec = GaugeSpec {
                        value: value.current,
                        ..spec.clone()
                    };
                    let options = RenderOptions::builder()
                        .width(fb_width)
                        .height(fb_height)
                        .format(OutputFormat::Raster)
                        .build();
                    let out = renderer.render(&face, shape, &frame_spec, &options, &ctx);
                    if let GaugeOutput::Raster(image) = out.output {
                        let frame = pixels.frame_mut();
                        if frame.len() == image.as_raw().len() {
                            // the window has no alpha, so flatten onto white
                            for (dst, src) in frame.chunks_exact_mut(4).zip(image.as_raw().chunks_exact(4)) {
                                let a = src[3] as u32;
                                for (d, &s) in dst[..3].iter_mut().zip(&src[..3]) {
                                    *d = ((s as u32 * a + 255 * (255 - a)) / 255) as u8;
                                }
                                dst[3] = 0xff;
                            }
                        } else {
                            debug!("frame size changed mid-render, skipping blit");
                        }
                    }
                    let _ = pixels.render();
                }
                _ => {}
            },
            Event::AboutToWait => {
                if last_frame.elapsed() >= frame_duration {
                    window_clone.request_redraw();
                    last_frame = Instant::now();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_value_eases_towards_target() {
        let mut value = AnimatedValue::new(0.0);
        value.set_target(100.0);
        value.update();
        assert!((value.current - 10.0).abs() < 1e-12);
        for _ in 0..200 {
            value.update();
        }
        assert!((value.current - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_latest_channel_value_wins() {
        let (sender, receiver) = mpsc::channel();
        sender.send(20.0).unwrap();
        sender.send(80.0).unwrap();
        let mut value = AnimatedValue::new(0.0);
        value.update_with(&receiver);
        assert_eq!(value.target, 80.0);
    }
}
