use lattice_engine::core::{App, AppControl, FrameCtx};
use lattice_engine::render::{FrameOutcome, FrameRenderer};
use lattice_engine::RendererConfig;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Frames between "fps" log lines.
const REPORT_EVERY: u64 = 600;

/// Spinning cube grid. The renderer is built on the first frame, once the
/// surface format is known.
pub struct CubesApp {
    config: RendererConfig,
    renderer: Option<FrameRenderer>,
    skipped: u64,
}

impl CubesApp {
    pub fn new(config: RendererConfig) -> Self {
        Self { config, renderer: None, skipped: 0 }
    }
}

impl App for CubesApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => AppControl::Exit,
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.renderer.is_none() {
            let created = FrameRenderer::new(&ctx.render_ctx(), &self.config);
            match created {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(err) => {
                    ctx.runtime.fail(anyhow::Error::new(err).context("renderer setup failed"));
                    return AppControl::Exit;
                }
            }
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Exit;
        };

        ctx.pre_present();
        match renderer.render_frame(ctx.gpu, ctx.time.elapsed) {
            Ok(FrameOutcome::Presented) => {}
            Ok(FrameOutcome::Skipped) => self.skipped += 1,
            Err(err) if err.is_fatal() => {
                let frame = ctx.time.frame_index;
                ctx.runtime.fail(anyhow::Error::new(err).context(format!("frame {frame} failed")));
                return AppControl::Exit;
            }
            Err(err) => log::warn!("frame {} dropped: {err}", ctx.time.frame_index),
        }

        if ctx.time.frame_index > 0 && ctx.time.frame_index % REPORT_EVERY == 0 {
            log::info!(
                "frame {}: {:.1} fps, {} skipped",
                ctx.time.frame_index,
                1.0 / ctx.time.dt.max(f32::EPSILON),
                self.skipped
            );
        }

        AppControl::Continue
    }
}
