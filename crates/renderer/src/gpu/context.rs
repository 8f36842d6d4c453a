use std::ffi::CString;
use std::num::NonZeroU32;

use anyhow::{anyhow, Result};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use crate::runtime::SyncPolicy;
use crate::types::GlVersion;

/// Window plus the GL surface and context bound to it.
///
/// Field order matters: the surface goes before the context, the window last.
pub(crate) struct GlContext {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    pub(crate) window: Window,
}

impl GlContext {
    /// Creates the window described by `window_builder` with a core-profile
    /// context of `version` made current on this thread, and loads the GL
    /// entry points.
    pub(crate) fn new(
        event_loop: &EventLoop<()>,
        window_builder: WindowBuilder,
        version: GlVersion,
    ) -> Result<(Self, glow::Context)> {
        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(event_loop, template, |configs| {
                // glutin reports an error from `find_configs` instead of
                // calling the picker with no candidates.
                most_samples(configs, |config| config.num_samples())
                    .expect("glutin only picks among non-empty config sets")
            })
            .map_err(|err| anyhow!("failed to create GL display: {err}"))?;
        let window = window.ok_or_else(|| anyhow!("display builder did not create a window"))?;
        tracing::debug!(
            samples = gl_config.num_samples(),
            "selected GL framebuffer config"
        );

        let raw_window_handle = window.raw_window_handle();
        let gl_display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                version.major(),
                version.minor(),
            ))))
            .build(Some(raw_window_handle));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .map_err(|err| anyhow!("failed to create OpenGL {version} context: {err}"))?;

        let size = window.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(size.width),
            non_zero(size.height),
        );
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|err| anyhow!("failed to create window surface: {err}"))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|err| anyhow!("failed to make GL context current: {err}"))?;

        let gl = unsafe {
            glow::Context::from_loader_function(|symbol| {
                CString::new(symbol).map_or(std::ptr::null(), |symbol| {
                    gl_display.get_proc_address(&symbol) as *const _
                })
            })
        };

        Ok((
            Self {
                surface,
                context,
                window,
            },
            gl,
        ))
    }

    pub(crate) fn resize(&self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface
            .resize(&self.context, non_zero(size.width), non_zero(size.height));
    }

    pub(crate) fn apply_sync(&self, policy: SyncPolicy) {
        let interval = match policy {
            SyncPolicy::Vsync => SwapInterval::Wait(NonZeroU32::MIN),
            SyncPolicy::Immediate => SwapInterval::DontWait,
        };
        match self.surface.set_swap_interval(&self.context, interval) {
            Ok(()) => tracing::debug!(?policy, "applied swap interval"),
            Err(err) => tracing::warn!(?policy, "failed to set swap interval: {err}"),
        }
    }

    pub(crate) fn present(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|err| anyhow!("failed to swap buffers: {err}"))
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// First candidate with the highest sample count.
fn most_samples<T>(candidates: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    candidates.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}
