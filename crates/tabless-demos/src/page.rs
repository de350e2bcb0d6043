//! The demo page: a clear colour cycling through hues, nudged by pointer
//! drags and the wheel, with an optional image drawn on the canvas' 2D
//! overlay.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use tabless_browser::prelude::*;
use tabless_engine::device::{AcquireError, WgpuBackend};

use crate::overlay::OverlayPass;

type PageScope<'a> = Scope<'a, WgpuBackend>;

/// Degrees per second.
const HUE_SPEED: f64 = 24.0;

struct Page {
    canvas: ElementId,
    hue_offset: f64,
    lightness: f64,
    image: Option<ElementId>,
    /// Canvas size the image was last drawn at; resizing clears the raster.
    image_drawn_at: Option<(u32, u32)>,
    overlay: Option<OverlayPass>,
}

type Shared = Rc<RefCell<Page>>;

pub fn setup(scope: &mut PageScope<'_>, image_src: Option<&str>) -> anyhow::Result<()> {
    let canvas = scope.browser.create_element("canvas")?;
    scope.browser.set_attribute(canvas, "id", "gfx")?;
    let body = scope.browser.document().body();
    scope.browser.document_mut().append_child(body, canvas)?;

    scope.browser.get_context(canvas, "webgpu")?;
    let format = scope.gpu().preferred_format();
    scope
        .canvas_context()?
        .configure(CanvasConfiguration::new(format));

    let mut page = Page {
        canvas,
        hue_offset: 0.0,
        lightness: 0.5,
        image: None,
        image_drawn_at: None,
        overlay: None,
    };

    if let Some(src) = image_src {
        scope.browser.get_context(canvas, "2d")?;
        let img = scope.browser.create_element("img")?;
        let src_owned = src.to_string();
        scope.browser.add_event_listener(img, "error", move |_, _| {
            log::warn!("demo image {src_owned} did not load");
            Ok(())
        })?;
        scope.browser.set_image_src(img, src)?;
        page.image = Some(img);
        page.overlay = Some(OverlayPass::new(scope, format));
    }

    let page: Shared = Rc::new(RefCell::new(page));
    add_listeners(scope, &page)?;

    log::info!("demo page ready, canvas format {format:?}");
    request_frame(scope, page);
    Ok(())
}

fn add_listeners(scope: &mut PageScope<'_>, page: &Shared) -> anyhow::Result<()> {
    let canvas = page.borrow().canvas;

    let drag = page.clone();
    scope.browser.add_event_listener(canvas, "pointermove", move |_, event| {
        if let Some(p) = event.pointer().filter(|p| p.buttons & 1 != 0) {
            drag.borrow_mut().hue_offset += p.movement_x * 0.5;
        }
        Ok(())
    })?;

    let wheel = page.clone();
    scope.browser.add_event_listener(canvas, "wheel", move |_, event| {
        if let Some(w) = event.wheel() {
            let step = if w.delta_mode == tabless_browser::dom::DOM_DELTA_LINE { 0.02 } else { 0.001 };
            let mut page = wheel.borrow_mut();
            page.lightness = (page.lightness - w.delta_y * step).clamp(0.1, 0.9);
        }
        Ok(())
    })?;

    scope.browser.add_window_listener("resize", |_, event| {
        if let EventDetail::Resize { inner_width, inner_height, device_pixel_ratio } = event.detail {
            log::info!("resize to {inner_width}x{inner_height} @{device_pixel_ratio}x");
        }
        Ok(())
    });
    Ok(())
}

fn request_frame(scope: &mut PageScope<'_>, page: Shared) {
    scope
        .browser
        .request_animation_frame(move |scope, t| frame(scope, t, page));
}

fn frame(scope: &mut PageScope<'_>, t: f64, page: Shared) -> anyhow::Result<()> {
    {
        let mut state = page.borrow_mut();
        draw_image(scope, &mut state)?;

        let hue = (t / 1000.0 * HUE_SPEED + state.hue_offset).rem_euclid(360.0);
        let [r, g, b] = hsl_to_rgb(hue, 0.6, state.lightness);

        let mut ctx = scope.canvas_context()?;
        let target = match ctx.get_current_texture() {
            Ok(texture) => texture,
            // Zero-sized canvas: try again next frame.
            Err(HostError::Surface(AcquireError::Skipped(reason))) => {
                log::trace!("frame skipped: {reason}");
                drop(ctx);
                drop(state);
                request_frame(scope, page);
                return Ok(());
            }
            Err(e) => return Err(e).context("getCurrentTexture"),
        };
        let overlay = state.image.is_some().then(|| ctx.overlay_texture());
        drop(ctx);

        let gpu = scope.gpu();
        let backend = gpu.backend();
        let device = backend.device();
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tabless demo frame"),
        });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tabless demo clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        if let (Some(pass), Some(overlay)) = (state.overlay.as_mut(), overlay.as_ref()) {
            pass.draw(device, &mut encoder, &view, overlay);
        }
        backend.queue().submit(std::iter::once(encoder.finish()));
    }

    request_frame(scope, page);
    Ok(())
}

/// Draws the loaded image centred on the 2D overlay, once per canvas size.
fn draw_image(scope: &mut PageScope<'_>, page: &mut Page) -> anyhow::Result<()> {
    let Some(img) = page.image else {
        return Ok(());
    };
    let size = scope.browser.document().canvas(page.canvas)?.size();
    if page.image_drawn_at == Some(size) {
        return Ok(());
    }
    let Some(decoded) = scope.browser.document().image(img)?.decoded().cloned() else {
        return Ok(());
    };

    let dx = (size.0 as i64 - decoded.width as i64) / 2;
    let dy = (size.1 as i64 - decoded.height as i64) / 2;
    scope.browser.raster_mut(page.canvas)?.draw_image(&decoded, dx, dy)?;
    page.image_drawn_at = Some(size);
    log::debug!("drew {}x{} image at {dx},{dy}", decoded.width, decoded.height);
    Ok(())
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [f64; 3] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [r + m, g + m, b + m]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        let close = |a: [f64; 3], b: [f64; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9);
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgb(90.0, 0.0, 0.25), [0.25, 0.25, 0.25]));
    }
}
