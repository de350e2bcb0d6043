mod common;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tabless_browser::dom::{EventTarget, DOM_DELTA_LINE};
use tabless_browser::prelude::*;
use tabless_engine::core::HostControl;
use tabless_engine::input::{Key, Modifiers, MouseWheelDelta, NativeEvent};

use common::{bridge, down, moved, pump, resized, started, MockGpu};

type Log = Rc<RefCell<Vec<String>>>;

fn gpu_page(bridge: EventBridge<MockGpu>) -> EventBridge<MockGpu> {
    bridge.with_setup(|scope| {
        let canvas = scope.browser.create_element("canvas")?;
        scope.browser.set_attribute(canvas, "id", "gfx")?;
        let body = scope.browser.document().body();
        scope.browser.document_mut().append_child(body, canvas)?;
        scope.browser.get_context(canvas, "webgpu")?;
        let format = scope.gpu().preferred_format();
        scope.canvas_context()?.configure(CanvasConfiguration::new(format));
        Ok(())
    })
}

fn canvas_of(bridge: &EventBridge<MockGpu>) -> ElementId {
    bridge.browser().document().find_element_by_id("gfx").unwrap()
}

#[test]
fn setup_runs_on_start_and_configures_at_window_size() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(800, 600, 2.0)]);

    let config = gpu.configured.clone().unwrap();
    assert_eq!((config.width, config.height), (800, 600));
    assert_eq!(config.format, wgpu::TextureFormat::Bgra8Unorm);
    assert_eq!(config.desired_maximum_frame_latency, 2);

    let window = bridge.browser().window();
    assert_eq!((window.inner_width(), window.inner_height()), (400.0, 300.0));
    assert_eq!(window.device_pixel_ratio(), 2.0);
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn setup_error_exits_with_one() {
    let mut gpu = MockGpu::default();
    let mut bridge = bridge().with_setup(|scope| {
        scope.browser.create_element("video")?;
        Ok(())
    });
    assert_eq!(bridge.handle(started(640, 480, 1.0), &mut gpu), HostControl::Exit(1));
}

#[test]
fn only_one_gpu_canvas_per_process() {
    let mut gpu = MockGpu::default();
    let results: Rc<RefCell<Vec<bool>>> = Rc::default();
    let seen = results.clone();
    let mut bridge = bridge().with_setup(move |scope| {
        let a = scope.browser.create_element("canvas")?;
        let b = scope.browser.create_element("canvas")?;
        for (canvas, id) in [(a, "webgpu"), (b, "webgpu"), (a, "webgpu")] {
            let r = scope.browser.get_context(canvas, id);
            seen.borrow_mut().push(r.is_ok());
            if let Err(e) = r {
                assert!(matches!(e, HostError::TooManyGpuCanvases));
            }
        }
        assert!(matches!(
            scope.browser.get_context(b, "webgl2"),
            Err(HostError::UnsupportedContext(id)) if id == "webgl2"
        ));
        Ok(())
    });
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);
    assert_eq!(*results.borrow(), vec![true, false, false]);
}

#[test]
fn ticks_without_callbacks_never_present() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);
    pump(&mut bridge, &mut gpu, (0..5).map(|_| NativeEvent::DrawReady));
    assert_eq!(gpu.presents, 0);
    assert_eq!(gpu.scopes_pushed, 0);

    // A callback that never asks for the texture does not present either.
    bridge.browser_mut().request_animation_frame(|_, _| Ok(()));
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(gpu.presents, 0);
    assert_eq!(bridge.frames_presented(), 0);
}

#[test]
fn texture_request_presents_exactly_once() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    bridge.browser_mut().request_animation_frame(|scope, t| {
        assert!(t >= 0.0);
        let mut ctx = scope.canvas_context()?;
        let first = ctx.get_current_texture()?;
        let again = ctx.get_current_texture()?;
        assert_eq!(first, again);
        Ok(())
    });
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady, NativeEvent::DrawReady]);

    assert_eq!(gpu.acquires, 1);
    assert_eq!(gpu.presents, 1);
    assert_eq!(bridge.frames_presented(), 1);
    assert_eq!(gpu.scope_depth, 0);
}

#[test]
fn callbacks_registered_during_a_drain_run_next_tick() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let log: Log = Rc::default();
    let l = log.clone();
    bridge.browser_mut().request_animation_frame(move |scope, _| {
        l.borrow_mut().push("first".into());
        let l = l.clone();
        scope.browser.request_animation_frame(move |_, _| {
            l.borrow_mut().push("second".into());
            Ok(())
        });
        Ok(())
    });

    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(bridge.browser().pending_frame_callbacks(), 1);

    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn resize_fires_on_the_next_tick_with_the_surface_already_resized() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let log: Log = Rc::default();
    let l = log.clone();
    bridge.browser_mut().add_window_listener("resize", move |_, event| {
        if let EventDetail::Resize { inner_width, inner_height, .. } = event.detail {
            l.borrow_mut().push(format!("resize {inner_width}x{inner_height}"));
        }
        Ok(())
    });

    let l = log.clone();
    bridge.browser_mut().request_animation_frame(move |scope, _| {
        let config = scope.canvas_context()?.surface_configuration().cloned().unwrap();
        l.borrow_mut().push(format!("frame at {}x{}", config.width, config.height));
        Ok(())
    });

    pump(&mut bridge, &mut gpu, [resized(1024, 768)]);
    // Reconfigured before any frame draws; the event itself waits for the tick.
    let config = gpu.configured.clone().unwrap();
    assert_eq!((config.width, config.height), (1024, 768));
    assert!(log.borrow().is_empty());
    assert!(bridge.resize_pending());

    let canvas = canvas_of(&bridge);
    assert_eq!(bridge.browser().document().canvas(canvas).unwrap().size(), (1024, 768));

    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(*log.borrow(), vec!["resize 1024x768", "frame at 1024x768"]);
    assert!(!bridge.resize_pending());
}

#[test]
fn resize_stays_pending_until_a_tick_with_callbacks() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0), resized(700, 500)]);
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert!(bridge.resize_pending());

    bridge.browser_mut().request_animation_frame(|_, _| Ok(()));
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert!(!bridge.resize_pending());
}

#[test]
fn resize_listener_can_resize_the_canvas() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let canvas = canvas_of(&bridge);
    bridge.browser_mut().add_window_listener("resize", move |scope, _| {
        // Render at half resolution, the way pages size canvases from innerWidth.
        let window = scope.browser.window();
        let (w, h) = (window.inner_width() / 2.0, window.inner_height() / 2.0);
        scope.browser.set_canvas_size(canvas, w as u32, h as u32)?;
        Ok(())
    });
    bridge.browser_mut().request_animation_frame(|scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        Ok(())
    });

    pump(&mut bridge, &mut gpu, [resized(1000, 800), NativeEvent::DrawReady]);
    assert_eq!(bridge.browser().document().canvas(canvas).unwrap().size(), (500, 400));
    let config = gpu.configured.clone().unwrap();
    assert_eq!((config.width, config.height), (500, 400));
    assert_eq!(gpu.presents, 1);
}

#[test]
fn listener_errors_are_not_fatal() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let log: Log = Rc::default();
    let canvas = canvas_of(&bridge);
    bridge
        .browser_mut()
        .add_event_listener(canvas, "pointerdown", |_, _| Err(anyhow::anyhow!("boom")))
        .unwrap();
    let l = log.clone();
    bridge
        .browser_mut()
        .add_event_listener(canvas, "pointerdown", move |_, _| {
            l.borrow_mut().push("second".into());
            Ok(())
        })
        .unwrap();

    assert_eq!(bridge.handle(down(1.0, 1.0), &mut gpu), HostControl::Continue);
    assert_eq!(*log.borrow(), vec!["second"]);
    assert_eq!(bridge.browser().listener_count(EventTarget::Element(canvas), "pointerdown"), 2);
}

#[test]
fn minimized_window_keeps_callbacks_until_restored() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);
    let configures = gpu.configure_log.len();

    pump(&mut bridge, &mut gpu, [resized(0, 0)]);
    assert_eq!(gpu.configure_log.len(), configures);

    let frames: Log = Rc::default();
    let f = frames.clone();
    bridge.browser_mut().request_animation_frame(move |scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        f.borrow_mut().push("drawn".into());
        Ok(())
    });

    assert_eq!(bridge.handle(NativeEvent::DrawReady, &mut gpu), HostControl::Continue);
    assert_eq!(bridge.handle(NativeEvent::DrawReady, &mut gpu), HostControl::Continue);
    assert!(frames.borrow().is_empty());
    assert_eq!(bridge.browser().pending_frame_callbacks(), 1);
    assert!(bridge.resize_pending());
    assert_eq!(gpu.scopes_pushed, 0);
    assert_eq!(gpu.presents, 0);

    pump(&mut bridge, &mut gpu, [resized(320, 200), NativeEvent::DrawReady]);
    assert_eq!(gpu.configured.as_ref().map(|c| c.width), Some(320));
    assert_eq!(*frames.borrow(), vec!["drawn"]);
    assert_eq!(gpu.presents, 1);
    assert!(!bridge.resize_pending());
}

#[test]
fn pointer_events_come_in_pairs_with_movement() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let log: Log = Rc::default();
    let canvas = canvas_of(&bridge);
    for ty in ["pointerdown", "mousedown", "pointermove", "mousemove"] {
        let l = log.clone();
        bridge
            .browser_mut()
            .add_event_listener(canvas, ty, move |_, event| {
                let p = event.pointer().unwrap();
                l.borrow_mut().push(format!(
                    "{} {},{} d{},{} b{} bs{}",
                    event.event_type, p.client_x, p.client_y, p.movement_x, p.movement_y, p.button, p.buttons
                ));
                Ok(())
            })
            .unwrap();
    }

    pump(&mut bridge, &mut gpu, [down(100.0, 50.0), moved(110.0, 60.0)]);
    assert_eq!(
        *log.borrow(),
        vec![
            "pointerdown 100,50 d0,0 b0 bs1",
            "mousedown 100,50 d0,0 b0 bs1",
            "pointermove 110,60 d10,10 b-1 bs1",
            "mousemove 110,60 d10,10 b-1 bs1",
        ]
    );
}

#[test]
fn focus_loss_releases_held_buttons() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let buttons: Rc<RefCell<Vec<u16>>> = Rc::default();
    let b = buttons.clone();
    let canvas = canvas_of(&bridge);
    bridge
        .browser_mut()
        .add_event_listener(canvas, "pointermove", move |_, event| {
            b.borrow_mut().push(event.pointer().unwrap().buttons);
            Ok(())
        })
        .unwrap();

    // The release happens in another window after an alt-tab.
    pump(
        &mut bridge,
        &mut gpu,
        [down(10.0, 10.0), moved(12.0, 10.0), NativeEvent::FocusLost, moved(14.0, 10.0)],
    );
    assert_eq!(*buttons.borrow(), vec![1, 0]);
}

#[test]
fn pointer_events_without_gpu_canvas_are_dropped() {
    let mut gpu = MockGpu::default();
    let mut bridge = bridge();
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0), down(1.0, 1.0), moved(2.0, 2.0)]);
    assert_eq!(bridge.state(), BridgeState::Idle);
}

#[test]
fn wheel_uses_dom_sign_and_mode() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let seen: Rc<RefCell<Vec<(String, f64, u32)>>> = Rc::default();
    let canvas = canvas_of(&bridge);
    for ty in ["wheel", "mousewheel"] {
        let s = seen.clone();
        bridge
            .browser_mut()
            .add_event_listener(canvas, ty, move |_, event| {
                let w = event.wheel().unwrap();
                s.borrow_mut().push((event.event_type.clone(), w.delta_y, w.delta_mode));
                Ok(())
            })
            .unwrap();
    }

    let wheel = NativeEvent::Wheel {
        delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 },
        x: 5.0,
        y: 5.0,
        modifiers: Modifiers::default(),
    };
    pump(&mut bridge, &mut gpu, [wheel]);
    assert_eq!(
        *seen.borrow(),
        vec![
            ("wheel".to_string(), -1.0, DOM_DELTA_LINE),
            ("mousewheel".to_string(), -1.0, DOM_DELTA_LINE),
        ]
    );
}

#[test]
fn keys_and_quit_map_to_exit_codes() {
    let mut gpu = MockGpu::default();
    let mut bridge = bridge();
    let key = |key| NativeEvent::KeyDown { key, modifiers: Modifiers::default(), repeat: false };

    assert_eq!(bridge.handle(key(Key::Character('a')), &mut gpu), HostControl::Continue);
    assert_eq!(bridge.handle(key(Key::Escape), &mut gpu), HostControl::Exit(0));
    assert_eq!(bridge.handle(key(Key::Character('q')), &mut gpu), HostControl::Exit(1));
    assert_eq!(bridge.handle(NativeEvent::Quit, &mut gpu), HostControl::Exit(0));
}

#[test]
fn validation_error_terminates_with_one() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    bridge.browser_mut().request_animation_frame(|scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        Ok(())
    });
    gpu.validation_error = Some("Buffer usage mismatch".into());
    assert_eq!(bridge.handle(NativeEvent::DrawReady, &mut gpu), HostControl::Exit(1));
    assert_eq!(gpu.scope_depth, 0);
}

#[test]
fn validation_scopes_can_be_disabled() {
    let mut gpu = MockGpu::default();
    let options = BridgeOptions { validation_scopes: false, ..BridgeOptions::default() };
    let mut bridge = gpu_page(EventBridge::new(common::browser(), options));
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    bridge.browser_mut().request_animation_frame(|_, _| Ok(()));
    gpu.validation_error = Some("ignored".into());
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(gpu.scopes_pushed, 0);
}

#[test]
fn callback_error_abandons_the_batch() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    let ran: Log = Rc::default();
    let r = ran.clone();
    bridge
        .browser_mut()
        .request_animation_frame(|_, _| Err(anyhow::anyhow!("shader compile failed")));
    bridge.browser_mut().request_animation_frame(move |_, _| {
        r.borrow_mut().push("later".into());
        Ok(())
    });

    assert_eq!(bridge.handle(NativeEvent::DrawReady, &mut gpu), HostControl::Exit(1));
    assert!(ran.borrow().is_empty());
    assert_eq!(gpu.scope_depth, 0);
}

#[test]
fn callback_error_still_collects_the_validation_error() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(640, 480, 1.0)]);

    bridge.browser_mut().request_animation_frame(|scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        Err(anyhow::anyhow!("draw failed"))
    });
    gpu.validation_error = Some("Texture view format mismatch".into());

    assert_eq!(bridge.handle(NativeEvent::DrawReady, &mut gpu), HostControl::Exit(1));
    assert_eq!(gpu.scope_depth, 0);
    assert_eq!(gpu.validation_error, None);
    assert_eq!(gpu.presents, 0);
}

#[test]
fn overlay_is_uploaded_before_present() {
    let mut gpu = MockGpu::default();
    let mut bridge = gpu_page(bridge());
    pump(&mut bridge, &mut gpu, [started(64, 32, 1.0)]);

    let canvas = canvas_of(&bridge);
    let browser = bridge.browser_mut();
    browser.get_context(canvas, "2d").unwrap();
    let raster = browser.raster_mut(canvas).unwrap();
    raster.set_fill_style("#ff0000");
    raster.fill_rect(0.0, 0.0, 4.0, 4.0);

    bridge.browser_mut().request_animation_frame(|scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        Ok(())
    });
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);

    let writes = gpu.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].bytes_per_row, Some(4 * 64));
    assert_eq!((writes[0].size.width, writes[0].size.height), (64, 32));
    assert_eq!(&writes[0].data[..4], &[255, 0, 0, 255]);
    assert_eq!(gpu.presents, 1);

    // Unchanged pixels are not uploaded again.
    bridge.browser_mut().request_animation_frame(|scope, _| {
        scope.canvas_context()?.get_current_texture()?;
        Ok(())
    });
    pump(&mut bridge, &mut gpu, [NativeEvent::DrawReady]);
    assert_eq!(gpu.writes().len(), 1);
    assert_eq!(gpu.presents, 2);
}
