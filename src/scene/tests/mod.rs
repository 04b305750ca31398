use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use pocketwm_config::Config;
use smithay::utils::{Logical, Physical, Point, Rectangle, Size, Transform};

use super::*;
use crate::utils::region::Region;
use crate::window::{Toplevel, XdgToplevel, XwaylandSurface};

mod arrange;
mod hit_test;
mod render;

const FRAME_TIME: Duration = Duration::from_millis(16);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

fn prect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Physical> {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

fn output_info(name: &str, w: i32, h: i32) -> OutputInfo {
    OutputInfo {
        name: name.to_owned(),
        mode_size: Size::new(w, h),
        scale: 1.,
        transform: Transform::Normal,
    }
}

fn layer_state(
    layer: Layer,
    anchor: Anchor,
    exclusive_zone: i32,
    size: (i32, i32),
) -> LayerSurfaceState {
    LayerSurfaceState {
        anchor,
        exclusive_zone,
        desired_size: Size::from(size),
        ..LayerSurfaceState::new(layer)
    }
}

fn surface(w: i32, h: i32) -> Surface {
    Surface::new(SurfaceId::next(), SurfaceState::with_size(Size::new(w, h)))
}

/// A scene with one seat and one 1000×800 output.
struct Fixture {
    scene: Scene,
    output: OutputId,
    seat: SeatId,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(config: Config) -> Self {
        init_logging();

        let mut scene = Scene::new(Rc::new(RefCell::new(config)));
        let seat = scene.add_seat("seat0");
        let output = scene.add_output(output_info("DSI-1", 1000, 800));

        Self {
            scene,
            output,
            seat,
        }
    }

    fn output(&self) -> &Output {
        self.scene.output(self.output).unwrap()
    }

    fn view(&self, id: ViewId) -> &View {
        self.scene.view(id).unwrap()
    }

    fn add_view(&mut self, w: i32, h: i32) -> (ViewId, SurfaceId) {
        self.map(Toplevel::Xdg(XdgToplevel::new()), w, h)
    }

    fn add_xwayland_view(&mut self, w: i32, h: i32) -> (ViewId, SurfaceId) {
        self.map(Toplevel::Xwayland(XwaylandSurface::new()), w, h)
    }

    fn map(&mut self, toplevel: Toplevel, w: i32, h: i32) -> (ViewId, SurfaceId) {
        let view = self.scene.add_view(toplevel);
        let root = surface(w, h);
        let id = root.id();
        self.scene.map_view(view, root);
        self.settle();
        (view, id)
    }

    fn add_layer(&mut self, namespace: &str, state: LayerSurfaceState) -> (LayerSurfaceId, SurfaceId) {
        let size = state.desired_size;
        let root = surface(size.w.max(1), size.h.max(1));
        let surface_id = root.id();
        let id = self
            .scene
            .add_layer_surface(namespace, Some(self.output), state, root)
            .unwrap();
        self.scene.map_layer_surface(id);

        // Attach a buffer of the configured size, like a real client would.
        let geometry = self.scene.layer_surface(id).unwrap().geometry();
        self.scene
            .commit_surface(surface_id, SurfaceState::with_size(geometry.size));
        (id, surface_id)
    }

    /// Answers every configure like a well-behaved client: ack, then commit a buffer of the
    /// configured size. Other client requests are dropped.
    fn settle(&mut self) {
        for _ in 0..8 {
            let configures: Vec<_> = self
                .scene
                .take_client_requests()
                .into_iter()
                .filter_map(|request| match request {
                    ClientRequest::ConfigureView {
                        view, serial, size, ..
                    } => Some((view, serial, size)),
                    _ => None,
                })
                .collect();
            if configures.is_empty() {
                return;
            }

            for (view, serial, size) in configures {
                if let Some(serial) = serial {
                    self.scene.ack_configure(view, serial);
                }
                self.scene.commit_view(view, SurfaceState::with_size(size));
            }
        }
    }

    fn render(&mut self, backend: &mut TestBackend) -> RenderResult {
        self.scene.render_output(self.output, backend, FRAME_TIME)
    }

    /// Renders until the output has no damage left, forgetting what was drawn.
    fn flush(&mut self) {
        let mut backend = TestBackend::default();
        self.render(&mut backend);
        self.scene.take_client_requests();
        self.scene.take_events();
    }

    fn damage(&self) -> Vec<Rectangle<i32, Physical>> {
        self.output().damage().region().rects().to_vec()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BackendOp {
    Scanout(SurfaceId),
    Begin(Size<i32, Physical>),
    Clear(Vec<Rectangle<i32, Physical>>, [f32; 4]),
    Surface(SurfaceElement),
    Decoration(Rectangle<i32, Physical>, [f32; 4]),
    Cursors,
    End,
    Commit(Vec<Rectangle<i32, Physical>>),
}

/// Records what the scene asks of an output.
#[derive(Default)]
struct TestBackend {
    ops: Vec<BackendOp>,
    allow_scanout: bool,
    software_cursor: bool,
    fail_commit: bool,
    names: HashMap<SurfaceId, &'static str>,
}

impl TestBackend {
    fn scanning_out() -> Self {
        Self {
            allow_scanout: true,
            ..Self::default()
        }
    }

    fn name(&mut self, surface: SurfaceId, name: &'static str) {
        self.names.insert(surface, name);
    }

    fn surface_name(&self, surface: SurfaceId) -> String {
        self.names
            .get(&surface)
            .map_or_else(|| surface.to_string(), |name| name.to_string())
    }

    /// One line per recorded call.
    fn log(&self) -> String {
        fn rects(rects: &[Rectangle<i32, Physical>]) -> String {
            if rects.is_empty() {
                return String::from("-");
            }
            rects
                .iter()
                .map(|r| format!("{},{} {}x{}", r.loc.x, r.loc.y, r.size.w, r.size.h))
                .collect::<Vec<_>>()
                .join(" + ")
        }

        self.ops
            .iter()
            .map(|op| match op {
                BackendOp::Scanout(surface) => format!("scanout {}", self.surface_name(*surface)),
                BackendOp::Begin(size) => format!("begin {}x{}", size.w, size.h),
                BackendOp::Clear(r, color) => format!("clear {} {color:?}", rects(r)),
                BackendOp::Surface(element) => {
                    format!("surface {}", self.surface_name(element.surface))
                }
                BackendOp::Decoration(dst, _) => format!("decoration {}", rects(&[*dst])),
                BackendOp::Cursors => String::from("cursors"),
                BackendOp::End => String::from("end"),
                BackendOp::Commit(r) => format!("commit {}", rects(r)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn drawn(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BackendOp::Surface(element) => Some(self.surface_name(element.surface)),
                _ => None,
            })
            .collect()
    }
}

impl OutputBackend for TestBackend {
    fn software_cursor_visible(&self, _output: OutputId) -> bool {
        self.software_cursor
    }

    fn scanout(&mut self, _output: OutputId, surface: SurfaceId) -> bool {
        if !self.allow_scanout {
            return false;
        }
        self.ops.push(BackendOp::Scanout(surface));
        true
    }

    fn begin(&mut self, _output: OutputId, size: Size<i32, Physical>) {
        self.ops.push(BackendOp::Begin(size));
    }

    fn clear(&mut self, rects: &[Rectangle<i32, Physical>], color: [f32; 4]) {
        self.ops.push(BackendOp::Clear(rects.to_vec(), color));
    }

    fn draw_surface(&mut self, element: &SurfaceElement, _damage: &[Rectangle<i32, Physical>]) {
        self.ops.push(BackendOp::Surface(element.clone()));
    }

    fn draw_decoration(
        &mut self,
        dst: Rectangle<i32, Physical>,
        _rotation: f32,
        color: [f32; 4],
        _damage: &[Rectangle<i32, Physical>],
    ) {
        self.ops.push(BackendOp::Decoration(dst, color));
    }

    fn render_software_cursors(&mut self, _output: OutputId, _damage: &Region<Physical>) {
        self.ops.push(BackendOp::Cursors);
    }

    fn end(&mut self) {
        self.ops.push(BackendOp::End);
    }

    fn commit(&mut self, _output: OutputId, damage: &Region<Physical>) -> anyhow::Result<()> {
        if self.fail_commit {
            anyhow::bail!("output is gone");
        }
        self.ops.push(BackendOp::Commit(damage.rects().to_vec()));
        Ok(())
    }
}
