//! Outputs and their placement in the layout.

use smithay::utils::{Logical, Physical, Point, Rectangle, Size, Transform};

use super::{Direction, Layer, LayerSurfaceId, OutputDamage, OutputId, Scene, ViewId};
use crate::utils::{center, closest_point};

/// Name prefixes of panels built into the device.
const BUILTIN_PREFIXES: [&str; 3] = ["LVDS-", "eDP-", "DSI-"];

/// What the backend reports about a new output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputInfo {
    pub name: String,
    /// Current mode, in the panel's native orientation.
    pub mode_size: Size<i32, Physical>,
    pub scale: f64,
    pub transform: Transform,
}

#[derive(Debug)]
pub struct Output {
    id: OutputId,
    name: String,
    mode_size: Size<i32, Physical>,
    scale: f64,
    transform: Transform,
    loc: Point<i32, Logical>,
    enabled: bool,
    /// Layer surfaces per layer, oldest first.
    pub(super) layers: [Vec<LayerSurfaceId>; 4],
    /// Output-local area not reserved by exclusive zones.
    pub(super) usable_area: Rectangle<i32, Logical>,
    pub(super) fullscreen_view: Option<ViewId>,
    /// Show the top layer above the fullscreen view.
    pub(super) force_shell_reveal: bool,
    pub(super) damage: OutputDamage,
    /// Whether the last frame was scanned out directly.
    pub(super) scanned_out: bool,
}

impl Output {
    fn new(info: OutputInfo, loc: Point<i32, Logical>, enabled: bool) -> Self {
        let mut output = Self {
            id: OutputId::next(),
            name: info.name,
            mode_size: info.mode_size,
            scale: info.scale,
            transform: info.transform,
            loc,
            enabled,
            layers: Default::default(),
            usable_area: Rectangle::from_size(Size::new(0, 0)),
            fullscreen_view: None,
            force_shell_reveal: false,
            damage: OutputDamage::default(),
            scanned_out: false,
        };
        output.usable_area = Rectangle::from_size(output.size());
        output
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn loc(&self) -> Point<i32, Logical> {
        self.loc
    }

    /// Size of the framebuffer in the layout orientation.
    pub fn buffer_size(&self) -> Size<i32, Physical> {
        self.transform.transform_size(self.mode_size)
    }

    /// Effective resolution in logical pixels.
    pub fn size(&self) -> Size<i32, Logical> {
        let size = self.buffer_size();
        Size::new(
            (f64::from(size.w) / self.scale) as i32,
            (f64::from(size.h) / self.scale) as i32,
        )
    }

    /// Output box in the layout.
    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        Rectangle::new(self.loc, self.size())
    }

    /// Output-local area left after exclusive zones.
    pub fn usable_area(&self) -> Rectangle<i32, Logical> {
        self.usable_area
    }

    pub fn fullscreen_view(&self) -> Option<ViewId> {
        self.fullscreen_view
    }

    pub fn force_shell_reveal(&self) -> bool {
        self.force_shell_reveal
    }

    pub fn layer_surfaces(&self, layer: Layer) -> &[LayerSurfaceId] {
        &self.layers[layer as usize]
    }

    /// Appends a layer surface to a layer list, as its most recent entry.
    pub(super) fn insert_layer_surface(&mut self, layer: Layer, id: LayerSurfaceId) {
        self.layers[layer as usize].push(id);
    }

    /// Removes a layer surface from whichever layer list holds it.
    pub(super) fn remove_layer_surface(&mut self, id: LayerSurfaceId) {
        for list in &mut self.layers {
            list.retain(|l| *l != id);
        }
    }

    pub fn damage(&self) -> &OutputDamage {
        &self.damage
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_PREFIXES
            .iter()
            .any(|prefix| self.name.starts_with(prefix))
    }
}

// =============================================================================
// Output Queries
// =============================================================================

impl Scene {
    fn layout_outputs(&self) -> impl Iterator<Item = &Output> + '_ {
        self.outputs.iter().filter(|o| o.is_enabled())
    }

    /// Returns the output under the given position and the position within that output.
    pub fn output_under(&self, pos: Point<f64, Logical>) -> Option<(OutputId, Point<f64, Logical>)> {
        let output = self
            .layout_outputs()
            .find(|o| o.geometry().to_f64().contains(pos))?;
        Some((output.id(), pos - output.loc().to_f64()))
    }

    /// Returns the output closest to `pos`.
    pub fn output_closest_to(&self, pos: Point<f64, Logical>) -> Option<OutputId> {
        self.layout_outputs()
            .map(|o| {
                let closest = closest_point(o.geometry(), pos);
                let (dx, dy) = (closest.x - pos.x, closest.y - pos.y);
                (o.id(), dx * dx + dy * dy)
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }

    fn layout_bbox(&self) -> Option<Rectangle<i32, Logical>> {
        self.layout_outputs()
            .map(|o| o.geometry())
            .reduce(|a, b| a.merge(b))
    }

    /// The output closest to the center of the layout.
    pub fn center_output(&self) -> Option<OutputId> {
        let bbox = self.layout_bbox()?;
        self.output_closest_to(center(bbox).to_f64())
    }

    /// The output a view belongs to, the one closest to the view's center.
    pub fn view_output(&self, view: ViewId) -> Option<OutputId> {
        let view = self.views.get(&view)?;
        self.output_closest_to(center(view.geometry()).to_f64())
    }

    /// The nearest output in `direction` whose extent overlaps the current one.
    pub fn output_in_direction(&self, current: OutputId, direction: Direction) -> Option<OutputId> {
        let current_geo = self.output(current)?.geometry();
        let current_center = center(current_geo);

        let extended_geo = match direction {
            Direction::Left | Direction::Right => Rectangle::new(
                Point::from((i32::MIN / 2, current_geo.loc.y)),
                Size::from((i32::MAX, current_geo.size.h)),
            ),
            Direction::Up | Direction::Down => Rectangle::new(
                Point::from((current_geo.loc.x, i32::MIN / 2)),
                Size::from((current_geo.size.w, i32::MAX)),
            ),
        };

        self.layout_outputs()
            .map(|output| (output.id(), output.geometry()))
            .filter(|(_, geo)| geo.overlaps(extended_geo))
            .filter_map(|(id, geo)| {
                let c = center(geo);
                let distance = match direction {
                    Direction::Left => current_center.x - c.x,
                    Direction::Right => c.x - current_center.x,
                    Direction::Up => current_center.y - c.y,
                    Direction::Down => c.y - current_center.y,
                };
                (distance > 0).then_some((id, distance))
            })
            .min_by_key(|(_, distance)| *distance)
            .map(|(id, _)| id)
    }
}

// =============================================================================
// Output Lifecycle
// =============================================================================

impl Scene {
    /// Adds an output reported by the backend, applying its config section.
    pub fn add_output(&mut self, mut info: OutputInfo) -> OutputId {
        let _span = tracy_client::span!("Scene::add_output");

        let (enabled, position) = {
            let config = self.config.borrow();
            match config.outputs.find(&info.name) {
                Some(c) => {
                    if let Some(scale) = c.scale {
                        if scale > 0. && scale.is_finite() {
                            info.scale = scale;
                        } else {
                            warn!("ignoring invalid scale {scale} for output {}", info.name);
                        }
                    }
                    info.transform = c.transform.into();
                    (!c.off, c.position.map(|p| Point::new(p.x, p.y)))
                }
                None => (true, None),
            }
        };

        if !(info.scale > 0. && info.scale.is_finite()) {
            warn!("output {} reported invalid scale {}, using 1", info.name, info.scale);
            info.scale = 1.;
        }

        // Place new outputs to the right of the existing ones.
        let loc = position.unwrap_or_else(|| {
            let x = self
                .layout_outputs()
                .map(|o| o.loc().x + o.size().w)
                .max()
                .unwrap_or(0);
            Point::new(x, 0)
        });

        let output = Output::new(info, loc, enabled);
        let id = output.id();
        debug!(
            "adding output {} at {:?}, size {:?}, scale {}, enabled: {enabled}",
            output.name(),
            output.loc(),
            output.size(),
            output.scale(),
        );
        self.outputs.push(output);

        self.arrange_layers(id);
        self.damage_whole_output(id);
        self.handle_layout_change();
        id
    }

    /// Removes an output. Its layer surfaces are closed and destroyed.
    pub fn remove_output(&mut self, id: OutputId) {
        let Some(output) = self.output(id) else {
            return;
        };
        debug!("removing output {}", output.name());

        let layers: Vec<_> = output.layers.iter().flatten().copied().collect();
        let fullscreen = output.fullscreen_view;

        if let Some(view) = fullscreen {
            self.set_fullscreen(view, false, None);
        }

        for layer in layers {
            self.close_layer_surface(layer);
            self.destroy_layer_surface(layer);
        }

        self.outputs.retain(|o| o.id() != id);
        self.handle_layout_change();
    }

    pub fn set_output_mode(&mut self, id: OutputId, mode_size: Size<i32, Physical>) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        output.mode_size = mode_size;
        self.output_resized(id);
    }

    pub fn set_output_scale(&mut self, id: OutputId, scale: f64) {
        if !(scale > 0. && scale.is_finite()) {
            warn!("ignoring invalid output scale {scale}");
            return;
        }
        let Some(output) = self.output_mut(id) else {
            return;
        };
        output.scale = scale;
        self.output_resized(id);
    }

    pub fn set_output_transform(&mut self, id: OutputId, transform: Transform) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        output.transform = transform;
        self.output_resized(id);
    }

    pub fn set_output_position(&mut self, id: OutputId, loc: Point<i32, Logical>) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        output.loc = loc;
        self.output_resized(id);
    }

    pub fn set_output_enabled(&mut self, id: OutputId, enabled: bool) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        if output.enabled == enabled {
            return;
        }

        debug!("output {}: enabled: {enabled}", output.name);
        output.enabled = enabled;
        output.scanned_out = false;

        if enabled {
            self.arrange_layers(id);
            self.damage_whole_output(id);
        }
        self.handle_layout_change();
    }

    /// Shows or hides the top layer above the fullscreen view.
    pub fn set_force_shell_reveal(&mut self, id: OutputId, reveal: bool) {
        let Some(output) = self.output_mut(id) else {
            return;
        };
        if output.force_shell_reveal == reveal {
            return;
        }

        debug!("output {}: force shell reveal: {reveal}", output.name);
        output.force_shell_reveal = reveal;
        self.damage_whole_output(id);
    }

    /// Blanks every output that is on and turns on every blanked one.
    pub fn toggle_outputs_blank(&mut self) {
        let outputs: Vec<_> = self.outputs.iter().map(|o| (o.id(), o.is_enabled())).collect();
        for (id, enabled) in outputs {
            self.set_output_enabled(id, !enabled);
        }
    }

    fn output_resized(&mut self, id: OutputId) {
        let Some(output) = self.output(id) else {
            return;
        };
        let geometry = output.geometry();
        let fullscreen = output.fullscreen_view;

        self.arrange_layers(id);
        if let Some(view) = fullscreen {
            self.configure_view_geometry(view, geometry);
        }
        self.damage_whole_output(id);
        self.handle_layout_change();
    }

    /// Moves views that ended up outside every output to the center of the layout.
    pub(super) fn handle_layout_change(&mut self) {
        let Some(center_output) = self.center_output().and_then(|id| self.output(id)) else {
            return;
        };
        let target = center(center_output.geometry());

        let lost: Vec<_> = self
            .stacking
            .iter()
            .filter_map(|id| self.views.get(id))
            .filter(|view| {
                !self
                    .layout_outputs()
                    .any(|o| o.geometry().overlaps(view.geometry()))
            })
            .map(|view| (view.id(), view.geometry().size))
            .collect();

        for (view, size) in lost {
            let loc = Point::new(target.x - size.w / 2, target.y - size.h / 2);
            self.move_view(view, loc);
        }
    }
}
