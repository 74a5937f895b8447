use foundation::bounds::{HeightRange, ImageSize, MapDefinition, WorldBounds};
use foundation::color::{Colour, HeightColourMap};
use foundation::handles::Handle;
use foundation::math::{CanvasProjection, CanvasSize, Vec2, ViewTransform};
use formats::{EntityTypeRecord, MapPackage};
use layers::symbology::EntityTypeSet;
use layers::zipline::{ZipSegment, ZiplineKeys, ZiplineLayer};
use render::{IconCache, IconRequest, PaintInputs, PaintOptions, RenderFrame, SkipReason, paint_frame};
use runtime::{Frame, FrameHost, RedrawScheduler};
use scene::components::format_number;
use scene::entity::Entity;
use scene::picking::{PickOptions, pick_screen};
use scene::query::{AvailableValues, EntityPredicate, KeyFilter, PropertyFilters, RangeGate};
use scene::world::{DatasetInfo, EntityDataset, World};
use settings::ViewerSettings;

use crate::tooltip::Tooltip;

/// Single owner of all map state.
///
/// `H` receives frame-scheduling calls; `I` is whatever image handle the embedder uses
/// for loaded icons. Every mutating operation that changes what is on screen requests a
/// redraw; repeated requests before the next frame collapse into one paint.
pub struct MapViewer<H, I = ()> {
    settings: ViewerSettings,
    host: H,
    scheduler: RedrawScheduler,

    map: Option<MapDefinition>,
    image: Option<ImageSize>,
    canvas: CanvasSize,
    view: ViewTransform,

    world: World,
    available: AvailableValues,
    filters: PropertyFilters,
    colours: HeightColourMap,
    hide_out_of_range: bool,

    types: EntityTypeSet,
    icons: IconCache<I>,
    ziplines: ZiplineLayer,
}

impl<H: FrameHost, I> MapViewer<H, I> {
    pub fn new(settings: ViewerSettings, host: H) -> Self {
        let colours = HeightColourMap::new(
            HeightRange::default(),
            Colour::from(settings.heights.below_colour.as_str()),
            Colour::from(settings.heights.above_colour.as_str()),
        );
        let z = &settings.ziplines;
        let keys = ZiplineKeys {
            class_field: z.class_field.clone(),
            start_marker: z.start_marker.clone(),
            end_marker: z.end_marker.clone(),
            link_field: z.link_field.clone(),
        };
        Self {
            filters: PropertyFilters::new(settings.filters.property_keys.iter().cloned()),
            hide_out_of_range: settings.heights.hide_out_of_range,
            host,
            scheduler: RedrawScheduler::new(),
            map: None,
            image: None,
            canvas: CanvasSize::new(0.0, 0.0),
            view: ViewTransform::identity(),
            world: World::new(),
            available: AvailableValues::default(),
            colours,
            types: EntityTypeSet::default(),
            icons: IconCache::new(),
            ziplines: ZiplineLayer::new(keys),
            settings,
        }
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    // ---- loading ----

    /// Replaces the map, its placement, and all datasets with the package's contents.
    ///
    /// Resets the view transform to identity and the height range to the package's
    /// integer-aligned extent.
    pub fn load_map(&mut self, package: &MapPackage) {
        self.map = Some(package.definition);
        self.image = Some(package.background.size);
        self.view = ViewTransform::identity();
        self.world.replace(vec![EntityDataset::new(
            package.source_name.clone(),
            self.settings.paint.dataset_colour.clone(),
            package.entities.clone(),
        )]);
        self.colours.range = package.height_range();
        self.entities_changed();
        tracing::info!(
            map = %package.source_name,
            entities = package.entities.len(),
            dropped = package.dropped,
            "map loaded"
        );
    }

    /// Adds another dataset on top of the current ones. Returns its slot.
    pub fn add_dataset(&mut self, file_name: &str, color: &str, ents: Vec<Entity>) -> u32 {
        let slot = self
            .world
            .push_dataset(EntityDataset::new(file_name, color, ents));
        self.colours.range = self.world.height_range().unwrap_or_default();
        self.entities_changed();
        tracing::info!(dataset = file_name, slot, "dataset added");
        slot
    }

    fn entities_changed(&mut self) {
        let keys = self.filters.tracked_keys();
        self.available = AvailableValues::scan(&keys, self.world.all_entities().map(|(_, e)| e));
        self.filters
            .reset(&self.available, self.settings.filters.seed_include_sets);
        self.ziplines.rebuild(&self.world);
        self.request_redraw();
    }

    /// Replaces the entity-type rules and returns the icon loads to start.
    ///
    /// Completions for requests from any earlier call are ignored.
    pub fn load_entity_types(&mut self, records: &[EntityTypeRecord]) -> Vec<IconRequest> {
        self.types = EntityTypeSet::from_records(records);
        let requests = self.icons.reset(&self.types);
        self.request_redraw();
        requests
    }

    pub fn complete_icon(&mut self, ticket: Handle, base: I, tinted: Option<I>) -> bool {
        let accepted = self.icons.complete(ticket, base, tinted);
        if accepted {
            self.request_redraw();
        }
        accepted
    }

    pub fn fail_icon(&mut self, ticket: Handle) -> bool {
        let known = self.icons.fail(ticket);
        if known {
            tracing::warn!(slot = ticket.index(), "icon failed to load");
        }
        known
    }

    // ---- canvas and view ----

    /// Sizes the canvas to the container width at the background image's aspect ratio.
    ///
    /// Returns `None` (and leaves the canvas alone) until an image is loaded.
    pub fn resize_canvases(&mut self, container_width: f64) -> Option<CanvasSize> {
        let aspect = self.image?.aspect()?;
        self.canvas = CanvasSize::new(container_width, container_width * aspect);
        self.request_redraw();
        Some(self.canvas)
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Mirrors the annotation toolkit's pan/zoom transform. Transforms without a
    /// positive finite scale are ignored.
    pub fn set_view_transform(&mut self, view: ViewTransform) {
        if !view.is_valid() {
            tracing::warn!(scale = view.scale, "ignoring invalid view transform");
            return;
        }
        if self.view != view {
            self.view = view;
            self.request_redraw();
        }
    }

    pub fn view_transform(&self) -> ViewTransform {
        self.view
    }

    pub fn bounds(&self) -> Option<WorldBounds> {
        Some(WorldBounds::from_map(self.map?, self.image?))
    }

    fn projection(&self) -> Option<CanvasProjection> {
        CanvasProjection::new(self.bounds()?, self.canvas)
    }

    pub fn world_to_canvas(&self, world: Vec2) -> Option<Vec2> {
        Some(self.projection()?.world_to_canvas(world))
    }

    pub fn canvas_to_world(&self, canvas: Vec2) -> Option<Vec2> {
        Some(self.projection()?.canvas_to_world(canvas))
    }

    /// World point shown at the centre of a `screen`-sized viewport.
    pub fn viewport_centre(&self, screen: CanvasSize) -> Option<Vec2> {
        self.canvas_to_world(self.view.viewport_centre(screen)?)
    }

    // ---- datasets and entity types ----

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn datasets(&self) -> Vec<DatasetInfo> {
        self.world.dataset_infos()
    }

    pub fn set_dataset_enabled(&mut self, slot: u32, enabled: bool) -> bool {
        let changed = self.world.set_enabled(slot, enabled);
        if changed {
            self.request_redraw();
        }
        changed
    }

    pub fn entity_types(&self) -> &EntityTypeSet {
        &self.types
    }

    pub fn set_type_enabled(&mut self, index: usize, enabled: bool) -> bool {
        let changed = self.types.set_enabled(index, enabled);
        if changed {
            self.request_redraw();
        }
        changed
    }

    pub fn zipline_segments(&self) -> &[ZipSegment] {
        self.ziplines.segments()
    }

    // ---- filters ----

    pub fn available_values(&self) -> &AvailableValues {
        &self.available
    }

    pub fn search_values(&self, key: &str, needle: &str) -> Vec<&str> {
        self.available.search(key, needle)
    }

    pub fn filter(&self, key: &str) -> Option<&KeyFilter> {
        self.filters.get(key)
    }

    /// Flips one value's membership. `None` for an untracked key.
    pub fn toggle_filter_value(&mut self, key: &str, value: &str) -> Option<bool> {
        let now = self.filters.get_mut(key)?.toggle(value);
        self.request_redraw();
        Some(now)
    }

    /// Includes every available value of `key`, or clears the include set.
    pub fn set_all_filter_values(&mut self, key: &str, include: bool) -> bool {
        let Some(filter) = self.filters.get_mut(key) else {
            return false;
        };
        if include {
            filter.include_all(self.available.values(key).iter().map(String::as_str));
        } else {
            filter.clear();
        }
        self.request_redraw();
        true
    }

    pub fn set_missing_allowed(&mut self, key: &str, allowed: bool) -> bool {
        let Some(filter) = self.filters.get_mut(key) else {
            return false;
        };
        filter.set_missing_allowed(allowed);
        self.request_redraw();
        true
    }

    pub fn is_filtered_out(&self, entity: &Entity) -> bool {
        self.filters.is_filtered_out(entity)
    }

    // ---- heights ----

    pub fn height_range(&self) -> HeightRange {
        self.colours.range
    }

    pub fn set_height_min(&mut self, min: f64) {
        self.colours.range.min = min;
        self.request_redraw();
    }

    pub fn set_height_max(&mut self, max: f64) {
        self.colours.range.max = max;
        self.request_redraw();
    }

    pub fn set_hide_out_of_range(&mut self, hide: bool) {
        if self.hide_out_of_range != hide {
            self.hide_out_of_range = hide;
            self.request_redraw();
        }
    }

    pub fn hide_out_of_range(&self) -> bool {
        self.hide_out_of_range
    }

    pub fn legend_css(&self) -> String {
        self.colours.legend_css()
    }

    /// Text for the legend's two ends.
    pub fn legend_labels(&self) -> (String, String) {
        let r = self.colours.range;
        (format_number(r.min), format_number(r.max))
    }

    fn range_gate(&self) -> RangeGate {
        RangeGate {
            hide_out_of_range: self.hide_out_of_range,
            range: self.colours.range,
        }
    }

    fn predicate(&self) -> EntityPredicate<'_> {
        EntityPredicate::new(&self.filters, self.range_gate())
    }

    // ---- redraw and paint ----

    pub fn request_redraw(&mut self) -> bool {
        self.scheduler.request_redraw(&mut self.host)
    }

    pub fn redraw_pending(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    /// Frame callback. Clears the redraw latch, then paints.
    ///
    /// Returns `None` for a callback with nothing pending or a frame that had to be skipped.
    pub fn on_frame(&mut self) -> Option<RenderFrame> {
        let frame = self.scheduler.begin_frame()?;
        match self.paint(frame) {
            Ok(out) => Some(out),
            Err(reason) => {
                tracing::debug!(frame = frame.index, %reason, "frame skipped");
                None
            }
        }
    }

    /// Paints the current state without touching the redraw latch.
    pub fn paint(&self, frame: Frame) -> Result<RenderFrame, SkipReason> {
        let paint = &self.settings.paint;
        let inputs = PaintInputs {
            map: self.map,
            image: self.image,
            canvas: self.canvas,
            view: self.view,
            world: &self.world,
            predicate: self.predicate(),
            colours: &self.colours,
            types: &self.types,
            ziplines: self.ziplines.segments(),
            icons: &self.icons,
            options: PaintOptions {
                height_dot_radius_px: paint.height_dot_radius_px,
                overlay_gating: paint.overlay_gating,
            },
        };
        paint_frame(&inputs, frame)
    }

    // ---- hover ----

    /// Tooltip for the first admitted entity under `screen`, if any.
    pub fn hover(&self, screen: Vec2) -> Option<Tooltip> {
        let projection = self.projection()?;
        let opts = PickOptions {
            radius_px: self.settings.paint.hit_radius_px,
        };
        let hit = pick_screen(
            &self.world,
            &self.predicate(),
            &projection,
            &self.view,
            screen,
            opts,
        )?;
        let entity = self.world.entity(hit.entity)?;
        Some(Tooltip::for_entity(hit.entity, entity, screen))
    }
}
