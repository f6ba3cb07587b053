//! Viewport streaming
//!
//! Keeps the set of visible chunks equal to the window `[c - r, c + r]` around the chunk
//! containing the viewpoint. Chunks leaving the window are hidden, stored chunks entering
//! it are shown, and absent ones have their region queued for generation. Updates are
//! skipped while nothing relevant changed.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::chunk::{ChunkCoord, ChunkStore, RegionCoord};
use crate::scheduler::GenerationScheduler;

/// Margin applied to the view extent when fitting the radius
pub const VIEW_MARGIN: f32 = 1.2;
/// Largest window radius in chunks on either axis
pub const MAX_VIEW_RADIUS: i32 = 256;

/// Inclusive chunk-space window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkWindow {
    pub min: ChunkCoord,
    pub max: ChunkCoord,
}

impl ChunkWindow {
    pub fn around(center: ChunkCoord, radius_x: i32, radius_y: i32) -> Self {
        Self {
            min: ChunkCoord::new(center.x - radius_x, center.y - radius_y),
            max: ChunkCoord::new(center.x + radius_x, center.y + radius_y),
        }
    }

    pub fn contains(&self, c: ChunkCoord) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    /// Row-major, `y` outermost.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| ChunkCoord::new(x, y)))
    }
}

/// Result of an update that actually ran
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    pub shown: Vec<ChunkCoord>,
    pub hidden: Vec<ChunkCoord>,
    /// Regions newly queued for generation
    pub enqueued: Vec<RegionCoord>,
    /// In-window chunks not yet stored
    pub pending: usize,
}

impl VisibilityChange {
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.hidden.is_empty() && self.enqueued.is_empty()
    }

    /// Append a later change; `pending` takes the later count.
    pub fn absorb(&mut self, later: VisibilityChange) {
        self.shown.extend(later.shown);
        self.hidden.extend(later.hidden);
        self.enqueued.extend(later.enqueued);
        self.pending = later.pending;
    }
}

#[derive(Debug)]
pub struct StreamingController {
    position: (f32, f32),
    chunk_size: usize,
    radius_x: i32,
    radius_y: i32,
    current_chunk: Option<ChunkCoord>,
    loaded: HashSet<ChunkCoord>,
    force_refresh: bool,
    pending: bool,
}

impl StreamingController {
    pub fn new(chunk_size: usize, radius: i32) -> Self {
        Self {
            position: (0.0, 0.0),
            chunk_size: chunk_size.max(1),
            radius_x: radius.clamp(0, MAX_VIEW_RADIUS),
            radius_y: radius.clamp(0, MAX_VIEW_RADIUS),
            current_chunk: None,
            loaded: HashSet::new(),
            force_refresh: true,
            pending: false,
        }
    }

    /// Move the viewpoint (world cells).
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = (x, y);
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    /// Set the window radius in chunks on both axes.
    pub fn set_radius(&mut self, radius: i32) {
        self.set_radius_xy(radius, radius);
    }

    /// Radii are clamped to `0..=MAX_VIEW_RADIUS`.
    pub fn set_radius_xy(&mut self, radius_x: i32, radius_y: i32) {
        let (rx, ry) = (
            radius_x.clamp(0, MAX_VIEW_RADIUS),
            radius_y.clamp(0, MAX_VIEW_RADIUS),
        );
        if (rx, ry) != (self.radius_x, self.radius_y) {
            self.radius_x = rx;
            self.radius_y = ry;
            self.force_refresh = true;
        }
    }

    /// Derive the radius from a view extent in world cells. Non-finite extents are
    /// ignored.
    pub fn fit_to_view(&mut self, view_width: f32, view_height: f32) {
        if !view_width.is_finite() || !view_height.is_finite() {
            warn!(view_width, view_height, "Ignoring non-finite view extent");
            return;
        }
        let span = 2.0 * self.chunk_size as f32;
        let rx = (view_width * VIEW_MARGIN / span).ceil() as i32;
        let ry = (view_height * VIEW_MARGIN / span).ceil() as i32;
        self.set_radius_xy(rx, ry);
    }

    pub fn radius(&self) -> (i32, i32) {
        (self.radius_x, self.radius_y)
    }

    pub fn current_chunk(&self) -> Option<ChunkCoord> {
        self.current_chunk
    }

    pub fn window(&self) -> ChunkWindow {
        let center = self.viewpoint_chunk();
        ChunkWindow::around(center, self.radius_x, self.radius_y)
    }

    pub fn is_loaded(&self, coord: &ChunkCoord) -> bool {
        self.loaded.contains(coord)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    fn viewpoint_chunk(&self) -> ChunkCoord {
        ChunkCoord::from_world(self.position.0, self.position.1, self.chunk_size)
    }

    /// Reconcile visibility with the current window.
    ///
    /// Returns `None` when the viewpoint stayed in the same chunk, the radius is
    /// unchanged and no in-window chunk was waiting on generation.
    pub fn update_visible(
        &mut self,
        store: &ChunkStore,
        scheduler: &mut GenerationScheduler,
    ) -> Option<VisibilityChange> {
        let center = self.viewpoint_chunk();
        if self.current_chunk == Some(center) && !self.force_refresh && !self.pending {
            return None;
        }
        self.force_refresh = false;

        let window = ChunkWindow::around(center, self.radius_x, self.radius_y);
        let mut change = VisibilityChange::default();

        let mut leaving: Vec<ChunkCoord> = self
            .loaded
            .iter()
            .copied()
            .filter(|c| !window.contains(*c))
            .collect();
        leaving.sort();
        for coord in leaving {
            store.set_visible(&coord, false);
            self.loaded.remove(&coord);
            change.hidden.push(coord);
        }

        let per_region = scheduler.chunks_per_region();
        for coord in window.coords() {
            if self.loaded.contains(&coord) {
                continue;
            }
            if store.set_visible(&coord, true) {
                self.loaded.insert(coord);
                change.shown.push(coord);
            } else {
                change.pending += 1;
                let region = coord.region(per_region);
                if scheduler.enqueue_region(region) {
                    trace!(region_x = region.x, region_y = region.y, "Queued region for window");
                    change.enqueued.push(region);
                }
            }
        }

        self.pending = change.pending > 0;
        self.current_chunk = Some(center);

        debug!(
            center_x = center.x,
            center_y = center.y,
            shown = change.shown.len(),
            hidden = change.hidden.len(),
            enqueued = change.enqueued.len(),
            pending = change.pending,
            "Visible window updated"
        );
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkData;
    use crate::ocean::OceanField;
    use crate::scheduler::{RegionLayers, SchedulerParams};
    use std::sync::Arc;

    fn setup(chunk_size: usize) -> (Arc<ChunkStore>, GenerationScheduler) {
        let store = Arc::new(ChunkStore::new());
        let scheduler = GenerationScheduler::new(
            Arc::clone(&store),
            Arc::new(OceanField::default()),
            RegionLayers::default(),
            SchedulerParams {
                chunk_size,
                worker_threads: 1,
                ..SchedulerParams::default()
            },
        )
        .unwrap();
        (store, scheduler)
    }

    #[test]
    fn test_window_contains() {
        let window = ChunkWindow::around(ChunkCoord::new(0, 0), 1, 2);
        assert!(window.contains(ChunkCoord::new(-1, 2)));
        assert!(!window.contains(ChunkCoord::new(2, 0)));
        assert_eq!(window.coords().count(), 15);
    }

    #[test]
    fn test_fit_to_view() {
        let mut ctrl = StreamingController::new(16, 0);
        ctrl.fit_to_view(100.0, 50.0);
        // ceil(120 / 32) = 4, ceil(60 / 32) = 2
        assert_eq!(ctrl.radius(), (4, 2));
    }

    #[test]
    fn test_radius_is_capped() {
        let mut ctrl = StreamingController::new(16, i32::MAX);
        assert_eq!(ctrl.radius(), (MAX_VIEW_RADIUS, MAX_VIEW_RADIUS));

        ctrl.set_radius(2);
        ctrl.fit_to_view(f32::MAX, 10.0);
        assert_eq!(ctrl.radius(), (MAX_VIEW_RADIUS, 1));
        let window = ctrl.window();
        assert_eq!(window.min.x, -MAX_VIEW_RADIUS);
        assert_eq!(window.max.x, MAX_VIEW_RADIUS);

        ctrl.fit_to_view(f32::INFINITY, f32::NAN);
        assert_eq!(ctrl.radius(), (MAX_VIEW_RADIUS, 1));
    }

    #[test]
    fn test_absent_chunks_enqueue_their_regions() {
        let (store, mut sched) = setup(50);
        let mut ctrl = StreamingController::new(50, 1);

        let change = ctrl.update_visible(&store, &mut sched).unwrap();
        assert!(change.shown.is_empty());
        assert_eq!(change.pending, 9);
        // Chunks -1..=1 with two chunks per region span regions -1 and 0.
        assert_eq!(
            change.enqueued,
            vec![
                RegionCoord::new(-1, -1),
                RegionCoord::new(0, -1),
                RegionCoord::new(-1, 0),
                RegionCoord::new(0, 0),
            ]
        );
        assert_eq!(sched.pending(), 4);

        // Pending chunks keep the controller active; nothing new is queued.
        let again = ctrl.update_visible(&store, &mut sched).unwrap();
        assert!(again.enqueued.is_empty());
        assert_eq!(sched.pending(), 4);
    }

    #[test]
    fn test_generated_chunks_become_visible() {
        let (store, mut sched) = setup(50);
        let mut ctrl = StreamingController::new(50, 1);
        ctrl.update_visible(&store, &mut sched);
        sched.run_generation_pass(8).unwrap();

        let change = ctrl.update_visible(&store, &mut sched).unwrap();
        assert_eq!(change.shown.len(), 9);
        assert_eq!(change.pending, 0);
        assert!(store.get(&ChunkCoord::new(-1, 1)).unwrap().is_visible());
        // Outside the window: generated but hidden.
        assert!(!store.get(&ChunkCoord::new(-2, -2)).unwrap().is_visible());

        // Settled: no work until the viewpoint moves.
        assert!(ctrl.update_visible(&store, &mut sched).is_none());
    }

    #[test]
    fn test_moving_hides_chunks_left_behind() {
        let (store, mut sched) = setup(10);
        for y in -3..=3 {
            for x in -3..=3 {
                store.insert_if_absent(ChunkCoord::new(x, y), ChunkData::water(10, false));
            }
        }
        let mut ctrl = StreamingController::new(10, 1);
        ctrl.update_visible(&store, &mut sched);
        assert_eq!(ctrl.loaded_count(), 9);

        ctrl.set_position(15.0, 5.0);
        let change = ctrl.update_visible(&store, &mut sched).unwrap();
        assert_eq!(
            change.hidden,
            vec![ChunkCoord::new(-1, -1), ChunkCoord::new(-1, 0), ChunkCoord::new(-1, 1)]
        );
        assert_eq!(
            change.shown,
            vec![ChunkCoord::new(2, -1), ChunkCoord::new(2, 0), ChunkCoord::new(2, 1)]
        );
        assert!(!store.get(&ChunkCoord::new(-1, 0)).unwrap().is_visible());
        assert!(store.get(&ChunkCoord::new(2, 0)).unwrap().is_visible());
        assert_eq!(store.stats().visible, 9);
    }

    #[test]
    fn test_radius_change_forces_refresh() {
        let (store, mut sched) = setup(10);
        store.insert_if_absent(ChunkCoord::new(0, 0), ChunkData::water(10, false));
        let mut ctrl = StreamingController::new(10, 0);
        assert_eq!(ctrl.update_visible(&store, &mut sched).unwrap().shown.len(), 1);
        assert!(ctrl.update_visible(&store, &mut sched).is_none());

        ctrl.set_radius(0);
        assert!(ctrl.update_visible(&store, &mut sched).is_none());

        ctrl.set_radius(1);
        let change = ctrl.update_visible(&store, &mut sched).unwrap();
        assert_eq!(change.pending, 8);
    }
}
