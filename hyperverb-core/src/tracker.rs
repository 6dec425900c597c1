//! Per-cell visibility and binaural distance tracking.
//!
//! The host renderer calls [`CellTracker::record_visibility`] at most once
//! per visible cell per frame during its cell traversal; the mixer consumes
//! the recorded state once per frame afterwards.

use crate::config::ReverbParams;
use crate::geometry::Geometry;
use glam::DMat4;
use std::collections::HashMap;

/// Opaque, host-assigned identity of a world cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

/// Rolling simulation state for one cell. Created lazily on first
/// visibility, never destroyed; the world is effectively static so the map
/// is bounded by the number of distinct cells ever rendered.
#[derive(Debug, Clone)]
pub struct CellInfo {
    pub last_frame: u64,
    pub curr_frame: u64,
    /// Binaural distances recorded at the previous mixed frame.
    pub last_dist: [f64; 2],
    /// Binaural distances recorded this frame.
    pub curr_dist: [f64; 2],
    /// Integer topological distance from the listener's cell.
    pub topo_distance: u32,
}

pub struct CellTracker {
    geometry: Geometry,
    infos: HashMap<CellId, CellInfo>,
    frame_id: u64,
}

impl CellTracker {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            infos: HashMap::new(),
            // starts above zero so a freshly created record never looks like
            // it was visible on the previous frame
            frame_id: 10,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The id of the frame currently being recorded.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Records one visibility callback from the host renderer.
    ///
    /// `ego_transform` is the cell's camera-relative transform; the two ear
    /// offsets sit at plus/minus the inter-aural distance along the lateral
    /// axis of the listener's local frame. `topo_distance` is the integer
    /// cell-graph distance between this cell and the listener's cell.
    pub fn record_visibility(
        &mut self,
        cell: CellId,
        ego_transform: DMat4,
        topo_distance: u32,
        params: &ReverbParams,
    ) {
        let geometry = self.geometry;
        let frame_id = self.frame_id;
        let position = ego_transform * Geometry::origin();
        let iad = params.interaural_distance;

        let info = self.infos.entry(cell).or_insert_with(|| CellInfo {
            last_frame: 0,
            curr_frame: 0,
            last_dist: [0.0; 2],
            curr_dist: [0.0; 2],
            topo_distance,
        });
        info.curr_frame = frame_id;
        info.topo_distance = topo_distance;
        info.curr_dist[0] = geometry.distance_from_origin(geometry.xpush(-iad) * position);
        info.curr_dist[1] = geometry.distance_from_origin(geometry.xpush(iad) * position);
    }

    /// Closes the current frame; subsequent recordings belong to the next one.
    /// Called by the mixer after it has consumed the frame's recordings.
    pub(crate) fn advance_frame(&mut self) {
        self.frame_id += 1;
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = (&CellId, &mut CellInfo)> {
        self.infos.iter_mut()
    }

    pub fn tracked_cells(&self) -> usize {
        self.infos.len()
    }

    pub fn get(&self, cell: CellId) -> Option<&CellInfo> {
        self.infos.get(&cell)
    }
}
