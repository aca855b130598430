//! Registry of things on the map with a sparse bucket index
//!
//! Things are stored in spawn order (ascending `ThingId`). A sparse hash of
//! square buckets backs cell lookups and the nearby-first nearest search.

use crate::core::error::Result;
use crate::core::types::{Cell, ThingId};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Broad classes of things a provider can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThingGroup {
    Haulable,
    Building,
    Plant,
    Filth,
    Corpse,
}

/// An entity placed on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    pub id: ThingId,
    pub kind: String,
    pub group: ThingGroup,
    pub position: Cell,
    /// Forbidden to members of the controlling faction
    pub forbidden: bool,
    /// Condition in [0, 1]; 1 is undamaged
    pub health: f32,
}

/// Filter describing which things a provider is interested in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThingRequest {
    #[default]
    Nothing,
    Everything,
    Kind(String),
    Group(ThingGroup),
}

impl ThingRequest {
    pub fn accepts(&self, thing: &Thing) -> bool {
        match self {
            ThingRequest::Nothing => false,
            ThingRequest::Everything => true,
            ThingRequest::Kind(kind) => thing.kind == *kind,
            ThingRequest::Group(group) => thing.group == *group,
        }
    }
}

/// Default edge length of an index bucket, in cells
const DEFAULT_BUCKET_SIZE: i32 = 8;

pub struct ThingRegistry {
    bucket_size: i32,
    /// Sorted by id
    things: Vec<Thing>,
    buckets: AHashMap<(i32, i32), Vec<ThingId>>,
    /// Bucket-space bounding box of everything ever inserted
    bucket_min: (i32, i32),
    bucket_max: (i32, i32),
    next_id: u32,
}

impl ThingRegistry {
    pub fn new() -> Self {
        Self::with_bucket_size(DEFAULT_BUCKET_SIZE)
    }

    pub fn with_bucket_size(bucket_size: i32) -> Self {
        Self {
            bucket_size: bucket_size.max(1),
            things: Vec::new(),
            buckets: AHashMap::new(),
            bucket_min: (0, 0),
            bucket_max: (0, 0),
            next_id: 1,
        }
    }

    #[inline]
    fn bucket_of(&self, cell: Cell) -> (i32, i32) {
        (
            cell.x.div_euclid(self.bucket_size),
            cell.y.div_euclid(self.bucket_size),
        )
    }

    fn index(&self, id: ThingId) -> Option<usize> {
        self.things.binary_search_by_key(&id, |t| t.id).ok()
    }

    fn insert_bucket(&mut self, id: ThingId, cell: Cell) {
        let bucket = self.bucket_of(cell);
        if self.buckets.is_empty() {
            self.bucket_min = bucket;
            self.bucket_max = bucket;
        } else {
            self.bucket_min = (self.bucket_min.0.min(bucket.0), self.bucket_min.1.min(bucket.1));
            self.bucket_max = (self.bucket_max.0.max(bucket.0), self.bucket_max.1.max(bucket.1));
        }
        self.buckets.entry(bucket).or_default().push(id);
    }

    fn remove_bucket(&mut self, id: ThingId, cell: Cell) {
        let bucket = self.bucket_of(cell);
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.retain(|&t| t != id);
        }
    }

    /// Place a new thing and return its id
    pub fn spawn(
        &mut self,
        kind: impl Into<String>,
        group: ThingGroup,
        position: Cell,
    ) -> ThingId {
        let id = ThingId(self.next_id);
        self.next_id += 1;
        self.things.push(Thing {
            id,
            kind: kind.into(),
            group,
            position,
            forbidden: false,
            health: 1.0,
        });
        self.insert_bucket(id, position);
        id
    }

    pub fn despawn(&mut self, id: ThingId) -> Option<Thing> {
        let idx = self.index(id)?;
        let thing = self.things.remove(idx);
        self.remove_bucket(id, thing.position);
        Some(thing)
    }

    pub fn get(&self, id: ThingId) -> Option<&Thing> {
        self.index(id).map(|idx| &self.things[idx])
    }

    pub fn get_mut(&mut self, id: ThingId) -> Option<&mut Thing> {
        let idx = self.index(id)?;
        self.things.get_mut(idx)
    }

    /// Move a thing, keeping the bucket index in sync
    pub fn set_position(&mut self, id: ThingId, position: Cell) {
        let Some(idx) = self.index(id) else {
            return;
        };
        let old = self.things[idx].position;
        self.things[idx].position = position;
        self.remove_bucket(id, old);
        self.insert_bucket(id, position);
    }

    /// All things standing on a cell, in spawn order
    pub fn things_at(&self, cell: Cell) -> Vec<&Thing> {
        let mut found: Vec<&Thing> = self
            .buckets
            .get(&self.bucket_of(cell))
            .into_iter()
            .flatten()
            .filter_map(|&id| self.get(id))
            .filter(|t| t.position == cell)
            .collect();
        found.sort_by_key(|t| t.id);
        found
    }

    /// All things accepted by a request, in spawn order
    pub fn matching<'a>(&'a self, request: &'a ThingRequest) -> impl Iterator<Item = &'a Thing> + 'a {
        self.things.iter().filter(move |t| request.accepts(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thing> {
        self.things.iter()
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Nearest accepted thing passing `validator`, searching nearby buckets first
    ///
    /// The first pass covers every bucket within `local_radius`; after that the
    /// search widens one bucket ring at a time and stops once no unvisited ring
    /// can hold anything closer than the best found. Equal distances resolve to
    /// the lowest id. `validator` is only called for things that could still
    /// beat the current best.
    pub fn nearest_matching<F>(
        &self,
        center: Cell,
        request: &ThingRequest,
        max_distance: f32,
        local_radius: f32,
        mut validator: F,
    ) -> Result<Option<ThingId>>
    where
        F: FnMut(&Thing) -> Result<bool>,
    {
        if self.buckets.is_empty() {
            return Ok(None);
        }

        let (cx, cy) = self.bucket_of(center);
        let max_ring = [
            (self.bucket_min.0 - cx).abs(),
            (self.bucket_max.0 - cx).abs(),
            (self.bucket_min.1 - cy).abs(),
            (self.bucket_max.1 - cy).abs(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        let local_rings = ((local_radius / self.bucket_size as f32).ceil() as i32).max(0);
        let max_distance_sq = (max_distance as f64) * (max_distance as f64);

        let mut best: Option<(i64, ThingId)> = None;
        let mut ring_from = 0;
        let mut ring_to = local_rings.min(max_ring);

        loop {
            // Closest any cell in ring_from could be to the center
            let ring_min_dist = ((ring_from - 1).max(0) * self.bucket_size) as f64;
            if ring_min_dist > max_distance as f64 {
                break;
            }
            if let Some((best_sq, _)) = best {
                if ring_min_dist * ring_min_dist > best_sq as f64 {
                    break;
                }
            }

            let mut candidates: Vec<(i64, ThingId)> = Vec::new();
            for ring in ring_from..=ring_to {
                for bucket in ring_buckets(cx, cy, ring) {
                    let Some(ids) = self.buckets.get(&bucket) else {
                        continue;
                    };
                    for &id in ids {
                        let Some(thing) = self.get(id) else {
                            continue;
                        };
                        if !request.accepts(thing) {
                            continue;
                        }
                        let dist_sq = thing.position.distance_squared(&center);
                        if dist_sq as f64 > max_distance_sq {
                            continue;
                        }
                        candidates.push((dist_sq, id));
                    }
                }
            }
            candidates.sort_unstable();

            for key in candidates {
                if best.is_some_and(|b| key >= b) {
                    break;
                }
                let Some(thing) = self.get(key.1) else {
                    continue;
                };
                if validator(thing)? {
                    best = Some(key);
                    break;
                }
            }

            if ring_to >= max_ring {
                break;
            }
            ring_from = ring_to + 1;
            ring_to = ring_from;
        }

        Ok(best.map(|(_, id)| id))
    }
}

impl Default for ThingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket coordinates at exactly Chebyshev distance `ring` from the center
fn ring_buckets(cx: i32, cy: i32, ring: i32) -> Vec<(i32, i32)> {
    if ring == 0 {
        return vec![(cx, cy)];
    }
    let mut out = Vec::with_capacity((ring * 8) as usize);
    for dx in -ring..=ring {
        out.push((cx + dx, cy - ring));
        out.push((cx + dx, cy + ring));
    }
    for dy in (-ring + 1)..ring {
        out.push((cx - ring, cy + dy));
        out.push((cx + ring, cy + dy));
    }
    out
}
