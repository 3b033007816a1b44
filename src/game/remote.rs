//! Remote State Reconciliation
//!
//! Tracks every remote participant seen on the channel. Each entity keeps the
//! latest network-reported (authoritative) position and a locally smoothed
//! (drawn) position that walks toward it.
//!
//! ## Convergence
//!
//! Every tick the drawn position moves along each axis at
//! `|authoritative - drawn| / sync_window` per second, clamped at the target.
//! The speed is recomputed from the remaining distance each tick, so motion
//! eases out: a single step of a full window lands exactly, shorter steps
//! close a proportional share of what is left. The drawn position never
//! overshoots. A non-positive window snaps drawn onto authoritative.
//!
//! ## Ordering
//!
//! Events are applied in receipt order with no sequence numbers. A broadcast
//! that was sent before a sync snapshot but delivered after it overwrites the
//! snapshot's data until the next update for that participant. This race is
//! inherent to the channel and deliberately not fenced here.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::{move_towards, Millis, Vec2};
use crate::error::Anomaly;
use crate::network::protocol::{MoveBroadcast, ParticipantId, PresenceRecord, PresenceState};

/// Gaps smaller than this (px) are closed outright to absorb float drift.
const SNAP_EPSILON: f32 = 1e-3;

/// A remote participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    /// Participant.
    pub id: ParticipantId,
    /// Latest position reported by the network.
    pub authoritative: Vec2,
    /// Smoothed position used for rendering and proximity queries.
    pub drawn: Vec2,
    /// When `authoritative` was last written.
    pub last_update_ms: Millis,
}

impl RemoteEntity {
    /// Entity first observed at `position`; drawn starts on target.
    pub fn new(id: ParticipantId, position: Vec2, now: Millis) -> Self {
        Self {
            id,
            authoritative: position,
            drawn: position,
            last_update_ms: now,
        }
    }

    /// Overwrite the authoritative position (last write wins).
    pub fn set_authoritative(&mut self, position: Vec2, now: Millis) {
        self.authoritative = position;
        self.last_update_ms = now;
    }

    /// True once drawn has reached authoritative.
    pub fn is_settled(&self) -> bool {
        self.drawn == self.authoritative
    }

    fn advance(&mut self, sync_window: f32, dt: f32) {
        if sync_window.is_nan() || sync_window <= 0.0 {
            self.drawn = self.authoritative;
            return;
        }
        let speed_x = (self.authoritative.x - self.drawn.x).abs() / sync_window;
        let speed_y = (self.authoritative.y - self.drawn.y).abs() / sync_window;
        self.drawn.x = converge(self.drawn.x, self.authoritative.x, speed_x * dt);
        self.drawn.y = converge(self.drawn.y, self.authoritative.y, speed_y * dt);
    }
}

fn converge(current: f32, target: f32, max_delta: f32) -> f32 {
    let next = move_towards(current, target, max_delta);
    if (target - next).abs() < SNAP_EPSILON {
        target
    } else {
        next
    }
}

fn position_or_origin(id: &ParticipantId, position: Option<Vec2>) -> Vec2 {
    position.unwrap_or_else(|| {
        Anomaly::MissingPositionData { id: id.to_string() }.log();
        Vec2::ZERO
    })
}

/// Owns every [`RemoteEntity`]. The local participant is never tracked.
#[derive(Debug, Clone)]
pub struct RemoteStateReconciler {
    local_id: ParticipantId,
    sync_window: f32,
    entities: BTreeMap<ParticipantId, RemoteEntity>,
}

impl RemoteStateReconciler {
    /// Empty reconciler ignoring `local_id`.
    ///
    /// A window that is not positive disables smoothing: drawn positions
    /// snap straight to the authoritative ones.
    pub fn new(local_id: ParticipantId, sync_window_seconds: f32) -> Self {
        if sync_window_seconds.is_nan() || sync_window_seconds <= 0.0 {
            warn!(sync_window_seconds, "non-positive sync window, remote smoothing disabled");
        }
        Self {
            local_id,
            sync_window: sync_window_seconds,
            entities: BTreeMap::new(),
        }
    }

    /// Apply a full presence snapshot. Membership follows the snapshot exactly.
    ///
    /// Entities already tracked keep their cached positions; only newcomers
    /// take the snapshot's position.
    pub fn apply_sync(&mut self, snapshot: &PresenceState, now: Millis) {
        let mut previous = std::mem::take(&mut self.entities);

        for record in snapshot.values().flatten() {
            if record.id == self.local_id || self.entities.contains_key(&record.id) {
                continue;
            }

            let entity = match previous.remove(&record.id) {
                Some(existing) => existing,
                None => {
                    let position = position_or_origin(&record.id, record.position);
                    RemoteEntity::new(record.id.clone(), position, now)
                }
            };
            self.entities.insert(record.id.clone(), entity);
        }

        if !previous.is_empty() {
            debug!(removed = previous.len(), "sync dropped entities absent from snapshot");
        }
    }

    /// Apply newly joined presences. Already-tracked ids are left alone.
    pub fn apply_join(&mut self, records: &[PresenceRecord], now: Millis) {
        for record in records {
            if record.id == self.local_id || self.entities.contains_key(&record.id) {
                continue;
            }
            let position = position_or_origin(&record.id, record.position);
            debug!(id = %record.id.short(), %position, "participant joined");
            self.entities
                .insert(record.id.clone(), RemoteEntity::new(record.id.clone(), position, now));
        }
    }

    /// Remove departed presences immediately.
    pub fn apply_leave(&mut self, records: &[PresenceRecord]) {
        for record in records {
            if self.entities.remove(&record.id).is_some() {
                debug!(id = %record.id.short(), "participant left");
            } else if record.id != self.local_id {
                Anomaly::UnknownEntityReference { id: record.id.to_string() }.log();
            }
        }
    }

    /// Apply a move broadcast. Unknown ids are joined on the spot.
    pub fn apply_move(&mut self, msg: &MoveBroadcast, now: Millis) {
        if msg.id == self.local_id {
            return;
        }

        let position = position_or_origin(&msg.id, msg.position);
        match self.entities.get_mut(&msg.id) {
            Some(entity) => entity.set_authoritative(position, now),
            None => {
                Anomaly::UnknownEntityReference { id: msg.id.to_string() }.log();
                self.entities
                    .insert(msg.id.clone(), RemoteEntity::new(msg.id.clone(), position, now));
            }
        }
    }

    /// Walk every drawn position toward its authoritative position.
    pub fn advance(&mut self, dt: f32) {
        for entity in self.entities.values_mut() {
            entity.advance(self.sync_window, dt);
        }
    }

    /// Tracked entity by id.
    pub fn get(&self, id: &ParticipantId) -> Option<&RemoteEntity> {
        self.entities.get(id)
    }

    /// All tracked entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.values()
    }

    /// `(id, drawn)` for every tracked entity.
    pub fn drawn_positions(&self) -> impl Iterator<Item = (&ParticipantId, Vec2)> {
        self.entities.iter().map(|(id, e)| (id, e.drawn))
    }

    /// Closest entity (by drawn position) within `range` of `point`.
    pub fn closest_within(&self, point: Vec2, range: f32) -> Option<&RemoteEntity> {
        let max_dist_sq = range * range;
        let mut closest: Option<(&RemoteEntity, f32)> = None;

        for entity in self.entities.values() {
            let dist_sq = entity.drawn.distance_squared(point);
            if dist_sq > max_dist_sq {
                continue;
            }
            if closest.map_or(true, |(_, best)| dist_sq < best) {
                closest = Some((entity, dist_sq));
            }
        }

        closest.map(|(entity, _)| entity)
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Id this reconciler ignores.
    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }
}

// =============================================================================
// TESTS
// =============================================================================
