//! Target registry
//!
//! Holds the active set (bounded by `max_targets`, unique per kind and
//! case-insensitive name) and the dormant set of stopped or read-only
//! targets. Only the active set counts toward capacity and duplicates.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use super::archiver::SessionSnapshot;
use super::error::{EngineError, EngineResult};
use super::target::{MonitoringTarget, TargetId, display_name, normalize_name};
use crate::TargetKind;
use crate::analysis::reference_today;

#[derive(Debug)]
pub struct TargetRegistry {
    active: Vec<MonitoringTarget>,
    dormant: Vec<MonitoringTarget>,
    max_targets: usize,
    offset: FixedOffset,
}

impl TargetRegistry {
    pub fn new(max_targets: usize, offset: FixedOffset) -> Self {
        Self {
            active: Vec::new(),
            dormant: Vec::new(),
            max_targets,
            offset,
        }
    }

    pub fn max_targets(&self) -> usize {
        self.max_targets
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Register a new target in the active set, pending its first fetch
    pub fn add(&mut self, raw_name: &str, kind: TargetKind, now: DateTime<Utc>) -> EngineResult<TargetId> {
        let name = normalize_name(kind, raw_name)?;
        self.check_admission(kind, &name)?;

        let target = MonitoringTarget::new(kind, name, now, self.offset);
        let id = target.id;
        debug!("registered {} as {}", target.display_name, id);
        self.active.push(target);

        Ok(id)
    }

    /// Remove a target from either set
    pub fn remove(&mut self, id: TargetId) -> Option<MonitoringTarget> {
        if let Some(index) = self.active.iter().position(|t| t.id == id) {
            return Some(self.active.remove(index));
        }
        self.dormant
            .iter()
            .position(|t| t.id == id)
            .map(|index| self.dormant.remove(index))
    }

    /// Look up a target in either set
    pub fn get(&self, id: TargetId) -> Option<&MonitoringTarget> {
        self.active
            .iter()
            .chain(self.dormant.iter())
            .find(|t| t.id == id)
    }

    pub fn active(&self, id: TargetId) -> Option<&MonitoringTarget> {
        self.active.iter().find(|t| t.id == id)
    }

    pub fn active_mut(&mut self, id: TargetId) -> Option<&mut MonitoringTarget> {
        self.active.iter_mut().find(|t| t.id == id)
    }

    pub fn is_dormant(&self, id: TargetId) -> bool {
        self.dormant.iter().any(|t| t.id == id)
    }

    pub fn active_ids(&self) -> Vec<TargetId> {
        self.active.iter().map(|t| t.id).collect()
    }

    /// Active targets in insertion order, then dormant ones
    pub fn list(&self) -> Vec<MonitoringTarget> {
        self.active
            .iter()
            .chain(self.dormant.iter())
            .cloned()
            .collect()
    }

    /// Move an active target to the dormant set and end its session
    pub fn deactivate(&mut self, id: TargetId) -> Option<&MonitoringTarget> {
        let index = self.active.iter().position(|t| t.id == id)?;
        let mut target = self.active.remove(index);
        target.end_session();
        self.dormant.push(target);
        self.dormant.last()
    }

    /// Move a dormant target back into the active set
    pub fn reactivate(&mut self, id: TargetId) -> EngineResult<()> {
        let index = self
            .dormant
            .iter()
            .position(|t| t.id == id)
            .ok_or(EngineError::UnknownTarget(id))?;

        let (kind, name) = {
            let target = &self.dormant[index];
            (target.kind, target.name.clone())
        };
        self.check_admission(kind, &name)?;

        let target = self.dormant.remove(index);
        debug!("reactivated {}", target.display_name);
        self.active.push(target);
        Ok(())
    }

    /// Add an archived session as a read-only dormant target
    pub fn insert_read_only(&mut self, snapshot: SessionSnapshot) -> TargetId {
        let target = MonitoringTarget::from_snapshot(snapshot, reference_today(self.offset), self.offset);
        let id = target.id;
        debug!("loaded archived {} as read-only {}", target.display_name, id);
        self.dormant.push(target);
        id
    }

    fn check_admission(&self, kind: TargetKind, name: &str) -> EngineResult<()> {
        if self.active.len() >= self.max_targets {
            return Err(EngineError::CapacityExceeded {
                max: self.max_targets,
            });
        }

        if self.active.iter().any(|t| t.same_target(kind, name)) {
            return Err(EngineError::DuplicateTarget {
                display_name: display_name(kind, name),
            });
        }

        Ok(())
    }
}
