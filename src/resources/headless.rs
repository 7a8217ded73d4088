//! A [`GpuBackend`] without a GPU.
//!
//! Records every create, write and release so tests (and tools that only
//! need the simulation) can run without a device. Release counts are kept
//! per id, which makes double releases visible.
//!
//! The counters live behind a [`HeadlessStats`] handle that stays readable
//! after the backend itself was moved into a registry and dropped with it.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{
    data_structures::{
        mesh::{MeshData, PointVertex},
        scene_graph::Material,
    },
    resources::{GpuBackend, ObjectUniform, ResourceError, ResourceId, ResourceKind},
};

#[derive(Debug, Default)]
struct Counters {
    created: BTreeMap<ResourceId, ResourceKind>,
    releases: BTreeMap<ResourceId, usize>,
    writes: usize,
}

/// Shared view of a [`HeadlessBackend`]'s counters.
#[derive(Debug, Clone, Default)]
pub struct HeadlessStats(Rc<RefCell<Counters>>);

impl HeadlessStats {
    pub fn created_count(&self) -> usize {
        self.0.borrow().created.len()
    }

    pub fn created_of(&self, kind: ResourceKind) -> usize {
        self.0
            .borrow()
            .created
            .values()
            .filter(|k| **k == kind)
            .count()
    }

    pub fn created_ids(&self) -> Vec<ResourceId> {
        self.0.borrow().created.keys().copied().collect()
    }

    pub fn release_count(&self, id: ResourceId) -> usize {
        self.0.borrow().releases.get(&id).copied().unwrap_or(0)
    }

    /// Sum of all release calls, including repeated ones.
    pub fn released_total(&self) -> usize {
        self.0.borrow().releases.values().sum()
    }

    /// Created ids that have not been released yet.
    pub fn live_count(&self) -> usize {
        let counters = self.0.borrow();
        counters
            .created
            .keys()
            .filter(|id| !counters.releases.contains_key(id))
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.0.borrow().writes
    }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    stats: HeadlessStats,
    fail_after: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose allocations fail once `n` have succeeded.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// A handle on the counters that outlives the backend.
    pub fn stats(&self) -> HeadlessStats {
        self.stats.clone()
    }

    fn create(
        &mut self,
        id: ResourceId,
        kind: ResourceKind,
        label: &str,
    ) -> Result<(), ResourceError> {
        let mut counters = self.stats.0.borrow_mut();
        if self.fail_after.is_some_and(|n| counters.created.len() >= n) {
            return Err(ResourceError::Allocation {
                kind,
                label: label.to_string(),
                reason: "allocation limit reached".to_string(),
            });
        }
        counters.created.insert(id, kind);
        Ok(())
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_geometry(
        &mut self,
        id: ResourceId,
        label: &str,
        _mesh: &MeshData,
    ) -> Result<(), ResourceError> {
        self.create(id, ResourceKind::Geometry, label)
    }

    fn create_points(
        &mut self,
        id: ResourceId,
        label: &str,
        _points: &[PointVertex],
    ) -> Result<(), ResourceError> {
        self.create(id, ResourceKind::PointCloud, label)
    }

    fn create_material(
        &mut self,
        id: ResourceId,
        label: &str,
        _material: &Material,
    ) -> Result<(), ResourceError> {
        self.create(id, ResourceKind::Material, label)
    }

    fn write_material(&mut self, _id: ResourceId, _uniform: &ObjectUniform) {
        self.stats.0.borrow_mut().writes += 1;
    }

    fn release(&mut self, id: ResourceId, _kind: ResourceKind) {
        *self.stats.0.borrow_mut().releases.entry(id).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_outlive_the_backend() {
        let mut backend = HeadlessBackend::failing_after(1);
        let stats = backend.stats();
        let material = Material::default();
        let first = ResourceId(1);
        assert!(backend.create_material(first, "a", &material).is_ok());
        assert!(
            backend
                .create_material(ResourceId(2), "b", &material)
                .is_err()
        );
        backend.release(first, ResourceKind::Material);
        drop(backend);

        assert_eq!(stats.created_ids(), vec![first]);
        assert_eq!(stats.release_count(first), 1);
        assert_eq!(stats.live_count(), 0);
    }
}
