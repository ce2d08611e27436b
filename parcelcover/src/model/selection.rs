//! Ephemeral feature selections.

use super::feature::FeatureId;
use std::collections::BTreeSet;

/// How a location-based selection combines with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Discard any prior selection and start fresh.
    New,
    /// Keep only features present in both the prior selection and the hits.
    Subset,
    /// Union the hits into the prior selection.
    Add,
}

/// A named subset of a layer's features.
///
/// Selections are not persisted; [`crate::select::materialize`] copies the
/// selected features into a new layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    /// Name of the layer the ids belong to.
    pub layer: String,
    ids: BTreeSet<FeatureId>,
}

impl SelectionSet {
    pub fn new(layer: impl Into<String>, ids: BTreeSet<FeatureId>) -> Self {
        Self {
            layer: layer.into(),
            ids,
        }
    }

    pub fn empty(layer: impl Into<String>) -> Self {
        Self::new(layer, BTreeSet::new())
    }

    pub fn ids(&self) -> &BTreeSet<FeatureId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.ids.contains(&id)
    }

    /// Combines fresh hits with this selection according to `mode`.
    pub fn combine(&self, hits: BTreeSet<FeatureId>, mode: SelectionMode) -> SelectionSet {
        let ids = match mode {
            SelectionMode::New => hits,
            SelectionMode::Subset => self.ids.intersection(&hits).copied().collect(),
            SelectionMode::Add => self.ids.union(&hits).copied().collect(),
        };
        SelectionSet::new(self.layer.clone(), ids)
    }
}
