//! Dense node numbering for schedule graphs.
//!
//! The CPM passes index plain vectors by node id; this maps milestone ids to
//! those positions and back.

use rustc_hash::FxHashMap;

/// Position of a milestone in a schedule graph (u32 keeps edge lists small).
pub type NodeId = u32;

/// Fixed numbering of a timeline's milestones.
///
/// Built once per graph from the milestone ids; node ids follow the order the
/// ids were supplied in. Duplicate ids keep their first position.
#[derive(Debug, Clone, Default)]
pub(crate) struct MilestoneIndex {
    by_id: FxHashMap<String, NodeId>,
    ids: Vec<String>,
}

impl<'a> FromIterator<&'a str> for MilestoneIndex {
    fn from_iter<I: IntoIterator<Item = &'a str>>(milestone_ids: I) -> Self {
        let mut index = MilestoneIndex::default();
        for milestone_id in milestone_ids {
            if index.by_id.contains_key(milestone_id) {
                continue;
            }
            index
                .by_id
                .insert(milestone_id.to_string(), index.ids.len() as NodeId);
            index.ids.push(milestone_id.to_string());
        }
        index
    }
}

impl MilestoneIndex {
    #[inline]
    pub(crate) fn node(&self, milestone_id: &str) -> Option<NodeId> {
        self.by_id.get(milestone_id).copied()
    }

    /// Milestone id at `node`. Panics on a node from another graph.
    #[inline]
    pub(crate) fn milestone_id(&self, node: NodeId) -> &str {
        &self.ids[node as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
