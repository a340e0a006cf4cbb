use landgen_core::{ServiceArea, Targeting};
use landgen_shared::RecordId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One active service-area edge as seen from a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageEdge {
    pub service_area: RecordId,
    pub branch: RecordId,
}

/// Which branches serve which locations, built from the active
/// service-area edges only.
#[derive(Debug, Clone, Default)]
pub struct CoverageIndex {
    by_location: BTreeMap<RecordId, Vec<CoverageEdge>>,
    by_branch: BTreeMap<RecordId, BTreeSet<RecordId>>,
}

impl CoverageIndex {
    pub fn new(areas: &[ServiceArea]) -> Self {
        let mut index = Self::default();

        for area in areas {
            if !area.active {
                continue;
            }
            let (Some(branch), Some(location)) = (&area.branch, &area.location) else {
                debug!(service_area = %area.id, "Ignoring service area with a missing link");
                continue;
            };

            index
                .by_location
                .entry(location.clone())
                .or_default()
                .push(CoverageEdge {
                    service_area: area.id.clone(),
                    branch: branch.clone(),
                });
            index
                .by_branch
                .entry(branch.clone())
                .or_default()
                .insert(location.clone());
        }

        // Stable order regardless of how the store returned the rows
        for edges in index.by_location.values_mut() {
            edges.sort_by(|a, b| a.service_area.cmp(&b.service_area));
        }

        index
    }

    /// Active edges into `location`, lowest service-area id first
    pub fn edges_for_location(&self, location: &RecordId) -> &[CoverageEdge] {
        self.by_location
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of the locations any of `branches` serves
    pub fn locations_served_by<'a, I>(&self, branches: I) -> BTreeSet<RecordId>
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        branches
            .into_iter()
            .filter_map(|branch| self.by_branch.get(branch))
            .flat_map(|locations| locations.iter().cloned())
            .collect()
    }

    /// Locations reachable through a branch targeting set.
    /// `None` means the targeting adds no restriction.
    pub fn reachable_locations(&self, branches: &Targeting) -> Option<BTreeSet<RecordId>> {
        branches.ids().map(|ids| self.locations_served_by(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: &str, branch: &str, location: &str, active: bool) -> ServiceArea {
        ServiceArea {
            id: RecordId::new(id),
            branch: Some(RecordId::new(branch)),
            location: Some(RecordId::new(location)),
            active,
        }
    }

    #[test]
    fn test_inactive_edges_are_ignored() {
        let index = CoverageIndex::new(&[
            area("sa1", "medina", "strongsville", true),
            area("sa2", "medina", "brunswick", false),
        ]);

        let served = index.locations_served_by([&RecordId::new("medina")]);
        assert!(served.contains(&RecordId::new("strongsville")));
        assert!(!served.contains(&RecordId::new("brunswick")));
        assert!(index.edges_for_location(&RecordId::new("brunswick")).is_empty());
    }

    #[test]
    fn test_edges_sorted_by_service_area_id() {
        let index = CoverageIndex::new(&[
            area("sa9", "akron", "medina-city", true),
            area("sa3", "medina", "medina-city", true),
        ]);

        let edges = index.edges_for_location(&RecordId::new("medina-city"));
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].branch, RecordId::new("medina"));
        assert_eq!(edges[1].branch, RecordId::new("akron"));
    }

    #[test]
    fn test_reachable_locations_for_branch_targets() {
        let index = CoverageIndex::new(&[
            area("sa1", "x", "a", true),
            area("sa2", "x", "b", true),
            area("sa3", "y", "c", true),
        ]);

        assert!(index.reachable_locations(&Targeting::Unrestricted).is_none());

        let reachable = index.reachable_locations(&Targeting::only(["x"])).unwrap();
        let expected: BTreeSet<RecordId> = ["a", "b"].into_iter().map(RecordId::from).collect();
        assert_eq!(reachable, expected);
    }
}
