//! Ambiguity clustering: connected-component partitioning of the bipartite
//! candidate graph (union-find).
//!
//! Tracks and reports are nodes, gate-passing candidates are edges. Each
//! connected component becomes one [`Cluster`]; distinct clusters share no
//! track or report id and can be solved independently. Tracks and reports
//! that appear in no candidate are left out entirely — they receive no
//! update this cycle.

use crate::types::{Candidate, ReportId, TrackId};
use std::collections::HashMap;

/// A maximal set of tracks and reports connected through candidate chains.
#[derive(Clone, Debug)]
pub struct Cluster {
    /// Distinct track ids, ascending.
    pub track_ids: Vec<TrackId>,
    /// Distinct report ids, ascending.
    pub report_ids: Vec<ReportId>,
    /// The candidates that stitched this cluster together.
    pub candidates: Vec<Candidate>,
}

// ---------------------------------------------------------------------------
// Union-Find (path halving + union by rank)
// ---------------------------------------------------------------------------

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }
    }
}

/// Partition the candidate list into clusters.
///
/// Combined node numbering: track `i` → node `i`, report `j` → node
/// `n_tracks + j`, so candidate ids must index the caller's collections
/// (`track.0 < n_tracks`, `report.0 < n_reports`); an out-of-range id
/// panics. Clusters are emitted in order of their first candidate's
/// position in the input, so a stable candidate order yields a stable
/// cluster order.
pub fn build_clusters(
    candidates: &[Candidate],
    n_tracks: usize,
    n_reports: usize,
) -> Vec<Cluster> {
    let mut uf = UnionFind::new(n_tracks + n_reports);
    for c in candidates {
        uf.union(c.track.0, n_tracks + c.report.0);
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut root_to_cluster: HashMap<usize, usize> = HashMap::new();

    for c in candidates {
        let root = uf.find(c.track.0);
        let idx = *root_to_cluster.entry(root).or_insert_with(|| {
            clusters.push(Cluster {
                track_ids: Vec::new(),
                report_ids: Vec::new(),
                candidates: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].candidates.push(c.clone());
    }

    for cluster in &mut clusters {
        cluster.track_ids = cluster.candidates.iter().map(|c| c.track).collect();
        cluster.track_ids.sort_unstable();
        cluster.track_ids.dedup();
        cluster.report_ids = cluster.candidates.iter().map(|c| c.report).collect();
        cluster.report_ids.sort_unstable();
        cluster.report_ids.dedup();
    }

    clusters
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn cand(t: usize, r: usize) -> Candidate {
        Candidate {
            track: TrackId(t),
            report: ReportId(r),
            distance: 1.0,
        }
    }

    #[test]
    fn two_independent_clusters() {
        // t1/t3 share r1/r3; t2 pairs with r2 alone.
        let cands = vec![cand(0, 0), cand(0, 2), cand(1, 1), cand(2, 0), cand(2, 2)];
        let clusters = build_clusters(&cands, 3, 4);
        assert_eq!(clusters.len(), 2);

        assert_eq!(clusters[0].track_ids, vec![TrackId(0), TrackId(2)]);
        assert_eq!(clusters[0].report_ids, vec![ReportId(0), ReportId(2)]);
        assert_eq!(clusters[1].track_ids, vec![TrackId(1)]);
        assert_eq!(clusters[1].report_ids, vec![ReportId(1)]);
    }

    #[test]
    fn clusters_partition_participants() {
        let cands = vec![
            cand(0, 0),
            cand(1, 0),
            cand(1, 1),
            cand(2, 2),
            cand(3, 3),
            cand(3, 4),
            cand(4, 4),
        ];
        let clusters = build_clusters(&cands, 5, 5);

        let mut seen_tracks = HashSet::new();
        let mut seen_reports = HashSet::new();
        for cluster in &clusters {
            for t in &cluster.track_ids {
                assert!(seen_tracks.insert(*t), "track {t:?} in two clusters");
            }
            for r in &cluster.report_ids {
                assert!(seen_reports.insert(*r), "report {r:?} in two clusters");
            }
        }
        // Every candidate endpoint is covered by exactly one cluster.
        for c in &cands {
            assert!(seen_tracks.contains(&c.track));
            assert!(seen_reports.contains(&c.report));
        }
    }

    #[test]
    fn transitive_chain_forms_one_cluster() {
        // t1—r1—t2—r2—t3: all connected through shared endpoints.
        let cands = vec![cand(0, 0), cand(1, 0), cand(1, 1), cand(2, 1)];
        let clusters = build_clusters(&cands, 3, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].track_ids.len(), 3);
        assert_eq!(clusters[0].report_ids.len(), 2);
    }

    #[test]
    fn empty_candidates_yield_no_clusters() {
        let clusters = build_clusters(&[], 4, 4);
        assert!(clusters.is_empty());
    }

    #[test]
    fn clustering_is_idempotent() {
        let cands = vec![cand(0, 0), cand(0, 2), cand(2, 0), cand(1, 1)];
        let a = build_clusters(&cands, 3, 3);
        let b = build_clusters(&cands, 3, 3);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.track_ids, y.track_ids);
            assert_eq!(x.report_ids, y.report_ids);
        }
    }
}
