//! Centroid recomputation and empty-cluster repair.

use std::collections::{BTreeSet, VecDeque};

use super::centroid::Partition;
use super::vectorize::VectorizedDataset;
use crate::sink::LogSink;

impl Partition {
    /// Repair empty clusters, then recompute the touched centroids.
    ///
    /// Only clusters in `touched` are considered. A touched cluster left
    /// without members is repaired by taking one point from a donor cluster
    /// that has more than one member and re-centring on it (norm 1). A
    /// cluster that neither gained nor lost a point this pass is left as it
    /// is, even when empty:
    ///
    /// 1. donors are taken from the touched, non-empty clusters first; a
    ///    donor keeps giving until it is down to a single member;
    /// 2. any cluster still empty takes a point from the first cluster (by
    ///    id) with more than one member, which is then recomputed as well.
    ///
    /// Returns 0 without recomputing anything when fewer than `threshold`
    /// clusters need recomputation; otherwise the number recomputed.
    ///
    /// The gate reuses the moved-point threshold for a cluster count, so with
    /// a nonzero threshold a run can stop while points are still moving.
    pub(crate) fn update_centroids(
        &mut self,
        data: &VectorizedDataset,
        touched: BTreeSet<usize>,
        threshold: usize,
        sink: &mut dyn LogSink,
    ) -> usize {
        let mut empty: VecDeque<usize> = VecDeque::new();
        let mut recompute: BTreeSet<usize> = BTreeSet::new();
        for &cid in &touched {
            if self.centroids[cid].members.is_empty() {
                empty.push_back(cid);
            } else {
                recompute.insert(cid);
            }
        }

        if !empty.is_empty() {
            log::debug!("{} empty cluster(s) to repair", empty.len());

            let donors: Vec<usize> = recompute.iter().copied().collect();
            'donors: for donor in donors {
                while self.centroids[donor].members.len() > 1 {
                    let Some(cid) = empty.pop_front() else {
                        break 'donors;
                    };
                    self.transfer_one(donor, cid, data, sink);
                }
            }

            while let Some(cid) = empty.pop_front() {
                match self.centroids.iter().position(|c| c.members.len() > 1) {
                    Some(donor) => {
                        self.transfer_one(donor, cid, data, sink);
                        recompute.insert(donor);
                    }
                    None => {
                        log::error!("no donor cluster available for empty cluster {cid}");
                        sink.append_line(&format!(
                            "  Warning: cluster {cid} is empty and no cluster can donate a point"
                        ));
                    }
                }
            }
        }

        let updated = recompute.len();
        if updated < threshold {
            return 0;
        }

        for cid in recompute {
            self.centroids[cid].recompute(data);
        }
        updated
    }

    /// Move the most recently assigned member of `donor` into the empty cluster `to`.
    fn transfer_one(
        &mut self,
        donor: usize,
        to: usize,
        data: &VectorizedDataset,
        sink: &mut dyn LogSink,
    ) {
        let Some(p) = self.centroids[donor].members.pop() else {
            return;
        };
        self.adopt(to, p, data);
        log::debug!("cluster {to} adopts point {} from cluster {donor}", data.id(p));
        sink.append_line(&format!(
            "  Empty cluster {to} takes point {} from cluster {donor}",
            data.id(p)
        ));
    }
}
