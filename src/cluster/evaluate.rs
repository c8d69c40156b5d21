//! External evaluation of a clustering against ground-truth labels.
//!
//! Labels are ranked by descending class size (ties by name) and numbered
//! densely; the contingency table has one row per cluster and one column per
//! label. Purity of a cluster is its largest cell over its size; entropy is
//! the Shannon entropy (base 2) of its row. Aggregates are weighted by
//! cluster size over the number of clustered points.
//!
//! Members that carry no label still count toward cluster sizes and totals.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use super::kmeans::ClusteringResult;
use super::store::PointId;
use crate::sink::LogSink;

/// Ground truth: label name to the ids of its members.
pub type LabelMap = HashMap<String, BTreeSet<PointId>>;

/// Scores for a single cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterScore {
    /// Cluster id.
    pub cluster: usize,
    /// Number of members, labeled or not.
    pub size: usize,
    /// Members that appear under no label.
    pub unlabeled: usize,
    /// Size of the largest label group in the cluster.
    pub majority: usize,
    /// `majority / size` (0 for an empty cluster).
    pub purity: f64,
    /// Entropy of the label distribution, in bits.
    pub entropy: f64,
}

/// Read-only evaluation of one clustering result.
#[derive(Clone, Debug)]
pub struct EvaluationReport {
    categories: Vec<String>,
    contingency: Vec<Vec<usize>>,
    clusters: Vec<ClusterScore>,
    purity: f64,
    entropy: f64,
    unlabeled: usize,
    unclustered_labels: usize,
    n_points: usize,
    dimension: usize,
    objective: f64,
    elapsed: Duration,
}

impl EvaluationReport {
    /// Label names in category-id order (largest class first).
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// `contingency()[cluster][category]` = members of `cluster` with that label.
    pub fn contingency(&self) -> &[Vec<usize>] {
        &self.contingency
    }

    /// Per-cluster scores, by cluster id.
    pub fn clusters(&self) -> &[ClusterScore] {
        &self.clusters
    }

    /// Weighted purity over all clusters.
    pub fn purity(&self) -> f64 {
        self.purity
    }

    /// Weighted entropy over all clusters.
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Clustered points that appear under no label.
    pub fn unlabeled(&self) -> usize {
        self.unlabeled
    }

    /// Labeled ids that are not part of the clustering.
    pub fn unclustered_labels(&self) -> usize {
        self.unclustered_labels
    }

    /// Write the report to a run-log sink, one line at a time.
    pub fn emit(&self, sink: &mut dyn LogSink) {
        for line in self.to_string().lines() {
            sink.append_line(line);
        }
    }
}

/// Score `result` against `labels`.
pub fn evaluate(result: &ClusteringResult, labels: &LabelMap) -> EvaluationReport {
    let mut ranked: Vec<(&String, &BTreeSet<PointId>)> = labels.iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let categories: Vec<String> = ranked.iter().map(|(name, _)| (*name).clone()).collect();
    let mut category_of: HashMap<PointId, usize> = HashMap::new();
    for (cat, (_, ids)) in ranked.iter().enumerate() {
        for &id in ids.iter() {
            category_of.entry(id).or_insert(cat);
        }
    }

    let n_categories = categories.len();
    let total = result.n_points();
    let mut contingency: Vec<Vec<usize>> = Vec::with_capacity(result.k());
    let mut clusters: Vec<ClusterScore> = Vec::with_capacity(result.k());
    let mut majority_sum = 0usize;
    let mut weighted_entropy = 0.0f64;
    let mut unlabeled_total = 0usize;

    for (cid, members) in result.clusters().iter().enumerate() {
        let mut row = vec![0usize; n_categories];
        let mut unlabeled = 0usize;
        for id in members {
            match category_of.get(id) {
                Some(&cat) => row[cat] += 1,
                None => unlabeled += 1,
            }
        }
        if unlabeled > 0 {
            log::warn!("cluster {cid}: {unlabeled} member(s) have no label");
        }

        let size = members.len();
        let majority = row.iter().copied().max().unwrap_or(0);
        let entropy = row_entropy(&row, size);
        let purity = if size > 0 {
            majority as f64 / size as f64
        } else {
            0.0
        };

        majority_sum += majority;
        weighted_entropy += entropy * size as f64;
        unlabeled_total += unlabeled;

        clusters.push(ClusterScore {
            cluster: cid,
            size,
            unlabeled,
            majority,
            purity,
            entropy,
        });
        contingency.push(row);
    }

    let unclustered_labels = category_of
        .keys()
        .filter(|id| result.cluster_of(**id).is_none())
        .count();
    if unclustered_labels > 0 {
        log::warn!("{unclustered_labels} labeled id(s) are not part of the clustering");
    }

    let (purity, entropy) = if total > 0 {
        (
            majority_sum as f64 / total as f64,
            weighted_entropy / total as f64,
        )
    } else {
        (0.0, 0.0)
    };

    EvaluationReport {
        categories,
        contingency,
        clusters,
        purity,
        entropy,
        unlabeled: unlabeled_total,
        unclustered_labels,
        n_points: total,
        dimension: result.dimension(),
        objective: result.objective(),
        elapsed: result.elapsed(),
    }
}

fn row_entropy(row: &[usize], size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    row.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / size as f64;
            -p * p.log2()
        })
        .sum()
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Clustering Analysis:")?;
        writeln!(
            f,
            "# of clusters: {},\t# of data obj.: {},\t# of dims: {},\tTime taken: {:.6}s",
            self.clusters.len(),
            self.n_points,
            self.dimension,
            self.elapsed.as_secs_f64()
        )?;
        if self.unlabeled > 0 || self.unclustered_labels > 0 {
            writeln!(
                f,
                "Unlabeled members: {},\tLabeled ids not clustered: {}",
                self.unlabeled, self.unclustered_labels
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Cluster\tEntropy \tPurity   \tObj. Value")?;
        writeln!(
            f,
            "{:>7}\t{:.6}\t{:.6}\t{:.6}",
            " ", self.entropy, self.purity, self.objective
        )?;
        for c in &self.clusters {
            writeln!(f, "{:>7}: {:.6}\t{:.6}", c.cluster, c.entropy, c.purity)?;
        }

        writeln!(f)?;
        writeln!(f, "Clustering matrix:")?;
        write!(f, "Cluster")?;
        for name in &self.categories {
            write!(f, "\t{name}")?;
        }
        writeln!(f)?;
        for (cid, row) in self.contingency.iter().enumerate() {
            write!(f, "{cid:>2}")?;
            for cell in row {
                write!(f, "\t{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
