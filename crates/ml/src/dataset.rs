//! Training dataset assembly, splitting, and evaluation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vulnscan_core::features::feature_vector_for;
use vulnscan_core::finding::NormalizedFinding;
use vulnscan_store::models::EvaluationMetrics;

use crate::model::PriorityModel;

/// Fixed shuffle seed so a training run over the same dataset reproduces
/// the same split and therefore the same metrics.
pub const SPLIT_SEED: u64 = 42;

/// Held-out fraction of the dataset.
pub const TEST_FRACTION: f64 = 0.2;

/// Classification threshold applied to scores during evaluation.
const DECISION_THRESHOLD: f64 = 0.5;

/// One labeled training sample: a normalized finding plus its explicit
/// high-priority label. Labels come from the caller (analyst triage or a
/// labeling rule), never inferred here.
#[derive(Debug, Clone)]
pub struct LabeledVulnerability {
    pub finding: NormalizedFinding,
    pub high_priority: bool,
}

/// Build the design matrix for a sample set against a feature ordering.
pub fn design_matrix(names: &[String], samples: &[LabeledVulnerability]) -> Vec<Vec<f64>> {
    samples
        .iter()
        .map(|sample| feature_vector_for(names, &sample.finding))
        .collect()
}

pub fn labels(samples: &[LabeledVulnerability]) -> Vec<bool> {
    samples.iter().map(|s| s.high_priority).collect()
}

/// Shuffle with the fixed seed and split off the held-out tail.
///
/// The training side always keeps at least one sample; with a single-sample
/// dataset the test side comes back empty.
pub fn train_test_split(
    mut samples: Vec<LabeledVulnerability>,
) -> (Vec<LabeledVulnerability>, Vec<LabeledVulnerability>) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    samples.shuffle(&mut rng);

    let test_len = ((samples.len() as f64) * TEST_FRACTION).round() as usize;
    let test_len = test_len.min(samples.len().saturating_sub(1));
    let train_len = samples.len() - test_len;

    let test = samples.split_off(train_len);
    (samples, test)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a fitted model on a held-out sample set.
///
/// An empty test set yields all-zero metrics rather than an error; the
/// trainer still persists the model, it just carries no evidence.
pub fn evaluate(model: &PriorityModel, test: &[LabeledVulnerability]) -> EvaluationMetrics {
    let scored: Vec<(f64, bool)> = test
        .iter()
        .map(|sample| {
            let values = feature_vector_for(&model.feature_names, &sample.finding);
            (model.predict_score(&values), sample.high_priority)
        })
        .collect();

    let mut confusion = [[0u64; 2]; 2];
    for (score, actual) in &scored {
        let predicted = *score >= DECISION_THRESHOLD;
        confusion[usize::from(*actual)][usize::from(predicted)] += 1;
    }

    let [[tn, fp], [fn_, tp]] = confusion;
    let total = tn + fp + fn_ + tp;

    let ratio = |num: u64, den: u64| if den > 0 { num as f64 / den as f64 } else { 0.0 };
    let accuracy = ratio(tn + tp, total);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        confusion_matrix: confusion,
        roc_auc: roc_auc(&scored),
    }
}

/// Rank-based ROC AUC (Mann-Whitney U). `None` unless both classes are
/// present in the test set.
fn roc_auc(scored: &[(f64, bool)]) -> Option<f64> {
    let positives = scored.iter().filter(|(_, label)| *label).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut sorted: Vec<&(f64, bool)> = scored.iter().collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Average ranks across ties.
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j].0 == sorted[i].0 {
            j += 1;
        }
        let avg_rank = ((i + 1 + j) as f64) / 2.0;
        for item in &sorted[i..j] {
            if item.1 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
