//! Reporting helpers: Classification, ROC and regression metrics.
//!
//! Stateless functions over label and score slices. Inputs are never
//! asserted on: empty or mismatched slices come back as `MetricsError`.

use serde::{Deserialize, Serialize};

use crate::ports::{Classifier, LabelEncoder, LabeledSample};
use crate::CropsenseError;

/// Errors raised by metric computations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("Metric inputs are empty")]
    Empty,

    #[error("Metric inputs differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Label {label} outside {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("ROC needs both positive and negative samples")]
    SingleClass,

    #[error("Grid resolution must be at least 2, got {0}")]
    InvalidResolution(usize),

    #[error("Non-finite value in metric input")]
    NonFinite,
}

fn check_lengths(left: usize, right: usize) -> Result<(), MetricsError> {
    if left != right {
        return Err(MetricsError::LengthMismatch { left, right });
    }
    if left == 0 {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

/// Round to `digits` decimal places.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Confusion matrix: rows are true classes, columns predicted classes.
///
/// # Errors
/// Returns error on empty/mismatched input or a label `>= n_classes`.
pub fn confusion_matrix(
    y_true: &[usize],
    y_pred: &[usize],
    n_classes: usize,
) -> Result<Vec<Vec<usize>>, MetricsError> {
    check_lengths(y_true.len(), y_pred.len())?;

    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        for label in [t, p] {
            if label >= n_classes {
                return Err(MetricsError::LabelOutOfRange { label, n_classes });
            }
        }
        matrix[t][p] += 1;
    }
    Ok(matrix)
}

/// Accuracy and support-weighted precision, recall and F1.
///
/// Values are rounded to four decimal places. Classes with no predicted
/// samples contribute zero precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassificationReport {
    pub const DIGITS: i32 = 4;

    /// Evaluate predicted against true labels.
    ///
    /// # Errors
    /// Returns error on empty or mismatched input.
    pub fn evaluate(y_true: &[usize], y_pred: &[usize]) -> Result<Self, MetricsError> {
        check_lengths(y_true.len(), y_pred.len())?;
        let n_classes = y_true.iter().chain(y_pred).max().map_or(0, |m| m + 1);
        let matrix = confusion_matrix(y_true, y_pred, n_classes)?;
        Ok(Self::from_confusion(&matrix))
    }

    /// Derive the report from a confusion matrix.
    #[must_use]
    pub fn from_confusion(matrix: &[Vec<usize>]) -> Self {
        let n = matrix.len();
        let total: usize = matrix.iter().flatten().sum();
        if total == 0 {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
                support: 0,
            };
        }

        let correct: usize = (0..n).map(|c| matrix[c][c]).sum();
        let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);

        for c in 0..n {
            let tp = matrix[c][c] as f64;
            let support: usize = matrix[c].iter().sum();
            let predicted: usize = matrix.iter().map(|row| row[c]).sum();
            if support == 0 {
                continue;
            }

            let p = if predicted == 0 { 0.0 } else { tp / predicted as f64 };
            let r = tp / support as f64;
            let f = if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) };

            let weight = support as f64 / total as f64;
            precision += weight * p;
            recall += weight * r;
            f1 += weight * f;
        }

        Self {
            accuracy: round_to(correct as f64 / total as f64, Self::DIGITS),
            precision: round_to(precision, Self::DIGITS),
            recall: round_to(recall, Self::DIGITS),
            f1: round_to(f1, Self::DIGITS),
            support: total,
        }
    }
}

/// Report and confusion matrix for a classifier over labelled samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub confusion: Vec<Vec<usize>>,
}

/// Evaluate a classifier on labelled samples.
///
/// # Errors
/// Returns `UnknownLabel` for a sample whose crop is outside the encoder's
/// label space, or a model/metrics error.
pub fn evaluate_classifier<C, E>(
    classifier: &C,
    encoder: &E,
    samples: &[LabeledSample],
) -> Result<Evaluation, CropsenseError>
where
    C: Classifier + ?Sized,
    E: LabelEncoder + ?Sized,
{
    let y_true = samples
        .iter()
        .map(|s| encoder.encode(&s.label))
        .collect::<Result<Vec<_>, _>>()?;
    let features: Vec<_> = samples.iter().map(|s| s.sample.features()).collect();
    let y_pred = classifier.predict_labels(&features)?;

    let confusion = confusion_matrix(&y_true, &y_pred, encoder.len())?;
    let report = ClassificationReport::from_confusion(&confusion);

    tracing::info!(
        "Evaluated {} samples: accuracy={:.4}, f1={:.4}",
        report.support,
        report.accuracy,
        report.f1
    );

    Ok(Evaluation { report, confusion })
}

/// Binary ROC curve points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// `+inf` followed by the distinct scores in descending order
    pub thresholds: Vec<f64>,
}

/// Compute the ROC curve of scores against binary ground truth.
///
/// A sample is predicted positive when its score is `>=` the threshold.
///
/// # Errors
/// Returns error on empty/mismatched input, non-finite scores, or when only
/// one class is present.
pub fn roc_curve(y_true: &[bool], scores: &[f64]) -> Result<RocCurve, MetricsError> {
    check_lengths(y_true.len(), scores.len())?;
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(MetricsError::NonFinite);
    }

    let positives = y_true.iter().filter(|&&t| t).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MetricsError::SingleClass);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let (mut tp, mut fp) = (0usize, 0usize);

    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            curve.fpr.push(fp as f64 / negatives as f64);
            curve.tpr.push(tp as f64 / positives as f64);
            curve.thresholds.push(scores[i]);
        }
    }

    Ok(curve)
}

/// Area under a ROC curve by the trapezoidal rule.
#[must_use]
pub fn roc_auc(curve: &RocCurve) -> f64 {
    curve
        .fpr
        .windows(2)
        .zip(curve.tpr.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
        .sum()
}

/// Regression error metrics.
///
/// MSE and MAE are rounded to four decimals, R² to three.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub mse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionReport {
    /// Evaluate predictions against true values.
    ///
    /// A constant target yields R² of 1 for exact predictions and 0
    /// otherwise.
    ///
    /// # Errors
    /// Returns error on empty or mismatched input.
    pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<Self, MetricsError> {
        check_lengths(y_true.len(), y_pred.len())?;
        let n = y_true.len() as f64;

        let mse = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n;
        let mae = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n;

        let mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
        let ss_res = mse * n;
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(Self {
            mse: round_to(mse, 4),
            mae: round_to(mae, 4),
            r2: round_to(r2, 3),
        })
    }
}

/// Margin added on each side of the data range, as a fraction of the range.
pub const GRID_MARGIN: f64 = 0.2;

/// Class labels over a 2-D grid covering the data.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// `labels[row][col]` is the label at `(xs[col], ys[row])`
    pub labels: Vec<Vec<usize>>,
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}

/// Evaluate `predict` over a `resolution`×`resolution` grid spanning the
/// points plus a 20% margin per axis.
///
/// # Errors
/// Returns error when `points` is empty, has non-finite coordinates, or
/// `resolution < 2`.
pub fn decision_boundary_grid<F>(
    points: &[(f64, f64)],
    resolution: usize,
    mut predict: F,
) -> Result<DecisionGrid, MetricsError>
where
    F: FnMut(f64, f64) -> usize,
{
    if points.is_empty() {
        return Err(MetricsError::Empty);
    }
    if resolution < 2 {
        return Err(MetricsError::InvalidResolution(resolution));
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(MetricsError::NonFinite);
    }

    let axis = |values: Vec<f64>| {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let margin = (max - min) * GRID_MARGIN;
        linspace(min - margin, max + margin, resolution)
    };
    let xs = axis(points.iter().map(|p| p.0).collect());
    let ys = axis(points.iter().map(|p| p.1).collect());

    let labels = ys
        .iter()
        .map(|&y| xs.iter().map(|&x| predict(x, y)).collect())
        .collect();

    Ok(DecisionGrid { xs, ys, labels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let y_true = [0, 1, 2, 0, 1, 2];
        let y_pred = [0, 2, 1, 0, 0, 1];
        let m = confusion_matrix(&y_true, &y_pred, 3).expect("matrix");
        assert_eq!(m, vec![vec![2, 0, 0], vec![1, 0, 1], vec![0, 2, 0]]);
    }

    #[test]
    fn test_confusion_matrix_errors() {
        assert_eq!(confusion_matrix(&[], &[], 2), Err(MetricsError::Empty));
        assert_eq!(
            confusion_matrix(&[0, 1], &[0], 2),
            Err(MetricsError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            confusion_matrix(&[0, 3], &[0, 1], 2),
            Err(MetricsError::LabelOutOfRange {
                label: 3,
                n_classes: 2
            })
        );
    }

    #[test]
    fn test_weighted_report() {
        // Per class: p=[2/3, 0, 0], r=[1, 0, 0]; supports equal
        let report =
            ClassificationReport::evaluate(&[0, 1, 2, 0, 1, 2], &[0, 2, 1, 0, 0, 1]).expect("eval");
        assert!((report.accuracy - 0.3333).abs() < 1e-12);
        assert!((report.precision - 0.2222).abs() < 1e-12);
        assert!((report.recall - 0.3333).abs() < 1e-12);
        assert!((report.f1 - 0.2667).abs() < 1e-12);
        assert_eq!(report.support, 6);
    }

    #[test]
    fn test_perfect_report() {
        let labels = [0, 1, 1, 2, 2, 2];
        let report = ClassificationReport::evaluate(&labels, &labels).expect("eval");
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1, 1.0);
    }

    #[test]
    fn test_roc_curve_thresholds() {
        let y_true = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&y_true, &scores).expect("roc");

        assert_eq!(curve.thresholds[0], f64::INFINITY);
        assert_eq!(&curve.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert!((roc_auc(&curve) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_curve_merges_tied_scores() {
        let y_true = [true, false, true, false];
        let scores = [0.5, 0.5, 0.9, 0.1];
        let curve = roc_curve(&y_true, &scores).expect("roc");

        assert_eq!(curve.thresholds.len(), 4);
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_roc_curve_errors() {
        assert_eq!(
            roc_curve(&[true, true], &[0.2, 0.3]),
            Err(MetricsError::SingleClass)
        );
        assert_eq!(
            roc_curve(&[true, false], &[f64::NAN, 0.3]),
            Err(MetricsError::NonFinite)
        );
        assert_eq!(roc_curve(&[], &[]), Err(MetricsError::Empty));
    }

    #[test]
    fn test_perfect_separation_auc() {
        let curve = roc_curve(&[false, false, true, true], &[0.1, 0.2, 0.8, 0.9]).expect("roc");
        assert!((roc_auc(&curve) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_regression_report() {
        let report = RegressionReport::evaluate(&[3.0, -0.5, 2.0, 7.0], &[2.5, 0.0, 2.0, 8.0])
            .expect("eval");
        assert_eq!(report.mse, 0.375);
        assert_eq!(report.mae, 0.5);
        assert_eq!(report.r2, 0.949);
    }

    #[test]
    fn test_regression_constant_target() {
        let r = RegressionReport::evaluate(&[2.0, 2.0], &[2.0, 2.0]).expect("eval");
        assert_eq!(r.r2, 1.0);
        let r = RegressionReport::evaluate(&[2.0, 2.0], &[1.0, 3.0]).expect("eval");
        assert_eq!(r.r2, 0.0);
        assert_eq!(r.mse, 1.0);
    }

    #[test]
    fn test_decision_grid_bounds() {
        let points = [(0.0, 10.0), (10.0, 20.0)];
        let grid = decision_boundary_grid(&points, 5, |x, _| usize::from(x > 5.0)).expect("grid");

        assert_eq!(grid.xs.len(), 5);
        assert_eq!(grid.xs[0], -2.0);
        assert_eq!(grid.xs[4], 12.0);
        assert_eq!(grid.ys[0], 8.0);
        assert_eq!(grid.ys[4], 22.0);
        assert_eq!(grid.labels.len(), 5);
        assert_eq!(grid.labels[0], vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_decision_grid_errors() {
        assert_eq!(
            decision_boundary_grid(&[], 10, |_, _| 0),
            Err(MetricsError::Empty)
        );
        assert_eq!(
            decision_boundary_grid(&[(0.0, 0.0)], 1, |_, _| 0),
            Err(MetricsError::InvalidResolution(1))
        );
    }

    #[test]
    fn test_evaluate_forest_on_labelled_samples() {
        use crate::adapters::forest::tests::small_forest;
        use crate::domain::{CropLabelEncoder, SoilSample};

        let forest = small_forest();
        let encoder = CropLabelEncoder::from_classes(["chickpea", "maize", "rice"]).expect("enc");
        let samples: Vec<LabeledSample> = [
            (SoilSample::new(90.0, 42.0, 43.0, 20.0, 80.0, 6.5, 200.0), "maize"),
            (SoilSample::new(40.0, 70.0, 80.0, 18.0, 17.0, 7.0, 80.0), "chickpea"),
        ]
        .into_iter()
        .map(|(sample, label)| LabeledSample {
            sample,
            label: label.to_string(),
        })
        .collect();

        let eval = evaluate_classifier(&forest, &encoder, &samples).expect("evaluate");
        assert_eq!(eval.report.support, 2);
        assert_eq!(eval.confusion.len(), 3);
        let total: usize = eval.confusion.iter().flatten().sum();
        assert_eq!(total, 2);

        let unknown = [LabeledSample {
            sample: SoilSample::default(),
            label: "wheat".to_string(),
        }];
        assert!(matches!(
            evaluate_classifier(&forest, &encoder, &unknown),
            Err(CropsenseError::UnknownLabel(_))
        ));
    }
}
