//! Non-negative least squares
//!
//! Lawson-Hanson active-set method: minimize `||A x - b||` subject to
//! `x >= 0`. Sub-problems on the passive set are solved through an SVD, so
//! rank-deficient column sets still yield the minimum-norm least-squares
//! step instead of failing.

use nalgebra::{DMatrix, DVector};

/// Errors that can occur during an NNLS solve.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NnlsError {
    /// Matrix rows and target length disagree
    #[error("matrix has {rows} rows but the target vector has {len} entries")]
    DimensionMismatch { rows: usize, len: usize },
    /// Matrix or target contains NaN or infinity
    #[error("input contains NaN or infinite values")]
    NonFinite,
    /// The active-set iteration did not settle
    #[error("iteration limit ({0}) exceeded")]
    IterationLimit(usize),
    /// The passive-set least-squares step could not be computed
    #[error("least-squares sub-problem failed: {0}")]
    Decomposition(String),
}

#[derive(Debug, Clone)]
pub struct NnlsSolution {
    pub x: DVector<f64>,
    /// Euclidean norm of `A x - b`
    pub residual: f64,
    pub iterations: usize,
}

/// Solve `min ||A x - b||, x >= 0`.
///
/// `max_iterations` bounds the inner (step-back) iterations; `None` uses
/// `3 * columns`.
pub fn nnls(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    max_iterations: Option<usize>,
) -> Result<NnlsSolution, NnlsError> {
    let (m, n) = a.shape();
    if b.len() != m {
        return Err(NnlsError::DimensionMismatch { rows: m, len: b.len() });
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(NnlsError::NonFinite);
    }

    let mut x = DVector::zeros(n);
    if m == 0 || n == 0 {
        return Ok(NnlsSolution {
            residual: b.norm(),
            x,
            iterations: 0,
        });
    }

    let budget = max_iterations.unwrap_or(3 * n);
    let tol = 10.0 * f64::EPSILON * column_norm1(a) * m.max(n) as f64;

    let mut passive: Vec<usize> = Vec::new();
    let mut blocked = vec![false; n];
    let mut iterations = 0;
    let mut outer = 0;

    loop {
        let gradient = a.tr_mul(&(b - a * &x));
        let entering = (0..n)
            .filter(|&j| !passive.contains(&j) && !blocked[j] && gradient[j] > tol)
            .max_by(|&i, &j| gradient[i].total_cmp(&gradient[j]));
        let Some(t) = entering else { break };

        outer += 1;
        if outer > budget + n {
            return Err(NnlsError::IterationLimit(budget));
        }

        passive.push(t);
        let mut z = solve_passive(a, b, &passive)?;

        // A column whose unconstrained step is not positive cannot enter.
        if z[passive.len() - 1] <= tol {
            passive.pop();
            blocked[t] = true;
            continue;
        }

        while z.iter().any(|&v| v <= 0.0) {
            iterations += 1;
            if iterations > budget {
                return Err(NnlsError::IterationLimit(budget));
            }

            let alpha = passive
                .iter()
                .zip(z.iter())
                .filter(|&(_, &zj)| zj <= 0.0)
                .map(|(&j, &zj)| x[j] / (x[j] - zj))
                .fold(f64::INFINITY, f64::min);

            for (&j, &zj) in passive.iter().zip(z.iter()) {
                x[j] += alpha * (zj - x[j]);
            }
            passive.retain(|&j| x[j] > tol);
            for j in 0..n {
                if !passive.contains(&j) {
                    x[j] = 0.0;
                }
            }

            if passive.is_empty() {
                z = DVector::zeros(0);
                break;
            }
            z = solve_passive(a, b, &passive)?;
        }

        for (&j, &zj) in passive.iter().zip(z.iter()) {
            x[j] = zj;
        }
        blocked.fill(false);
    }

    let residual = (b - a * &x).norm();
    Ok(NnlsSolution {
        x,
        residual,
        iterations,
    })
}

fn solve_passive(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    passive: &[usize],
) -> Result<DVector<f64>, NnlsError> {
    let sub = a.select_columns(passive.iter());
    let dim = sub.nrows().max(sub.ncols()) as f64;
    let svd = sub.svd(true, true);
    let eps = f64::EPSILON * dim * svd.singular_values.max();
    svd.solve(b, eps)
        .map_err(|e| NnlsError::Decomposition(e.to_string()))
}

/// Largest absolute column sum.
fn column_norm1(a: &DMatrix<f64>) -> f64 {
    a.column_iter()
        .map(|col| col.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
