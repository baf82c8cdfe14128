//! PCA - Principal Component Analysis
//!
//! Centers the data (no scaling) and projects it onto the leading
//! eigenvectors of the sample covariance matrix. The eigendecomposition uses
//! Householder tridiagonalization followed by implicit QL iterations, so the
//! full spectrum is available even when hundreds of components are kept.

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Sweep cap per eigenvalue for the QL iterations
const MAX_QL_ITERATIONS: usize = 64;

/// PCA configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaConfig {
    /// Requested output dimensions, clipped to min(n_samples, n_features) at fit
    pub n_components: usize,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self { n_components: 100 }
    }
}

/// Fitted PCA projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pca {
    config: PcaConfig,
    mean: Option<Array1<f64>>,
    /// n_components x n_features, one component per row
    components: Option<Array2<f64>>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Pca {
    pub fn new(config: PcaConfig) -> Self {
        Self {
            config,
            mean: None,
            components: None,
            explained_variance: Vec::new(),
            explained_variance_ratio: Vec::new(),
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let (n, d) = x.dim();
        if self.config.n_components == 0 {
            return Err(PredictorError::InvalidParameter {
                name: "n_components".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if n < 2 {
            return Err(PredictorError::DataError(
                "PCA requires at least 2 samples".to_string(),
            ));
        }
        if d < 1 {
            return Err(PredictorError::DataError(
                "PCA requires at least 1 feature".to_string(),
            ));
        }

        let k = self.config.n_components.min(n).min(d);
        if k < self.config.n_components {
            tracing::debug!(
                requested = self.config.n_components,
                used = k,
                "Clipping PCA components to data shape"
            );
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PredictorError::DataError("empty matrix".to_string()))?;
        let centered = x - &mean;
        let cov = centered.t().dot(&centered) / (n as f64 - 1.0);
        let total_variance: f64 = cov.diag().sum();

        let (eigenvalues, eigenvectors) = symmetric_eigen(&cov)?;

        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let mut components = Array2::zeros((k, d));
        let mut explained_variance = Vec::with_capacity(k);
        for (row, &idx) in order.iter().take(k).enumerate() {
            let mut v = eigenvectors.column(idx).to_owned();
            flip_sign(&mut v);
            components.row_mut(row).assign(&v);
            explained_variance.push(eigenvalues[idx].max(0.0));
        }

        let explained_variance_ratio = explained_variance
            .iter()
            .map(|&ev| {
                if total_variance > 0.0 {
                    ev / total_variance
                } else {
                    0.0
                }
            })
            .collect();

        self.mean = Some(mean);
        self.components = Some(components);
        self.explained_variance = explained_variance;
        self.explained_variance_ratio = explained_variance_ratio;
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, components) = match (&self.mean, &self.components) {
            (Some(m), Some(c)) => (m, c),
            _ => return Err(PredictorError::ModelNotFitted),
        };
        if x.ncols() != mean.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} features", mean.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x - mean).dot(&components.t()))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Components actually kept after clipping
    pub fn n_components(&self) -> usize {
        self.components.as_ref().map_or(0, |c| c.nrows())
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    pub fn config(&self) -> &PcaConfig {
        &self.config
    }
}

/// Make the largest-magnitude loading positive so refits give identical signs.
fn flip_sign(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix.
fn symmetric_eigen(a: &Array2<f64>) -> Result<(Vec<f64>, Array2<f64>)> {
    let n = a.nrows();
    let mut v = a.clone();
    let mut d = vec![0.0f64; n];
    let mut e = vec![0.0f64; n];

    tridiagonalize(&mut v, &mut d, &mut e);
    ql_implicit(&mut v, &mut d, &mut e)?;

    Ok((d, v))
}

/// Householder reduction to tridiagonal form, accumulating the transform in `v`.
fn tridiagonalize(v: &mut Array2<f64>, d: &mut [f64], e: &mut [f64]) {
    let n = d.len();
    for j in 0..n {
        d[j] = v[[n - 1, j]];
    }

    for i in (1..n).rev() {
        let scale: f64 = d[..i].iter().map(|x| x.abs()).sum();
        let mut h = 0.0;

        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[[i - 1, j]];
                v[[i, j]] = 0.0;
                v[[j, i]] = 0.0;
            }
        } else {
            for dk in d[..i].iter_mut() {
                *dk /= scale;
                h += *dk * *dk;
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for ej in e[..i].iter_mut() {
                *ej = 0.0;
            }

            for j in 0..i {
                f = d[j];
                v[[j, i]] = f;
                g = e[j] + v[[j, j]] * f;
                for k in (j + 1)..i {
                    g += v[[k, j]] * d[k];
                    e[k] += v[[k, j]] * f;
                }
                e[j] = g;
            }

            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[[k, j]] -= f * e[k] + g * d[k];
                }
                d[j] = v[[i - 1, j]];
                v[[i, j]] = 0.0;
            }
        }
        d[i] = h;
    }

    for i in 0..n.saturating_sub(1) {
        v[[n - 1, i]] = v[[i, i]];
        v[[i, i]] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[[k, i + 1]] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[[k, i + 1]] * v[[k, j]];
                }
                for k in 0..=i {
                    v[[k, j]] -= g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[[k, i + 1]] = 0.0;
        }
    }

    for j in 0..n {
        d[j] = v[[n - 1, j]];
        v[[n - 1, j]] = 0.0;
    }
    v[[n - 1, n - 1]] = 1.0;
    e[0] = 0.0;
}

/// Implicit QL iterations on the tridiagonal matrix (d, e).
fn ql_implicit(v: &mut Array2<f64>, d: &mut [f64], e: &mut [f64]) -> Result<()> {
    let n = d.len();
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let mut f = 0.0;
    let mut tst1 = 0.0f64;
    let eps = f64::EPSILON;

    for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n - 1 && e[m].abs() > eps * tst1 {
            m += 1;
        }

        if m > l {
            let mut iterations = 0;
            loop {
                iterations += 1;
                if iterations > MAX_QL_ITERATIONS {
                    return Err(PredictorError::TrainingError(
                        "eigendecomposition did not converge".to_string(),
                    ));
                }

                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for di in d.iter_mut().skip(l + 2) {
                    *di -= h;
                }
                f += h;

                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0;
                let mut s2 = 0.0;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        let vk1 = v[[k, i + 1]];
                        v[[k, i + 1]] = s * v[[k, i]] + c * vk1;
                        v[[k, i]] = c * v[[k, i]] - s * vk1;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }
    Ok(())
}
