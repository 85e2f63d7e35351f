//! Least-squares and banded solvers used by the filters and the interpolant.

/// Pivots smaller than this (relative to the largest entry of the matrix)
/// are treated as zero.
const SINGULAR_TOL: f64 = 1e-12;

/// Diagonal entries of `R` smaller than this (relative to the largest one,
/// after the columns are scaled to unit norm) mark a rank-deficient matrix.
const RANK_TOL: f64 = 1e-14;

/// Thin Householder QR factorisation of a tall matrix, `A = Q·R` with
/// `Q` of size `rows × cols` and `R` upper triangular.
///
/// Columns are scaled to unit norm before factorising, so the rank test
/// does not depend on the units of the individual columns.
#[derive(Debug, Clone)]
pub struct Qr {
    q: Vec<Vec<f64>>,
    r: Vec<Vec<f64>>,
    col_scale: Vec<f64>,
}

impl Qr {
    /// Factorise `a` (row-major, `rows ≥ cols`). Returns `None` when the
    /// matrix is empty, ragged, non-finite or rank deficient.
    pub fn new(a: &[Vec<f64>]) -> Option<Self> {
        let rows = a.len();
        let cols = a.first().map_or(0, Vec::len);
        if cols == 0 || rows < cols || a.iter().any(|row| row.len() != cols) {
            return None;
        }

        let col_scale: Vec<f64> = (0..cols)
            .map(|j| a.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt())
            .collect();
        if col_scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return None;
        }
        let mut work: Vec<Vec<f64>> = a
            .iter()
            .map(|row| row.iter().zip(&col_scale).map(|(v, s)| v / s).collect())
            .collect();

        let mut reflectors: Vec<Vec<f64>> = Vec::with_capacity(cols);
        for k in 0..cols {
            let norm = (k..rows).map(|i| work[i][k] * work[i][k]).sum::<f64>().sqrt();
            let alpha = if work[k][k] > 0.0 { -norm } else { norm };
            let mut v: Vec<f64> = (k..rows).map(|i| work[i][k]).collect();
            v[0] -= alpha;
            reflect(&v, &mut work[k..], k..cols);
            reflectors.push(v);
        }

        let r: Vec<Vec<f64>> = (0..cols)
            .map(|i| (0..cols).map(|j| if j < i { 0.0 } else { work[i][j] }).collect())
            .collect();
        let largest = (0..cols).fold(0.0_f64, |acc, i| acc.max(r[i][i].abs()));
        if !largest.is_finite() || (0..cols).any(|i| r[i][i].abs() <= RANK_TOL * largest) {
            return None;
        }

        // Q's columns are the reflectors applied, last to first, to the
        // leading unit vectors.
        let mut q = vec![vec![0.0; cols]; rows];
        for j in 0..cols {
            let mut e: Vec<Vec<f64>> = (0..rows).map(|i| vec![if i == j { 1.0 } else { 0.0 }]).collect();
            for (k, v) in reflectors.iter().enumerate().rev() {
                reflect(v, &mut e[k..], 0..1);
            }
            for (row, value) in q.iter_mut().zip(e) {
                row[j] = value[0];
            }
        }

        Some(Self { q, r, col_scale })
    }

    /// `Qᵀ·b`.
    fn qt_mul(&self, b: &[f64]) -> Vec<f64> {
        let cols = self.r.len();
        (0..cols)
            .map(|j| self.q.iter().zip(b).map(|(row, v)| row[j] * v).sum())
            .collect()
    }

    /// Least-squares solution of `A·x ≈ b`.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let mut x = self.qt_mul(b);
        for i in (0..x.len()).rev() {
            let tail: f64 = (i + 1..x.len()).map(|j| self.r[i][j] * x[j]).sum();
            x[i] = (x[i] - tail) / self.r[i][i];
        }
        x.iter().zip(&self.col_scale).map(|(v, s)| v / s).collect()
    }

    /// Orthogonal projection of `b` onto the column space of `A`, i.e. the
    /// fitted values `A·x` of the least-squares solution.
    pub fn project(&self, b: &[f64]) -> Vec<f64> {
        let qtb = self.qt_mul(b);
        self.q
            .iter()
            .map(|row| row.iter().zip(&qtb).map(|(a, c)| a * c).sum())
            .collect()
    }

    /// Row `i` of the projection matrix `Q·Qᵀ`: the weights that produce
    /// the fitted value at row `i` from the observations.
    pub fn projection_row(&self, i: usize) -> Vec<f64> {
        let qi = &self.q[i];
        self.q
            .iter()
            .map(|row| row.iter().zip(qi).map(|(a, b)| a * b).sum())
            .collect()
    }
}

/// Apply the Householder reflection `I - 2·v·vᵀ / (vᵀv)` to the columns
/// `cols` of `rows` (whose first row lines up with `v[0]`).
fn reflect(v: &[f64], rows: &mut [Vec<f64>], cols: std::ops::Range<usize>) {
    let vv: f64 = v.iter().map(|x| x * x).sum();
    if vv == 0.0 {
        return;
    }
    for j in cols {
        let dot: f64 = v.iter().zip(rows.iter()).map(|(vi, row)| vi * row[j]).sum();
        let factor = 2.0 * dot / vv;
        for (vi, row) in v.iter().zip(rows.iter_mut()) {
            row[j] -= factor * vi;
        }
    }
}

/// Rows `[1, z, z², …, z^degree]` for each position.
pub fn vandermonde(positions: &[f64], degree: usize) -> Vec<Vec<f64>> {
    positions
        .iter()
        .map(|&z| {
            std::iter::successors(Some(1.0), |p| Some(p * z))
                .take(degree + 1)
                .collect()
        })
        .collect()
}

/// Rows `[P0(z), P1(z), …, P_degree(z)]` of Legendre polynomials, for
/// positions in `[-1, 1]`. Spans the same space as [`vandermonde`] but
/// stays well conditioned at high degree.
pub fn legendre(positions: &[f64], degree: usize) -> Vec<Vec<f64>> {
    positions
        .iter()
        .map(|&z| {
            let mut row = Vec::with_capacity(degree + 1);
            row.push(1.0);
            if degree >= 1 {
                row.push(z);
            }
            for k in 1..degree {
                let kf = k as f64;
                let next = ((2.0 * kf + 1.0) * z * row[k] - kf * row[k - 1]) / (kf + 1.0);
                row.push(next);
            }
            row
        })
        .collect()
}

/// Least-squares polynomial fit. Returns coefficients in ascending order
/// (`c[0] + c[1]·x + c[2]·x² + …`), or `None` when the fit is singular.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    if x.len() != y.len() || x.len() < degree + 1 {
        return None;
    }
    Qr::new(&vandermonde(x, degree)).map(|qr| qr.solve(y))
}

// ---------------------------------------------------------------------------
// Banded systems
// ---------------------------------------------------------------------------

/// Square matrix with `kl` sub-diagonals and `ku` super-diagonals.
///
/// Row `i` keeps columns `i - kl ..= i + ku + kl`; the extra `kl` columns
/// on the right hold the fill-in produced by row swaps during pivoting.
#[derive(Debug, Clone)]
pub struct BandedMatrix {
    n: usize,
    kl: usize,
    ku: usize,
    width: usize,
    data: Vec<f64>,
}

impl BandedMatrix {
    pub fn zeros(n: usize, kl: usize, ku: usize) -> Self {
        let width = 2 * kl + ku + 1;
        Self {
            n,
            kl,
            ku,
            width,
            data: vec![0.0; n * width],
        }
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        debug_assert!(col + self.kl >= row && col <= row + self.ku + self.kl);
        row * self.width + (col + self.kl - row)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.offset(row, col)]
    }

    /// Set an entry inside the declared band.
    ///
    /// # Panics
    /// If `(row, col)` lies outside the band.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(
            col + self.kl >= row && col <= row + self.ku,
            "entry ({row}, {col}) outside band kl={} ku={}",
            self.kl,
            self.ku
        );
        let idx = self.offset(row, col);
        self.data[idx] = value;
    }

    /// Solve `self · x = b` by banded LU with partial pivoting.
    /// Consumes the matrix; returns `None` when it is singular.
    pub fn solve(mut self, mut b: Vec<f64>) -> Option<Vec<f64>> {
        let n = self.n;
        if b.len() != n {
            return None;
        }
        let reach = self.kl + self.ku;
        let scale = self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if n > 0 && (scale == 0.0 || !scale.is_finite()) {
            return None;
        }

        for i in 0..n {
            let last_row = (i + self.kl).min(n - 1);
            let last_col = (i + reach).min(n - 1);

            let pivot_row = (i..=last_row)
                .max_by(|&p, &q| self.get(p, i).abs().total_cmp(&self.get(q, i).abs()))?;
            if self.get(pivot_row, i).abs() <= SINGULAR_TOL * scale {
                return None;
            }
            if pivot_row != i {
                for c in i..=last_col {
                    let a = self.offset(i, c);
                    let p = self.offset(pivot_row, c);
                    self.data.swap(a, p);
                }
                b.swap(i, pivot_row);
            }

            let pivot = self.get(i, i);
            for r in i + 1..=last_row {
                let factor = self.get(r, i) / pivot;
                if factor == 0.0 {
                    continue;
                }
                for c in i..=last_col {
                    let upper = self.get(i, c);
                    let idx = self.offset(r, c);
                    self.data[idx] -= factor * upper;
                }
                b[r] -= factor * b[i];
            }
        }

        for i in (0..n).rev() {
            let last_col = (i + reach).min(n - 1);
            let tail: f64 = (i + 1..=last_col).map(|c| self.get(i, c) * b[c]).sum();
            b[i] = (b[i] - tail) / self.get(i, i);
        }

        b.iter().all(|v| v.is_finite()).then_some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn qr_solves_square_system() {
        let a = vec![vec![0.0, 2.0], vec![3.0, 1.0]];
        let x = Qr::new(&a).unwrap().solve(&[4.0, 5.0]);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn qr_detects_rank_deficiency() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        assert!(Qr::new(&a).is_none());
        assert!(Qr::new(&[vec![0.0, 1.0], vec![0.0, 2.0]]).is_none());
    }

    #[test]
    fn projection_matches_fitted_values() {
        let x: Vec<f64> = (0..7).map(f64::from).collect();
        let y = [1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 9.0];
        let qr = Qr::new(&vandermonde(&x, 1)).unwrap();
        let c = qr.solve(&y);
        let fitted = qr.project(&y);
        for (i, xi) in x.iter().enumerate() {
            assert_abs_diff_eq!(fitted[i], c[0] + c[1] * xi, epsilon = 1e-12);
            let weighted: f64 = qr.projection_row(i).iter().zip(&y).map(|(w, v)| w * v).sum();
            assert_abs_diff_eq!(weighted, fitted[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn legendre_rows_follow_recurrence() {
        let rows = legendre(&[0.5, -1.0], 3);
        assert_abs_diff_eq!(rows[0][2], 0.5 * (3.0 * 0.25 - 1.0), epsilon = 1e-15);
        assert_abs_diff_eq!(rows[0][3], 0.5 * (5.0 * 0.125 - 1.5), epsilon = 1e-15);
        assert_eq!(rows[1], vec![1.0, -1.0, 1.0, -1.0]);
        assert_eq!(legendre(&[0.3], 0), vec![vec![1.0]]);
    }

    #[test]
    fn polyfit_recovers_exact_quadratic() {
        let x: Vec<f64> = (-5..=5).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 - 2.0 * v + 0.5 * v * v).collect();
        let c = polyfit(&x, &y, 2).unwrap();
        assert_abs_diff_eq!(c[0], 1.5, epsilon = 1e-10);
        assert_abs_diff_eq!(c[1], -2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(c[2], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn polyfit_is_unit_independent() {
        // Abscissas around 1e-3 wide; columns differ by many orders of
        // magnitude.
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 2e-5).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 4e3 * v + 2e6 * v * v).collect();
        let c = polyfit(&x, &y, 2).unwrap();
        assert_abs_diff_eq!(c[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c[1] / 4e3, -1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(c[2] / 2e6, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn polyfit_rejects_too_few_points() {
        assert!(polyfit(&[0.0, 1.0], &[1.0, 2.0], 2).is_none());
        // Three identical abscissas leave the fit singular.
        assert!(polyfit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 2).is_none());
    }

    #[test]
    fn banded_matches_qr_on_tridiagonal() {
        let n = 6;
        let mut band = BandedMatrix::zeros(n, 1, 1);
        let mut dense = vec![vec![0.0; n]; n];
        for i in 0..n {
            // Small diagonal forces row swaps.
            let diag = if i % 2 == 0 { 0.1 } else { 4.0 };
            band.set(i, i, diag);
            dense[i][i] = diag;
            if i > 0 {
                band.set(i, i - 1, 1.0);
                dense[i][i - 1] = 1.0;
            }
            if i + 1 < n {
                band.set(i, i + 1, 2.0);
                dense[i][i + 1] = 2.0;
            }
        }
        let b: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
        let xd = Qr::new(&dense).unwrap().solve(&b);
        let xb = band.solve(b).unwrap();
        for (u, v) in xb.iter().zip(&xd) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-10);
        }
    }

    #[test]
    fn banded_detects_singular() {
        let mut band = BandedMatrix::zeros(3, 1, 1);
        band.set(0, 0, 1.0);
        band.set(1, 0, 2.0);
        band.set(1, 1, 0.0);
        band.set(2, 2, 1.0);
        assert!(band.solve(vec![1.0, 2.0, 3.0]).is_none());
    }
}
