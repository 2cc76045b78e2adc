//! Homography estimation
//!
//! A homography maps points of one plane to another: `x' ~ H x`. It is
//! estimated from four or more point correspondences with the normalized
//! Direct Linear Transform:
//!
//! 1. Both point sets are translated to zero mean and scaled so the mean
//!    distance from the origin is `sqrt(2)`.
//! 2. Each correspondence contributes two rows to the design matrix `A`
//!    (`2n x 9`), and `A h = 0` is solved by SVD. With more than four pairs
//!    this is the least-squares solution.
//! 3. With more than four pairs the algebraic solution is refined with
//!    Levenberg-Marquardt on the geometric reprojection error. The
//!    refinement is deterministic and kept only if it lowers the error.
//! 4. The result is de-normalized and scaled so that `H[2][2] = 1`.

use crate::error::{TransformError, TransformResult};
use dewarp_core::Point;
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, Matrix3, Vector3, storage::Owned};

/// Projective denominators smaller than this are points at infinity.
const INFINITY_EPS: f64 = 1e-12;

/// `|H[2][2]|` relative to the matrix norm below which `H` is left unscaled.
const SCALE_EPS: f64 = 1e-12;

/// Smallest-to-largest singular value ratio of a numerically singular 3x3.
const SINGULAR_RATIO: f64 = 1e-10;

/// Eigenvalue ratio of the point scatter below which a set is collinear.
const COLLINEAR_RATIO: f64 = 1e-10;

/// Options for homography estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateOptions {
    /// Maximum number of refinement iterations (0 disables refinement)
    pub refine_iterations: usize,
    /// Relative singular-value threshold below which the linear system is
    /// considered rank-deficient
    pub rank_tolerance: f64,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            refine_iterations: 20,
            rank_tolerance: 1e-10,
        }
    }
}

/// A non-singular 3x3 projective transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
    normalized: bool,
}

impl Homography {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
            normalized: true,
        }
    }

    /// Create a homography from a matrix.
    ///
    /// The matrix is scaled so that `H[2][2] = 1` when that entry is not
    /// close to zero.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidParameters`] for non-finite entries
    /// and [`TransformError::SingularMatrix`] for a singular matrix.
    pub fn from_matrix(m: Matrix3<f64>) -> TransformResult<Self> {
        if !m.iter().all(|v| v.is_finite()) {
            return Err(TransformError::InvalidParameters(
                "homography entries must be finite".to_string(),
            ));
        }
        if is_singular(&m) {
            return Err(TransformError::SingularMatrix);
        }
        Ok(Self::scaled(m))
    }

    fn scaled(m: Matrix3<f64>) -> Self {
        let s = m[(2, 2)];
        if s.abs() > SCALE_EPS * m.norm() {
            Self {
                m: m / s,
                normalized: true,
            }
        } else {
            Self {
                m,
                normalized: false,
            }
        }
    }

    /// The underlying matrix
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Determinant of the matrix
    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }

    /// Whether the matrix was scaled to `H[2][2] = 1`
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Map a point through the homography.
    ///
    /// Returns `None` if the point maps to infinity.
    pub fn transform_point(&self, p: Point) -> Option<Point> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        if v.z.abs() < INFINITY_EPS {
            return None;
        }
        Some(Point::new(v.x / v.z, v.y / v.z))
    }

    /// The inverse transform
    pub fn inverse(&self) -> TransformResult<Homography> {
        let inv = self
            .m
            .try_inverse()
            .ok_or(TransformError::SingularMatrix)?;
        Self::from_matrix(inv)
    }

    /// Root-mean-square distance between `H * src[i]` and `dst[i]`.
    ///
    /// Returns infinity if any source point maps to infinity and `0` for
    /// empty input. Extra points in the longer slice are ignored.
    pub fn reprojection_rms(&self, src: &[Point], dst: &[Point]) -> f64 {
        let n = src.len().min(dst.len());
        if n == 0 {
            return 0.0;
        }
        let mut sum = 0.0;
        for (s, d) in src.iter().zip(dst) {
            match self.transform_point(*s) {
                Some(p) => sum += (p.x - d.x).powi(2) + (p.y - d.y).powi(2),
                None => return f64::INFINITY,
            }
        }
        (sum / n as f64).sqrt()
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

/// Estimate the homography mapping `src[i]` to `dst[i]` with default
/// options.
pub fn estimate(src: &[Point], dst: &[Point]) -> TransformResult<Homography> {
    estimate_with(src, dst, &EstimateOptions::default())
}

/// Estimate the homography mapping `src[i]` to `dst[i]`.
///
/// # Errors
///
/// - [`TransformError::InvalidParameters`] if the slices differ in length,
///   contain non-finite coordinates, or the options are invalid
/// - [`TransformError::InsufficientPoints`] for fewer than 4 pairs
/// - [`TransformError::SingularSystem`] if the points are coincident or
///   collinear, the linear system is rank-deficient, or the solution is a
///   singular matrix
pub fn estimate_with(
    src: &[Point],
    dst: &[Point],
    opts: &EstimateOptions,
) -> TransformResult<Homography> {
    if src.len() != dst.len() {
        return Err(TransformError::InvalidParameters(format!(
            "point count mismatch: {} source vs {} target",
            src.len(),
            dst.len()
        )));
    }
    let n = src.len();
    if n < 4 {
        return Err(TransformError::InsufficientPoints { got: n });
    }
    if !src.iter().chain(dst).all(Point::is_finite) {
        return Err(TransformError::InvalidParameters(
            "correspondence coordinates must be finite".to_string(),
        ));
    }
    if !opts.rank_tolerance.is_finite() || opts.rank_tolerance < 0.0 {
        return Err(TransformError::InvalidParameters(format!(
            "rank tolerance must be finite and non-negative, got {}",
            opts.rank_tolerance
        )));
    }

    let (src_n, src_t) = Normalization::fit(src).ok_or(TransformError::SingularSystem)?;
    let (dst_n, dst_t) = Normalization::fit(dst).ok_or(TransformError::SingularSystem)?;
    if is_collinear(&src_n) || is_collinear(&dst_n) {
        return Err(TransformError::SingularSystem);
    }

    let mut hn = solve_dlt(&src_n, &dst_n, opts.rank_tolerance)?;

    if opts.refine_iterations > 0 && n > 4 {
        let before = rms_of(&hn, &src_n, &dst_n);
        hn = refine(&hn, &src_n, &dst_n, opts.refine_iterations);
        tracing::debug!(
            before,
            after = rms_of(&hn, &src_n, &dst_n),
            "refined homography (normalized frame)"
        );
    }

    if is_singular(&hn) {
        return Err(TransformError::SingularSystem);
    }

    let h = dst_t.inverse() * hn * src_t.matrix();
    if !h.iter().all(|v| v.is_finite()) {
        return Err(TransformError::SingularSystem);
    }
    let out = Homography::scaled(h);
    if !out.normalized {
        tracing::warn!("H[2][2] is close to zero; homography left unnormalized");
    }
    tracing::debug!(
        pairs = n,
        rms = out.reprojection_rms(src, dst),
        "estimated homography"
    );
    Ok(out)
}

/// Similarity transform used to condition a point set.
#[derive(Debug, Clone, Copy)]
struct Normalization {
    scale: f64,
    cx: f64,
    cy: f64,
}

impl Normalization {
    /// Returns `None` if all points coincide.
    fn fit(points: &[Point]) -> Option<(Vec<Point>, Self)> {
        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
        let mean_dist = points
            .iter()
            .map(|p| (p.x - cx).hypot(p.y - cy))
            .sum::<f64>()
            / n;
        if mean_dist <= f64::EPSILON * (1.0 + cx.abs().max(cy.abs())) {
            return None;
        }
        let t = Self {
            scale: std::f64::consts::SQRT_2 / mean_dist,
            cx,
            cy,
        };
        let normalized = points
            .iter()
            .map(|p| Point::new(t.scale * (p.x - cx), t.scale * (p.y - cy)))
            .collect();
        Some((normalized, t))
    }

    fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.scale,
            0.0,
            -self.scale * self.cx,
            0.0,
            self.scale,
            -self.scale * self.cy,
            0.0,
            0.0,
            1.0,
        )
    }

    fn inverse(&self) -> Matrix3<f64> {
        let inv = 1.0 / self.scale;
        Matrix3::new(inv, 0.0, self.cx, 0.0, inv, self.cy, 0.0, 0.0, 1.0)
    }
}

/// Whether a centered point set lies on a single line.
fn is_collinear(points: &[Point]) -> bool {
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        sxx += p.x * p.x;
        sxy += p.x * p.y;
        syy += p.y * p.y;
    }
    let half_tr = 0.5 * (sxx + syy);
    let det = sxx * syy - sxy * sxy;
    let disc = (half_tr * half_tr - det).max(0.0).sqrt();
    let l_max = half_tr + disc;
    let l_min = half_tr - disc;
    l_max <= 0.0 || l_min <= COLLINEAR_RATIO * l_max
}

fn is_singular(m: &Matrix3<f64>) -> bool {
    let sv = m.singular_values();
    let max = sv.max();
    max <= 0.0 || !max.is_finite() || sv.min() <= SINGULAR_RATIO * max
}

/// Solve `A h = 0` for normalized correspondences.
fn solve_dlt(src: &[Point], dst: &[Point], rank_tolerance: f64) -> TransformResult<Matrix3<f64>> {
    let n = src.len();
    // at least 9 rows so the SVD yields the full right null space
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);

    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);
        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(TransformError::SingularSystem)?;
    let values = svd.singular_values;

    let mut sorted: Vec<f64> = values.iter().copied().collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    if sorted[0] <= 0.0 || sorted[7] <= rank_tolerance * sorted[0] {
        tracing::debug!(
            largest = sorted[0],
            second_smallest = sorted[7],
            "DLT system is rank-deficient"
        );
        return Err(TransformError::SingularSystem);
    }

    let min_idx = values.imin();
    let h = v_t.row(min_idx);
    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8],
    ))
}

fn rms_of(m: &Matrix3<f64>, src: &[Point], dst: &[Point]) -> f64 {
    Homography {
        m: *m,
        normalized: false,
    }
    .reprojection_rms(src, dst)
}

/// Geometric reprojection error over the eight free entries of `H`
/// (`H[2][2] = 1`), in the form the Levenberg-Marquardt solver expects.
struct HomographyFit<'a> {
    params: DVector<f64>,
    src: &'a [Point],
    dst: &'a [Point],
}

impl<'a> HomographyFit<'a> {
    /// Returns `None` if `|H[2][2]|` is close to zero.
    fn new(h: &Matrix3<f64>, src: &'a [Point], dst: &'a [Point]) -> Option<Self> {
        let h22 = h[(2, 2)];
        if h22.abs() <= SCALE_EPS * h.norm() {
            return None;
        }
        let hs = *h / h22;
        let params = DVector::from_iterator(8, hs.transpose().iter().take(8).copied());
        Some(Self { params, src, dst })
    }

    fn matrix(&self) -> Matrix3<f64> {
        let p = &self.params;
        Matrix3::new(p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], 1.0)
    }

    /// `(u, v, w)` with `H s = (u w, v w, w)`; `None` at infinity.
    fn project(&self, s: &Point) -> Option<(f64, f64, f64)> {
        let p = &self.params;
        let w = p[6] * s.x + p[7] * s.y + 1.0;
        if w.abs() < INFINITY_EPS {
            return None;
        }
        let u = (p[0] * s.x + p[1] * s.y + p[2]) / w;
        let v = (p[3] * s.x + p[4] * s.y + p[5]) / w;
        Some((u, v, w))
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for HomographyFit<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    /// `H src - dst`, two rows per pair.
    fn residuals(&self) -> Option<DVector<f64>> {
        let mut r = DVector::<f64>::zeros(2 * self.src.len());
        for (i, (s, d)) in self.src.iter().zip(self.dst).enumerate() {
            let (u, v, _) = self.project(s)?;
            r[2 * i] = u - d.x;
            r[2 * i + 1] = v - d.y;
        }
        Some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let mut j = DMatrix::<f64>::zeros(2 * self.src.len(), 8);
        for (i, s) in self.src.iter().enumerate() {
            let (u, v, w) = self.project(s)?;
            let (x, y) = (s.x, s.y);
            let r0 = 2 * i;
            let r1 = 2 * i + 1;

            j[(r0, 0)] = x / w;
            j[(r0, 1)] = y / w;
            j[(r0, 2)] = 1.0 / w;
            j[(r0, 6)] = -u * x / w;
            j[(r0, 7)] = -u * y / w;

            j[(r1, 3)] = x / w;
            j[(r1, 4)] = y / w;
            j[(r1, 5)] = 1.0 / w;
            j[(r1, 6)] = -v * x / w;
            j[(r1, 7)] = -v * y / w;
        }
        Some(j)
    }
}

/// Levenberg-Marquardt refinement of the geometric error.
///
/// The solver result is kept only if it lowers the reprojection error, so
/// the output is never worse than the input.
fn refine(h: &Matrix3<f64>, src: &[Point], dst: &[Point], iterations: usize) -> Matrix3<f64> {
    let Some(fit) = HomographyFit::new(h, src, dst) else {
        return *h;
    };
    let initial = rms_of(h, src, dst);

    let lm = LevenbergMarquardt::new().with_patience(iterations.max(1));
    let (fit, report) = lm.minimize(fit);
    let refined = fit.matrix();
    let after = rms_of(&refined, src, dst);
    tracing::trace!(
        evaluations = report.number_of_evaluations,
        converged = report.termination.was_successful(),
        "levenberg-marquardt finished"
    );

    if refined.iter().all(|v| v.is_finite()) && after < initial {
        refined
    } else {
        *h
    }
}
