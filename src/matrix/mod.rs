//! Dense row-major linear algebra for the per-arm ridge models.

pub const SINGULAR_PIVOT: f64 = 1e-10;

pub fn identity(d: usize) -> Vec<f64> {
    let mut m = vec![0.0; d * d];
    for i in 0..d {
        m[i * d + i] = 1.0;
    }
    m
}

/// Gauss-Jordan inverse with partial pivoting on the augmented `[A|I]`.
///
/// Returns `None` when a pivot falls below [`SINGULAR_PIVOT`] or the result is
/// not finite; callers substitute the identity.
pub fn invert_gauss_jordan(a: &[f64], d: usize) -> Option<Vec<f64>> {
    if a.len() != d * d {
        return None;
    }
    let width = 2 * d;
    let mut aug = vec![0.0; d * width];
    for i in 0..d {
        for j in 0..d {
            aug[i * width + j] = a[i * d + j];
        }
        aug[i * width + d + i] = 1.0;
    }

    for col in 0..d {
        let mut max_row = col;
        for row in (col + 1)..d {
            if aug[row * width + col].abs() > aug[max_row * width + col].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..width {
                aug.swap(col * width + j, max_row * width + j);
            }
        }

        let pivot = aug[col * width + col];
        if !pivot.is_finite() || pivot.abs() < SINGULAR_PIVOT {
            return None;
        }
        for j in 0..width {
            aug[col * width + j] /= pivot;
        }

        for row in 0..d {
            if row == col {
                continue;
            }
            let factor = aug[row * width + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..width {
                aug[row * width + j] -= factor * aug[col * width + j];
            }
        }
    }

    let mut inv = vec![0.0; d * d];
    for i in 0..d {
        for j in 0..d {
            let val = aug[i * width + d + j];
            if !val.is_finite() {
                return None;
            }
            inv[i * d + j] = val;
        }
    }
    Some(inv)
}

/// Inverse, or the identity when `a` is numerically singular. The flag reports
/// whether the fallback was taken.
pub fn invert_or_identity(a: &[f64], d: usize) -> (Vec<f64>, bool) {
    match invert_gauss_jordan(a, d) {
        Some(inv) => (inv, false),
        None => (identity(d), true),
    }
}

/// Matrix-vector product (row-major).
pub fn mat_vec_mul(a: &[f64], x: &[f64], d: usize) -> Vec<f64> {
    let mut result = vec![0.0; d];
    for i in 0..d {
        for j in 0..d {
            result[i] += a[i * d + j] * x[j];
        }
    }
    result
}

pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// A += x * x^T
pub fn rank1_update_matrix(a: &mut [f64], x: &[f64], d: usize) {
    for i in 0..d {
        for j in 0..d {
            a[i * d + j] += x[i] * x[j];
        }
    }
}

/// a += scale * b
pub fn vec_add_scaled(a: &mut [f64], b: &[f64], scale: f64) {
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += scale * bi;
    }
}

pub fn is_symmetric(a: &[f64], d: usize, tol: f64) -> bool {
    for i in 0..d {
        for j in (i + 1)..d {
            if (a[i * d + j] - a[j * d + i]).abs() > tol {
                return false;
            }
        }
    }
    true
}
