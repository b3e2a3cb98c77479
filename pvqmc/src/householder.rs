/// Result of turning a predictor into a reflection vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reflection {
    pub axis: usize,
    pub sign: i32,
}

/// Turns the predictor `r` (with gain `gr`) into the vector of a Householder
/// reflection that maps the predictor onto `-sign * gr * e_axis`.
///
/// The axis is the predictor component of largest magnitude, which keeps the
/// update `r[axis] += sign * gr` free of cancellation.
pub fn compute_householder(r: &mut [f64], gr: f64) -> Reflection {
    let mut axis = 0;
    let mut maxr = 0.0;
    for (i, &v) in r.iter().enumerate() {
        if v.abs() > maxr {
            maxr = v.abs();
            axis = i;
        }
    }
    let sign = if r[axis] > 0.0 { 1 } else { -1 };
    r[axis] += gr * sign as f64;
    Reflection { axis, sign }
}

/// Applies the reflection `r` to `x` in place. Applying it twice restores `x`.
pub fn apply_householder(x: &mut [f64], r: &[f64]) {
    assert_eq!(x.len(), r.len(), "reflection length mismatch");
    let mut l2r = 0.0;
    for &v in r {
        l2r += v * v;
    }
    let mut proj = 0.0;
    for (&rv, &xv) in r.iter().zip(x.iter()) {
        proj += rv * xv;
    }
    let proj_1 = proj * 2.0 / (1e-100 + l2r);
    for (xv, &rv) in x.iter_mut().zip(r.iter()) {
        *xv -= rv * proj_1;
    }
}

pub fn l2_norm(x: &[f64]) -> f64 {
    let mut acc = 0.0;
    for &v in x {
        acc += v * v;
    }
    acc.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() <= tol, "index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn predictor_lands_on_its_largest_axis() {
        let p = [1.0, -7.0, 3.0, 2.0];
        let gr = l2_norm(&p);
        let mut r = p;
        let refl = compute_householder(&mut r, gr);
        assert_eq!(refl, Reflection { axis: 1, sign: -1 });

        let mut x = p;
        apply_householder(&mut x, &r);
        let mut expected = [0.0; 4];
        expected[1] = gr;
        assert_close(&x, &expected, 1e-9);
    }

    #[test]
    fn reflection_is_an_involution() {
        let p = [0.5, 2.0, -1.5, 4.0, -3.0, 0.25, 1.0, -2.0];
        let mut r = p;
        compute_householder(&mut r, l2_norm(&p));
        let x0 = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0, -2.0, 6.0];
        let mut x = x0;
        apply_householder(&mut x, &r);
        apply_householder(&mut x, &r);
        assert_close(&x, &x0, 1e-9);
    }

    #[test]
    fn reflection_preserves_length() {
        let p = [2.0, 2.0, -1.0];
        let mut r = p;
        compute_householder(&mut r, l2_norm(&p));
        let mut x = [1.0, -4.0, 8.0];
        let before = l2_norm(&x);
        apply_householder(&mut x, &r);
        assert!((l2_norm(&x) - before).abs() < 1e-9);
    }

    #[test]
    fn null_predictor_leaves_vector_untouched() {
        let mut r = [0.0; 4];
        let refl = compute_householder(&mut r, 0.0);
        assert_eq!(refl.axis, 0);
        let x0 = [1.0, 2.0, 3.0, 4.0];
        let mut x = x0;
        apply_householder(&mut x, &r);
        assert_eq!(x, x0);
    }
}
