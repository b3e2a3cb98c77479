use super::PVQ_LAMBDA;

/// Finds the pulse vector of L1 norm `k` closest in angle to `x`, writing it
/// to `y`. Returns the cosine between `x` and the chosen codeword.
///
/// Pulses are placed by projection first, then one at a time. The last
/// `1 + k/4` pulses are placed with a rate term that favors early
/// positions; `g2` is the squared gain product used to weight that term.
/// All sums run in index order so the result is reproducible.
pub fn pvq_search(x: &[f64], k: i32, y: &mut [i32], g2: f64) -> f64 {
    let n = x.len();
    assert_eq!(y.len(), n, "pulse buffer length mismatch");
    assert!(k >= 0, "negative pulse budget {k}");

    let mut abs_x = vec![0.0f64; n];
    let mut xx = 0.0;
    for (a, &v) in abs_x.iter_mut().zip(x.iter()) {
        *a = v.abs();
        xx += *a * *a;
    }
    let norm_1 = 1.0 / (1e-30 + xx).sqrt();
    let lambda = PVQ_LAMBDA / (1e-30 + g2);

    let mut xy = 0.0;
    let mut yy = 0.0;
    let mut placed = 0;
    y.fill(0);

    if k > 2 {
        let mut l1_norm = 0.0;
        for &a in &abs_x {
            l1_norm += a;
        }
        let l1_inv = 1.0 / l1_norm.max(1e-100);
        for (yj, &a) in y.iter_mut().zip(abs_x.iter()) {
            *yj = i32::max(0, (k as f64 * a * l1_inv).floor() as i32);
            xy += a * *yj as f64;
            yy += (*yj * *yj) as f64;
            placed += *yj;
        }
    }

    let rdo_pulses = 1 + k / 4;
    let delta_rate = 3.0 / n as f64;

    while placed < k - rdo_pulses {
        let mut pos = 0;
        let mut best_xy = -10.0;
        let mut best_yy = 1.0;
        for j in 0..n {
            let tmp_xy = xy + abs_x[j];
            let tmp_yy = yy + (2 * y[j] + 1) as f64;
            let tmp_xy = tmp_xy * tmp_xy;
            if j == 0 || tmp_xy * best_yy > best_xy * tmp_yy {
                best_xy = tmp_xy;
                best_yy = tmp_yy;
                pos = j;
            }
        }
        xy += abs_x[pos];
        yy += (2 * y[pos] + 1) as f64;
        y[pos] += 1;
        placed += 1;
    }

    while placed < k {
        let mut pos = 0;
        let mut best_cost = -1e5;
        for j in 0..n {
            let tmp_xy = xy + abs_x[j];
            let tmp_yy = yy + (2 * y[j] + 1) as f64;
            let cost = 2.0 * tmp_xy * norm_1 / tmp_yy.sqrt() - lambda * j as f64 * delta_rate;
            if j == 0 || cost > best_cost {
                best_cost = cost;
                pos = j;
            }
        }
        xy += abs_x[pos];
        yy += (2 * y[pos] + 1) as f64;
        y[pos] += 1;
        placed += 1;
    }

    for (yj, &v) in y.iter_mut().zip(x.iter()) {
        if v < 0.0 {
            *yj = -*yj;
        }
    }
    xy / (1e-100 + (xx * yy).sqrt())
}

pub fn l1_norm(y: &[i32]) -> i32 {
    y.iter().map(|v| v.abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulses_sum_to_k() {
        let x = [3.2, -1.1, 0.4, 7.9, -5.5, 0.0, 2.2, -0.3];
        for k in 0..40 {
            let mut y = [0i32; 8];
            pvq_search(&x, k, &mut y, 100.0);
            assert_eq!(l1_norm(&y), k, "k = {}", k);
        }
    }

    #[test]
    fn signs_follow_input() {
        let x = [4.0, -4.0, 4.0, -4.0];
        let mut y = [0i32; 4];
        pvq_search(&x, 8, &mut y, 50.0);
        assert_eq!(y, [2, -2, 2, -2]);
    }

    #[test]
    fn codeword_on_axis_has_unit_cosine() {
        let x = [0.0, 0.0, 9.0, 0.0, 0.0];
        let mut y = [0i32; 5];
        let cos = pvq_search(&x, 6, &mut y, 10.0);
        assert_eq!(y, [0, 0, 6, 0, 0]);
        assert!((cos - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_budget_gives_zero_vector() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [5i32; 3];
        let cos = pvq_search(&x, 0, &mut y, 1.0);
        assert_eq!(y, [0, 0, 0]);
        assert_eq!(cos, 0.0);
    }

    #[test]
    fn null_input_still_places_every_pulse() {
        let x = [0.0; 6];
        let mut y = [0i32; 6];
        pvq_search(&x, 5, &mut y, 1.0);
        assert_eq!(l1_norm(&y), 5);
    }

    #[test]
    fn search_is_deterministic() {
        let x: Vec<f64> = (0..31).map(|i| ((i * 17 % 13) as f64 - 6.0) * 1.3).collect();
        let mut a = vec![0i32; 31];
        let mut b = vec![0i32; 31];
        let ca = pvq_search(&x, 23, &mut a, 400.0);
        let cb = pvq_search(&x, 23, &mut b, 400.0);
        assert_eq!(a, b);
        assert_eq!(ca.to_bits(), cb.to_bits());
    }
}
