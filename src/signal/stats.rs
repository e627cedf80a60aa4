//! Small numeric helpers shared by signals

/// Ordinary least-squares fit of `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; 0 when `y` has no variance
    pub r_squared: f64,
}

/// Fit a line through `points`
///
/// Returns `None` with fewer than two points or when every `x` is equal.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let r_squared = if syy == 0.0 {
        0.0
    } else {
        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        1.0 - ss_res / syy
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Herfindahl-Hirschman index of `shares` normalised by their sum
///
/// Returns 0 when the total is zero.
pub fn herfindahl(shares: impl IntoIterator<Item = u64> + Clone) -> f64 {
    let total = shares
        .clone()
        .into_iter()
        .fold(0u64, |sum, s| sum.saturating_add(s));
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    shares
        .into_iter()
        .map(|s| {
            let share = s as f64 / total;
            share * share
        })
        .sum()
}

/// Count-weighted mean price
pub fn weighted_mean(samples: impl IntoIterator<Item = (i64, u64)>) -> Option<f64> {
    let (sum, weight) = samples
        .into_iter()
        .fold((0.0, 0u64), |(sum, weight), (price, count)| {
            (sum + price as f64 * count as f64, weight.saturating_add(count))
        });
    if weight == 0 {
        None
    } else {
        Some(sum / weight as f64)
    }
}
