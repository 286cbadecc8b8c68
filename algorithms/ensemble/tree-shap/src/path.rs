//! The unique-feature path maintained while walking a tree.
//!
//! Each element records a feature split on between the root and the current
//! node, the fraction of cover that flows down the path when the feature is
//! absent (`zero_fraction`) or present (`one_fraction`), and the running
//! permutation weight of subsets of each size.

use mrc_helpers::Float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PathElement<F: Float> {
    pub feature: Option<usize>,
    pub zero_fraction: F,
    pub one_fraction: F,
    pub weight: F,
}

fn count<F: Float>(n: usize) -> F {
    F::from_usize(n).unwrap_or_else(F::nan)
}

/// Appends a split to the path and updates the subset weights.
pub(crate) fn extend<F: Float>(
    path: &mut Vec<PathElement<F>>,
    zero_fraction: F,
    one_fraction: F,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { F::one() } else { F::zero() },
    });
    let total = count::<F>(depth + 1);
    for i in (0..depth).rev() {
        let weight = path[i].weight;
        path[i + 1].weight += one_fraction * weight * count(i + 1) / total;
        path[i].weight = zero_fraction * weight * count(depth - i) / total;
    }
}

/// Removes element `index` from the path, undoing its effect on the weights.
pub(crate) fn unwind<F: Float>(path: &mut Vec<PathElement<F>>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let total = count::<F>(depth + 1);
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != F::zero() {
            let weight = path[i].weight;
            path[i].weight = next_one_portion * total / (count::<F>(i + 1) * one_fraction);
            next_one_portion = weight - path[i].weight * zero_fraction * count(depth - i) / total;
        } else {
            path[i].weight = path[i].weight * total / (zero_fraction * count(depth - i));
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight the path would have if element `index` were
/// unwound, without modifying the path.
pub(crate) fn unwound_sum<F: Float>(path: &[PathElement<F>], index: usize) -> F {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let total = count::<F>(depth + 1);
    let mut next_one_portion = path[depth].weight;
    let mut sum = F::zero();

    for i in (0..depth).rev() {
        if one_fraction != F::zero() {
            let tmp = next_one_portion * total / (count::<F>(i + 1) * one_fraction);
            sum += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * count(depth - i) / total;
        } else if zero_fraction != F::zero() {
            sum += path[i].weight / zero_fraction / (count::<F>(depth - i) / total);
        }
    }
    sum
}
