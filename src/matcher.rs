//! Closest-model matching
//!
//! Picks a model from an endpoint's list for a loosely specified name such as
//! `"qwen"`. Exact identifiers win outright; otherwise the identifier with the
//! highest gestalt (Ratcliff/Obershelp) similarity is chosen, with no minimum
//! score. Ties go to the model listed first.

use crate::models::ModelInfo;

/// Similarity of two strings in `[0, 1]`
///
/// Computed as `2 * M / (|a| + |b|)` over Unicode scalar values, where `M` is
/// the number of characters in the matching blocks found by repeatedly taking
/// the longest common contiguous block and recursing on either side of it.
/// Block search is not symmetric on ties, so both orientations are scored and
/// the larger value is returned. Two empty strings score `1.0`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b).max(matching_characters(&b, &a));
    2.0 * matched as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Returns `(i, j, len)`. Among blocks of equal length the one starting
/// earliest in `a`, then earliest in `b`, is returned.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0);
    // prev[x + 1] = length of the match ending at (i - 1, blo + x)
    let mut prev = vec![0usize; width];

    for i in alo..ahi {
        let mut current = vec![0usize; width];
        for j in blo..bhi {
            if a[i] == b[j] {
                let len = prev[j - blo] + 1;
                current[j - blo + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = current;
    }

    best
}

/// Choose the model that best matches `requested`
///
/// 1. The first model whose id equals `requested` (case-sensitive).
/// 2. Otherwise the id with the highest [`similarity_ratio`]; equal scores
///    resolve to the earliest model in `models`.
/// 3. Otherwise the first model.
///
/// Returns `None` only when `models` is empty, which the resolver never
/// allows to reach this point.
pub fn select_model<'a>(models: &'a [ModelInfo], requested: &str) -> Option<&'a ModelInfo> {
    if let Some(exact) = models.iter().find(|m| m.id == requested) {
        tracing::debug!(model_id = %exact.id, "Exact model match");
        return Some(exact);
    }

    let closest = models.iter().fold(None::<(&ModelInfo, f64)>, |best, model| {
        let score = similarity_ratio(&model.id, requested);
        tracing::trace!(model_id = %model.id, requested = %requested, score, "Scored model");
        match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((model, score)),
        }
    });

    match closest {
        Some((model, score)) => {
            tracing::info!(
                requested = %requested,
                model_id = %model.id,
                score,
                "No exact model match, using closest identifier"
            );
            Some(model)
        }
        None => models.first(),
    }
}

/// Every model with its similarity to `requested`, best first
///
/// Sorting is stable, so models with equal scores keep their listed order.
pub fn rank_models<'a>(models: &'a [ModelInfo], requested: &str) -> Vec<(&'a ModelInfo, f64)> {
    let mut ranked: Vec<(&ModelInfo, f64)> = models
        .iter()
        .map(|m| (m, similarity_ratio(&m.id, requested)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
