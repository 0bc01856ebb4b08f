//! Cosine similarity and best-match selection.

/// Cosine similarity of two vectors: `dot(a, b) / (|a| * |b|)`.
///
/// Returns `0.0` when either vector has zero magnitude or when the
/// vectors differ in length.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Select the candidate most similar to `query`.
///
/// The running best starts at score `0.0` with no candidate, and a
/// candidate only replaces it on a strictly greater score: among tied
/// maxima the first one yielded wins, and candidates scoring `<= 0.0`
/// are never selected.
pub fn best_match<'a, T, I, F>(query: &[f64], candidates: I, embedding: F) -> (Option<&'a T>, f64)
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &[f64],
    T: 'a,
{
    let mut best = None;
    let mut best_score = 0.0;
    for candidate in candidates {
        let score = cosine_similarity(query, embedding(candidate));
        if score > best_score {
            best = Some(candidate);
            best_score = score;
        }
    }
    (best, best_score)
}
