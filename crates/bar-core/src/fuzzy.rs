//! "Did you mean" suggestions by edit distance.

/// Maximum number of suggestions returned by [`suggest`].
pub const MAX_SUGGESTIONS: usize = 3;

/// Up to three candidates within `max_distance` edits of `input`.
///
/// Comparison is case-insensitive and candidates equal to the input are
/// skipped. Candidates that start with the input come first, then lower
/// distance, then lexicographic order.
pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S], max_distance: usize) -> Vec<String> {
    if input.is_empty() || candidates.is_empty() {
        return Vec::new();
    }
    let input_lower = input.to_lowercase();

    let mut matches: Vec<(bool, usize, &str)> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            if candidate_lower == input_lower {
                return None;
            }
            let distance = levenshtein(&input_lower, &candidate_lower);
            (distance <= max_distance)
                .then(|| (candidate_lower.starts_with(&input_lower), distance, candidate))
        })
        .collect();

    matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2)));
    matches
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, _, candidate)| candidate.to_owned())
        .collect()
}

/// Levenshtein distance over chars, keeping one row of the table.
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (j, long_ch) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = j + 1;
        for (i, short_ch) in short.iter().enumerate() {
            let cost = usize::from(short_ch != long_ch);
            let next = (row[i + 1] + 1).min(row[i] + 1).min(diagonal + cost);
            diagonal = row[i + 1];
            row[i + 1] = next;
        }
    }
    row[short.len()]
}
