//! Similar-name suggestions for unknown lookups

/// Candidates similar to `query`, best match first
pub(crate) fn similar<'a, I>(query: &str, candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let query_lower = query.to_lowercase();
    let mut matches: Vec<(&str, usize)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = similarity_score(&query_lower, &candidate.to_lowercase());
            (score > 0).then_some((candidate, score))
        })
        .collect();

    // Higher score first, then alphabetical so output is stable
    matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    matches.into_iter().map(|(name, _)| name).collect()
}

/// Render up to five suggestions as an error hint
pub(crate) fn hint(similar: &[&str]) -> Option<String> {
    if similar.is_empty() {
        return None;
    }
    let shown: Vec<&str> = similar.iter().take(5).copied().collect();
    Some(format!("Similar: {}", shown.join(", ")))
}

fn similarity_score(query: &str, candidate: &str) -> usize {
    let mut score = 0;

    if candidate.starts_with(query) {
        score += 100;
    } else if candidate.contains(query) {
        score += 50;
    } else if query.contains(candidate) {
        score += 30;
    }

    // Shared characters only count once something else matched
    if score == 0 {
        return 0;
    }
    let query_chars: std::collections::HashSet<char> = query.chars().collect();
    let candidate_chars: std::collections::HashSet<char> = candidate.chars().collect();
    score += query_chars.intersection(&candidate_chars).count() * 2;

    let len_diff = query.len().abs_diff(candidate.len());
    if len_diff < 5 {
        score += 5 - len_diff;
    }

    score
}
