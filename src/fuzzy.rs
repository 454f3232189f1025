//! Fuzzy string scoring for completion candidates.
//!
//! Scores are weighted ratios in `[0, 100]`: a subsequence-similarity base
//! ratio combined with a best-window partial ratio and a token-sort ratio,
//! with the partial variants downweighted so that exact and near-exact
//! matches always win. Inputs are normalized first (lowercased,
//! non-alphanumerics folded to single spaces), which makes `myfi` line up
//! with `my_file.py` and `my-file.md` alike.

/// Scoring strategy injected into the completion engine. Implementations
/// must return a similarity in `[0, 100]` where 100 is an exact match.
pub trait FuzzyMatcher: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> u8;
}

/// Default matcher: weighted-ratio scoring over normalized strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedRatio;

impl FuzzyMatcher for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> u8 {
        let q = normalize(query);
        let c = normalize(candidate);
        if q.is_empty() || c.is_empty() {
            return 0;
        }

        let base = ratio(&q, &c);

        let (shorter, longer) = if q.len() <= c.len() { (&q, &c) } else { (&c, &q) };
        let len_ratio = longer.len() as f64 / shorter.len() as f64;

        let best = if len_ratio >= 1.5 {
            // Length mismatch: the query is plausibly a fragment of the
            // candidate, so windowed comparison carries most of the signal.
            let partial = partial_ratio(shorter, longer) * 0.90;
            let partial_token_sort =
                scaled_partial(&token_sort(&q), &token_sort(&c)) * 0.855;
            base.max(partial).max(partial_token_sort)
        } else {
            let token_sorted = ratio(&token_sort(&q), &token_sort(&c)) * 0.95;
            base.max(token_sorted)
        };

        best.round().clamp(0.0, 100.0) as u8
    }
}

/// Lowercases and folds runs of non-alphanumeric characters into single
/// spaces, trimming the ends.
fn normalize(s: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !matches!(out.last(), Some(' ') | None) {
            out.push(' ');
        }
    }
    while out.last() == Some(&' ') {
        out.pop();
    }
    out
}

/// Similarity ratio `200 * lcs / (len_a + len_b)` in `[0, 100]`.
fn ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    200.0 * lcs_len(a, b) as f64 / (a.len() + b.len()) as f64
}

/// Best `ratio` of the shorter string against every window of its own
/// length in the longer string.
fn partial_ratio(shorter: &[char], longer: &[char]) -> f64 {
    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() >= longer.len() {
        return ratio(shorter, longer);
    }
    let mut best: f64 = 0.0;
    for window in longer.windows(shorter.len()) {
        best = best.max(ratio(shorter, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn scaled_partial(a: &[char], b: &[char]) -> f64 {
    if a.len() <= b.len() {
        partial_ratio(a, b)
    } else {
        partial_ratio(b, a)
    }
}

/// Whitespace-splits, sorts, and rejoins the (already normalized) input.
fn token_sort(s: &[char]) -> Vec<char> {
    let joined: String = s.iter().collect();
    let mut tokens: Vec<&str> = joined.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ").chars().collect()
}

/// Longest common subsequence length, rolling-row dynamic program.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
