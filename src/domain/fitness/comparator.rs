/// One configuration's position in a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedConfiguration {
    pub config_id: String,
    pub total_score: f64,
}

/// Order configurations strictly descending by total score.
///
/// Higher is uniformly better: both minimize and maximize curves increase
/// toward "better", so no per-sense handling is needed here. The sort is
/// stable and applies no secondary key; configurations with equal totals keep
/// the caller's submission order. NaN totals sort strictly after every real
/// total, including negative infinity.
pub fn rank(entries: impl IntoIterator<Item = (String, f64)>) -> Vec<RankedConfiguration> {
    let mut ranked: Vec<RankedConfiguration> = entries
        .into_iter()
        .map(|(config_id, total_score)| RankedConfiguration {
            config_id,
            total_score,
        })
        .collect();

    ranked.sort_by(|a, b| descending(a.total_score, b.total_score));
    ranked
}

fn descending(a: f64, b: f64) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
