use crate::domain::types::Site;

/// Greedy load selection: stable-sort the candidates by descending value and
/// admit from the top while the running volume stays within the budget.
///
/// The walk stops at the first site that does not fit or carries a
/// non-positive value, so the result is always a prefix of the sorted input
/// and its total volume never exceeds the budget. This is a deliberate
/// approximation of 0/1 knapsack, not an optimum.
pub fn pack(sites: &[Site], volume_budget: f64) -> Vec<Site> {
    let mut sorted: Vec<Site> = sites.to_vec();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut cumulative_volume = 0.0;
    let mut load = vec![];
    for site in sorted {
        if site.value <= 0.0 {
            break;
        }
        if cumulative_volume + site.volume > volume_budget {
            break;
        }
        cumulative_volume += site.volume;
        load.push(site);
    }
    load
}
