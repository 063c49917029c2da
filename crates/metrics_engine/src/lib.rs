use models::{DerivedRecord, MonthlyRecord};

/// Computes the running metrics for a snapshot series, in order.
///
/// A single left-to-right pass carrying the previous month's total assets
/// and net worth, both seeded at zero: the first record's diffs are its own
/// totals and its percentage change is zero. The pass keeps no state between
/// calls, so equal inputs produce identical outputs.
pub fn aggregate(series: &[MonthlyRecord]) -> Vec<DerivedRecord> {
    let mut prev_total_asset = 0.0;
    let mut prev_net = 0.0;

    series
        .iter()
        .map(|record| {
            let total_asset: f64 = record.assets.values().sum();
            let total_liability: f64 = record.liabilities.values().sum();
            let net = total_asset - total_liability;
            let diff_in_total_asset = total_asset - prev_total_asset;
            let diff_in_net = net - prev_net;
            let percentage_change = if prev_net != 0.0 {
                diff_in_net / prev_net.abs() * 100.0
            } else {
                0.0
            };

            prev_total_asset = total_asset;
            prev_net = net;

            DerivedRecord {
                date: record.date.clone(),
                assets: record.assets.clone(),
                liabilities: record.liabilities.clone(),
                total_asset,
                total_liability,
                net,
                diff_in_total_asset,
                diff_in_net,
                percentage_change,
                my_assets: net,
            }
        })
        .collect()
}
