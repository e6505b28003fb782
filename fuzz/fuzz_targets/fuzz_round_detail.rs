#![no_main]

use goose_tap_client::protocol::RoundDetail;
use goose_tap_client::RoundView;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Round detail is the payload polled every few seconds; anything that
    // decodes must also be safe to build a view from and query.
    if let Ok(detail) = serde_json::from_slice::<RoundDetail>(data) {
        let view = RoundView::new(detail, std::time::Duration::from_millis(300));
        let _ = view.phase();
        let _ = view.display_total_score();
        let _ = view.average_score_per_tap();
        let _ = goose_tap_client::leaderboard::rank(view.top_stats(), None);
    }
});
