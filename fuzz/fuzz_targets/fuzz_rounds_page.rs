#![no_main]

use goose_tap_client::protocol::RoundsPage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(page) = serde_json::from_slice::<RoundsPage>(data) else {
        return;
    };
    let rounds = goose_tap_client::annotate_rounds_now(page.data);
    for phased in &rounds {
        let _ = phased.round.time_remaining(chrono::Utc::now());
        let _ = phased.round.progress_percent(chrono::Utc::now());
    }
});
