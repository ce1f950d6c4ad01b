// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use facility_registry::id_cache::GlobalIdCache;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(layout) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let mut cache = GlobalIdCache::new();
    let report = cache.initialize(&layout);
    assert_eq!(report.unique, cache.size());
    for id in cache.all_ids() {
        assert!(cache.is_id_in_use(&id.to_lowercase()));
    }
});
