// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use facility_registry::hierarchy::FacilityHierarchy;
use facility_registry::types::FacilitySnapshot;
use libfuzzer_sys::fuzz_target;

// Snapshots may hold cycles or dangling parents; traversal must still terminate
fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = serde_json::from_slice::<FacilitySnapshot>(data) else {
        return;
    };
    let mut store = FacilityHierarchy::new();
    store.import_data(snapshot);

    let ids: Vec<String> = store.nodes().map(|n| n.id().to_string()).collect();
    for id in &ids {
        let _ = store.hierarchy_path(id);
        let _ = store.descendants(id);
    }
    let _ = store.render_tree();
    if let Some(id) = ids.first() {
        store.delete(id);
        assert!(store.get(id).is_none());
    }
});
