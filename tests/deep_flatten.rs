//! Larger generated runs. Enable with `--features deep_tests`.
#![cfg(feature = "deep_tests")]

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_json_flatten::execution::ExecutionOptions;
use rust_json_flatten::pipeline::{run, RunOptions};
use rust_json_flatten::types::Value;
use serde_json::json;

#[test]
fn thousand_documents_with_drifting_shapes() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("rust-json-flatten-deep-{nanos}"));
    fs::create_dir_all(&dir).unwrap();

    let mut expected_rows = 0;
    for i in 0..1000usize {
        let path = dir.join(format!("doc_{i:04}.json"));
        if i % 50 == 49 {
            fs::write(path, "{ not json").unwrap();
            continue;
        }
        let items = (i + 1) % 4;
        expected_rows += items.max(1);
        let mut doc = json!({
            "id": i,
            "user": {"name": format!("u{i}")},
            "items": (0..items).map(|j| json!({"n": j})).collect::<Vec<_>>(),
        });
        if i % 7 == 0 {
            doc["user"]["address"] = json!({"city": "Lisbon"});
        }
        fs::write(path, doc.to_string()).unwrap();
    }

    let options = RunOptions {
        execution: ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_documents: 4,
        },
        ..RunOptions::new(&dir)
    };
    let report = run(&options).unwrap();
    assert_eq!(report.attempted, 1000);
    assert_eq!(report.failures.len(), 20);

    let ds = report.dataset.unwrap();
    assert_eq!(ds.row_count(), expected_rows);
    assert!(ds.schema.index_of("user_1_address_2_city").is_some());
    assert!(ds.schema.index_of("items_1_n").is_some());
    // Documents are combined in path order regardless of scheduling.
    assert_eq!(ds.value(0, "id"), Some(&Value::Int64(0)));
    assert_eq!(ds.value(ds.row_count() - 1, "id"), Some(&Value::Int64(998)));

    let _ = fs::remove_dir_all(&dir);
}
