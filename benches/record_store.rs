use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::time::Duration;
use tbc::core::dex;
use tbc::core::record::Record;
use tbc::core::record_store::RecordStore;
use tempfile::TempDir;

fn vault_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let mut r = Record::new(format!("rec-{:05}", i));
            r.record_type = Some(if i % 3 == 0 { "party" } else { "note" }.to_string());
            r.record_tags = Some(vec!["c/agent/nova".to_string()]);
            r.title = Some(format!("Record {}", i));
            r.content_type = Some("markdown".to_string());
            r.extra.insert("priority".into(), json!(i % 5));
            r.set_content(format!("# Record {}\n\nSome body text for record {}.\n", i, i));
            r
        })
        .collect()
}

/// Store then fetch a vault of markdown records
fn bench_store_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_store");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 100, 500] {
        let records = vault_records(size);
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        group.bench_with_input(BenchmarkId::new("store", size), &records, |b, records| {
            let temp_dir = TempDir::new().unwrap();
            let store = RecordStore::new(temp_dir.path());
            b.iter(|| black_box(store.store("vault", records).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("fetch", size), &ids, |b, ids| {
            let temp_dir = TempDir::new().unwrap();
            let store = RecordStore::new(temp_dir.path());
            store.store("vault", &records).unwrap();
            b.iter(|| black_box(store.fetch("vault", ids)));
        });
    }
    group.finish();
}

fn bench_type_index(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let store = RecordStore::new(temp_dir.path());
    let records = vault_records(500);
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    store.store("vault", &records).unwrap();
    let fetched = store.fetch("vault", &ids).records;

    c.bench_function("type_indexes_500", |b| {
        b.iter(|| black_box(dex::type_indexes(&dex::group_by_type(&fetched))))
    });
}

criterion_group!(benches, bench_store_fetch, bench_type_index);
criterion_main!(benches);
