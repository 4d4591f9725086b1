use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shop_ledger::{
    core::services::{DateRange, GroupMode, SummaryService},
    ledger::{to_iso_date, ClosedDaySet, EntryKind, LedgerDocument, LedgerEntry},
};

fn build_sample_document(entry_count: usize) -> LedgerDocument {
    let mut doc = LedgerDocument::seeded("Benchmark", "INR");
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();

    for idx in 0..entry_count {
        let date = to_iso_date(start + Duration::days((idx % 1095) as i64));
        doc.push_entry(LedgerEntry {
            id: format!("{date}_{idx}"),
            date,
            kind: if idx % 3 == 0 {
                EntryKind::Expense
            } else {
                EntryKind::Income
            },
            amount: 50.0 + (idx % 100) as f64,
            category: "General".into(),
            payment_mode: None,
            note: String::new(),
            created_at: None,
            updated_at: None,
        });
    }
    doc
}

fn bench_grouping(c: &mut Criterion) {
    let doc = build_sample_document(black_box(20_000));

    for mode in GroupMode::ALL_MODES {
        c.bench_function(&format!("group_20k_{mode}"), |b| {
            b.iter(|| black_box(SummaryService::group_entries_by_mode(&doc.entries, mode)))
        });
    }
}

fn bench_range_report(c: &mut Criterion) {
    let doc = build_sample_document(black_box(20_000));
    let range = DateRange::new(Some("2023-01-01"), Some("2023-12-31"));

    c.bench_function("range_report_20k", |b| {
        b.iter(|| {
            black_box(SummaryService::range_report(
                &doc.entries,
                &range,
                GroupMode::Monthly,
            ))
        })
    });

    let closed = ClosedDaySet::new();
    let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    c.bench_function("missing_days_20k", |b| {
        b.iter(|| black_box(SummaryService::find_missing_days(&doc.entries, &closed, today, 30)))
    });
}

fn bench_document_io(c: &mut Criterion) {
    let doc = build_sample_document(black_box(20_000));
    let json = doc.to_json().expect("serialize");

    c.bench_function("document_parse_lenient_20k", |b| {
        b.iter(|| black_box(LedgerDocument::parse_lenient(&json, &LedgerDocument::default())))
    });
}

criterion_group!(benches, bench_grouping, bench_range_report, bench_document_io);
criterion_main!(benches);
