//! Benchmarks for the statistics engine and session persistence
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shotlog::domain::statistics;
use shotlog::domain::{Mass, Shot, StatisticsReport, Velocity};
use shotlog::service::{CatalogService, NewProfile, NewProjectile, SessionService};
use shotlog::storage::DataLayout;
use shotlog::ProfileCategory;
use tempfile::tempdir;

fn create_test_shots(count: usize) -> Vec<Shot> {
    (0..count)
        .map(|i| {
            let mut shot = Shot::new(Velocity::new(170.0 + (i % 11) as f64 * 0.5).unwrap());
            // Every tenth reading is a flyer
            if i % 10 == 9 {
                shot.mark_invalid();
            }
            shot
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let mass = Mass::new(0.547).unwrap();

    for size in [10, 100, 1000] {
        let shots = create_test_shots(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("report_{}", size), |b| {
            b.iter(|| StatisticsReport::compute(black_box(&shots), mass))
        });

        group.bench_function(format!("standard_deviation_{}", size), |b| {
            b.iter(|| statistics::standard_deviation(black_box(&shots)).unwrap())
        });
    }

    group.finish();
}

fn bench_load_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_service");

    group.bench_function("load_session_100", |b| {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let catalog = CatalogService::open(&layout);
        let sessions = SessionService::open(&layout);

        let profile = catalog
            .create_profile(NewProfile {
                name: "Bench rifle".to_string(),
                category: ProfileCategory::AirRifle,
                barrel_length_mm: 450.0,
                trigger_weight_g: 1500.0,
                sight_height_mm: 50.0,
            })
            .unwrap();
        let projectile = catalog
            .create_projectile(NewProjectile {
                name: "Bench pellet".to_string(),
                weight_g: 0.547,
                bc: 0.021,
            })
            .unwrap();
        let session = sessions
            .create_session(&profile.id, &projectile.id, None, None)
            .unwrap();

        for shot in create_test_shots(100) {
            sessions
                .record_shot(&session.id, shot.velocity().meters_per_second())
                .unwrap();
        }

        b.iter(|| sessions.load_session(black_box(&session.id)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_statistics, bench_load_session);
criterion_main!(benches);
