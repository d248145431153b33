use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jpda_core::pipeline::{Pipeline, PipelineConfig};
use jpda_core::types::{Report, ReportId, StateCov, Track, TrackId};
use nalgebra::Vector3;

/// Build `n` well-separated 2-track / 2-report ambiguity clusters.
fn make_scenario(n: usize) -> (Vec<Track>, Vec<Report>) {
    let mut tracks = Vec::with_capacity(2 * n);
    let mut reports = Vec::with_capacity(2 * n);
    for i in 0..n {
        let x = 100.0 * i as f64;
        tracks.push(Track::new(
            TrackId(2 * i),
            Vector3::new(x, 0.0, 0.0),
            StateCov::identity(),
        ));
        tracks.push(Track::new(
            TrackId(2 * i + 1),
            Vector3::new(x + 1.5, 0.0, 0.0),
            StateCov::identity(),
        ));
        reports.push(Report::new(ReportId(2 * i), Vector3::new(x + 0.5, 0.0, 0.0)));
        reports.push(Report::new(ReportId(2 * i + 1), Vector3::new(x + 1.0, 0.0, 0.0)));
    }
    (tracks, reports)
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle");
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    for n in [4, 16, 64, 256] {
        group.bench_function(format!("{n}_clusters"), |b| {
            let (tracks, reports) = make_scenario(n);
            b.iter(|| {
                let mut tracks = tracks.clone();
                black_box(pipeline.process_cycle(&mut tracks, &reports).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
