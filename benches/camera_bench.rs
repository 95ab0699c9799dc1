#![allow(missing_docs, clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{DVec2, DVec3};
use touchview::animation::AnimationSession;
use touchview::camera::bounds::BoundingBox;
use touchview::camera::core::ViewportPose;
use touchview::camera::frustum::ClipParams;
use touchview::util::interpolation::slerp;
use web_time::{Duration, Instant};

fn pose(camera: DVec3) -> ViewportPose {
    let mut pose = ViewportPose::new(camera, DVec3::ZERO, DVec3::Z).unwrap();
    pose.set_screen_port(1280, 720);
    pose
}

fn slerp_benchmark(c: &mut Criterion) {
    let a = DVec3::X;
    let b = DVec3::new(0.0, 1.0, 1.0).normalize();
    c.bench_function("slerp", |bench| {
        bench.iter(|| black_box(slerp(black_box(a), black_box(b), 0.37)));
    });
}

fn session_frame_benchmark(c: &mut Criterion) {
    let session = AnimationSession::new(
        pose(DVec3::new(10.0, 10.0, 10.0)),
        pose(DVec3::new(-4.0, 12.0, 3.0)),
        Instant::now(),
        Duration::from_millis(500),
    );
    let frustum = session.start().frustum;
    c.bench_function("restore_frame", |bench| {
        bench.iter(|| {
            let f = black_box(0.5);
            let _ = black_box(session.frame_vectors(f));
            black_box(session.frame_window(f, &frustum))
        });
    });
}

fn navigation_benchmark(c: &mut Criterion) {
    let bounds = BoundingBox::new(DVec3::splat(-3.0), DVec3::splat(3.0));
    let screen = DVec2::new(1280.0, 720.0);
    let mut group = c.benchmark_group("navigation");
    group.bench_function("orbit_and_fit", |bench| {
        let mut p = pose(DVec3::new(10.0, 10.0, 10.0));
        let (from, to) = (DVec2::new(600.0, 360.0), DVec2::new(610.0, 362.0));
        bench.iter(|| {
            p.orbit(screen, from, to);
            p.fit_frustum(&bounds, ClipParams::default());
        });
    });
    group.bench_function("dolly_extents", |bench| {
        bench.iter(|| {
            let mut p = pose(DVec3::new(10.0, 10.0, 10.0));
            black_box(p.dolly_extents(&bounds, 1.0))
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    slerp_benchmark,
    session_frame_benchmark,
    navigation_benchmark
);
criterion_main!(benches);
