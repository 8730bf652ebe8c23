//! # Replanning Cycle Benchmark
//!
//! One replanning cycle (fit and sample a window) must fit well inside one control period.

use criterion::{criterion_group, criterion_main, Criterion};

use replan_lib::{
    curve::LissajousParams,
    replan::Params,
    traj::{FitPolicy, SegmentFitter, TrajAssembler, WaypointWindow},
};

fn replan_cycle_benchmark(c: &mut Criterion) {
    // ---- Build the waypoints and a window ----

    let waypoints = LissajousParams::default().generate_waypoints();
    let params = Params::default();

    let window = WaypointWindow::from_slice(&waypoints, 6, params.window_size).unwrap();
    let breakpoints = params.breakpoints(window.len()).unwrap();

    for (name, policy) in [
        ("replan_cycle_two_point", FitPolicy::TwoPoint),
        ("replan_cycle_min_jerk", FitPolicy::MinJerk),
    ]
    .iter()
    {
        let fitter = SegmentFitter::new(params.poly_order, params.fit_samples, *policy).unwrap();
        let assembler = TrajAssembler::new(fitter, params.sample_count());

        c.bench_function(name, |b| {
            b.iter(|| assembler.assemble(&window, &breakpoints).unwrap())
        });
    }
}

criterion_group!(benches, replan_cycle_benchmark);
criterion_main!(benches);
