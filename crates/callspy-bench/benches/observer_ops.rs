//! Criterion micro-benchmarks for a full observed call.

use callspy_arena::ArenaConfig;
use callspy_observer::{CallObserver, ObserverConfig};
use callspy_pool::Slice;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smallvec::SmallVec;

/// Read a vertex buffer element by element, then write a result buffer.
fn bench_observed_draw_call(c: &mut Criterion) {
    let mut vertices = vec![0.5f32; 4096];
    let mut results = vec![0u32; 64];
    let config = ObserverConfig::full_fidelity();
    c.bench_function("observer_draw_call_4k_elements", |b| {
        b.iter(|| {
            let input = Slice::application(&mut vertices);
            let output = Slice::application(&mut results);
            let mut obs = CallObserver::new(&config);
            let mut sum = 0.0f32;
            for i in 0..input.count() {
                sum += obs.read_element(&input, i);
            }
            obs.observe_reads();
            obs.write_view(&output);
            obs.observe_writes();
            black_box((sum, obs.observations().map(|r| r.total_bytes())));
        });
    });
}

/// The same call with application capture off.
fn bench_lightweight_draw_call(c: &mut Criterion) {
    let mut vertices = vec![0.5f32; 4096];
    let config = ObserverConfig::lightweight();
    c.bench_function("observer_lightweight_draw_call_4k_elements", |b| {
        b.iter(|| {
            let input = Slice::application(&mut vertices);
            let mut obs = CallObserver::new(&config);
            let mut sum = 0.0f32;
            for i in 0..input.count() {
                sum += obs.read_element(&input, i);
            }
            obs.observe_reads();
            black_box(sum);
        });
    });
}

/// Scratch allocations of a call that decodes a handful of small structs.
fn bench_scratch_allocs(c: &mut Criterion) {
    let config = ObserverConfig::full_fidelity().with_scratch(ArenaConfig::new(1024));
    c.bench_function("observer_scratch_64_allocs", |b| {
        b.iter(|| {
            let obs = CallObserver::new(&config);
            let mut handles: SmallVec<[&mut [u32]; 8]> = SmallVec::new();
            for i in 0..64u32 {
                let slot = obs.scratch().alloc_slice::<u32>(4);
                slot[0] = i;
                if handles.len() < 8 {
                    handles.push(slot);
                }
            }
            black_box(handles.len());
        });
    });
}

criterion_group!(
    benches,
    bench_observed_draw_call,
    bench_lightweight_draw_call,
    bench_scratch_allocs
);
criterion_main!(benches);
