//! Basic benchmarks for the `arena_list` crate, comparing heap and arena node allocation.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use arena_list::{Arena, ArenaHandle, List};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = u64;
const TEST_VALUE: TestItem = 1024;

const LIST_LEN: usize = 100;
const LIST_MIDDLE: usize = 50;

// Room for `LIST_LEN` nodes of `TestItem` with plenty to spare.
const ARENA_CAPACITY: usize = 8192;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("list_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(List::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("from_elem_heap");
    group.bench_function("from_elem_heap", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(List::from_elem(LIST_LEN, &TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("from_elem_arena");
    group.bench_function("from_elem_arena", |b| {
        b.iter_custom(|iters| {
            let arenas = (0..iters)
                .map(|_| Box::new(Arena::<ARENA_CAPACITY>::new()))
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for arena in &arenas {
                drop(black_box(List::from_elem_in(
                    LIST_LEN,
                    &TEST_VALUE,
                    ArenaHandle::new(&**arena),
                )));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_pop_back");
    group.bench_function("push_pop_back", |b| {
        b.iter_custom(|iters| {
            let mut list = List::from_elem(LIST_LEN, &TEST_VALUE).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(list.push_back(black_box(TEST_VALUE)));
                _ = black_box(list.pop_back());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_remove_middle");
    group.bench_function("insert_remove_middle", |b| {
        b.iter_custom(|iters| {
            let mut list = List::from_elem(LIST_LEN, &TEST_VALUE).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            let mut cursor = list.begin_mut();
            for _ in 0..LIST_MIDDLE {
                cursor.move_next();
            }

            for _ in 0..iters {
                _ = black_box(cursor.insert_before(black_box(TEST_VALUE)));
                cursor.move_prev();
                _ = black_box(cursor.remove_current());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("iterate");
    group.bench_function("iterate", |b| {
        b.iter_custom(|iters| {
            let list = List::from_elem(LIST_LEN, &TEST_VALUE).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(list.iter().sum::<TestItem>());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone");
    group.bench_function("clone", |b| {
        b.iter_custom(|iters| {
            let list = List::from_elem(LIST_LEN, &TEST_VALUE).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(list.clone()));
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
