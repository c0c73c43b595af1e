use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::estimator::MapEstimator;
use adaptest_core::irt::{fisher_info, prob_correct};
use adaptest_core::model::{IrtParameters, ItemId, ParameterTable, ResponseRecord};

fn make_history(n: usize) -> (Vec<ResponseRecord>, ParameterTable) {
    let mut history = Vec::with_capacity(n);
    let mut params = ParameterTable::new();
    for i in 0..n {
        let id = ItemId::new(format!("q{i}"));
        let b = (i as f64 / n as f64) * 4.0 - 2.0;
        params.insert(id.clone(), IrtParameters::new(1.2, b, 0.2));
        history.push(ResponseRecord { item_id: id, correct: i % 2 == 0 });
    }
    (history, params)
}

fn bench_prob_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("prob_model");
    let params = IrtParameters::new(1.2, 0.3, 0.2);

    group.bench_function("prob_correct", |b| {
        b.iter(|| prob_correct(black_box(0.5), black_box(params)))
    });

    group.bench_function("fisher_info", |b| {
        b.iter(|| fisher_info(black_box(0.5), black_box(params)))
    });

    group.finish();
}

fn bench_map_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_update");
    let estimator = MapEstimator::default();

    for n in [10usize, 50, 200] {
        let (history, params) = make_history(n);
        group.bench_function(format!("history={n}"), |b| {
            b.iter(|| estimator.update(black_box(0.3), black_box(&history), black_box(&params)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prob_model, bench_map_update);
criterion_main!(benches);
