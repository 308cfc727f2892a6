use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ndarray::Array2;

use lca_scenarios::lca::{MatrixKind, MatrixSubstitution};
use lca_scenarios::storage::{InMemoryParameterStore, InMemoryScenarioRegistry, InMemorySetupStore};
use lca_scenarios::{
    ActivityKey, CalculationSetup, DenseLcaModel, EngineConfig, FunctionalUnit, MethodId,
    ParameterRecord, ParameterScope, RecomputeMode, ScenarioBatch, ScenarioMatrixEngine,
    ScenarioResource, ScenarioTable,
};

const ACTIVITIES: usize = 40;
const FLOWS: usize = 12;
const SCENARIOS: usize = 16;

/// Supply chain where each activity consumes a little of the next one.
fn dense_model() -> DenseLcaModel {
    let activities = (0..ACTIVITIES)
        .map(|i| ActivityKey::new("bench", format!("a{i}")))
        .collect();
    let technosphere = Array2::from_shape_fn((ACTIVITIES, ACTIVITIES), |(r, c)| {
        if r == c {
            1.0
        } else if r == c + 1 {
            -0.3
        } else {
            0.0
        }
    });
    let biosphere = Array2::from_shape_fn((FLOWS, ACTIVITIES), |(r, c)| ((r + c) % 5) as f64 * 0.1);
    let substitutions = (1..ACTIVITIES)
        .map(|c| {
            let values = (0..SCENARIOS).map(|s| -0.1 - 0.02 * s as f64).collect();
            MatrixSubstitution::new(MatrixKind::Technosphere, c, c - 1, values)
        })
        .collect();

    DenseLcaModel::new(activities, technosphere, biosphere)
        .unwrap()
        .with_method(MethodId::new(["climate"]), (0..FLOWS).map(|f| f as f64).collect())
        .unwrap()
        .with_method(MethodId::new(["acidification"]), vec![1.0; FLOWS])
        .unwrap()
        .with_scenario("grid", substitutions)
}

fn bench_full_pass(c: &mut Criterion) {
    let model = dense_model();
    let setups = InMemorySetupStore::new();
    setups
        .insert(CalculationSetup::new(
            "bench",
            (0..3)
                .map(|i| FunctionalUnit::new(ActivityKey::new("bench", format!("a{i}")), 1.0))
                .collect(),
            vec![MethodId::new(["climate"]), MethodId::new(["acidification"])],
        ))
        .unwrap();
    let registry = InMemoryScenarioRegistry::new();
    registry
        .register(ScenarioResource::new("grid", "/unused", SCENARIOS))
        .unwrap();

    let mut group = c.benchmark_group("scenarios");
    group.throughput(Throughput::Elements(SCENARIOS as u64));
    group.bench_function("full_pass", |b| {
        let mut mlca = ScenarioMatrixEngine::build(
            &model,
            &setups,
            &registry,
            "bench",
            "grid",
            &EngineConfig::with_recompute(RecomputeMode::Full),
        )
        .unwrap();
        b.iter(|| mlca.calculate_scenario(0).unwrap());
    });
    group.finish();
}

fn bench_resolve_table(c: &mut Criterion) {
    let mut records = vec![ParameterRecord::new("base", ParameterScope::Project, 1.0)];
    for i in 1..32 {
        records.push(
            ParameterRecord::new(format!("p{i}"), ParameterScope::Project, 0.0)
                .with_formula(format!("base * {i} + sqrt({i})")),
        );
    }
    for i in 0..32 {
        records.push(
            ParameterRecord::new(format!("d{i}"), ParameterScope::database("bench"), 0.0)
                .with_formula(format!("p{} ** 2 / (1 + base)", 1 + i % 31)),
        );
    }
    for i in 0..32 {
        records.push(
            ParameterRecord::new(format!("x{i}"), ParameterScope::activity("g"), 0.0)
                .with_formula(format!("d{i} * p{} - base", 1 + (i + 7) % 31))
                .in_database("bench"),
        );
    }
    let store = Arc::new(InMemoryParameterStore::from_records(records).unwrap());

    let mut table = ScenarioTable::from_store(store.as_ref(), "default").unwrap();
    for s in 1..SCENARIOS {
        let mut values = table.column("default").unwrap().to_vec();
        values[0] = s as f64;
        table.add_column(format!("s{s}"), values).unwrap();
    }

    let mut group = c.benchmark_group("scenarios");
    group.throughput(Throughput::Elements(SCENARIOS as u64));
    group.bench_function("resolve_table", |b| {
        b.iter(|| ScenarioBatch::resolve(store.clone(), &table).unwrap());
    });
    group.finish();
}

criterion_group!(scenarios, bench_full_pass, bench_resolve_table);
criterion_main!(scenarios);
