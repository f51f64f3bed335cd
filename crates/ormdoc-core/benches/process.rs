//! Processing and checking benchmarks.
//!
//! Builds a model with a wide class hierarchy where every class references
//! the root, then measures flattening, checking and schema generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ormdoc_core::{keys, CheckLevel, ClassDef, FeatureDef, ModelDef, TorqueModelDef};

fn generate_model(classes: usize) -> ModelDef {
    let mut model = ModelDef::new();
    model
        .add_class(
            ClassDef::persistent("bench.Root")
                .with_feature(
                    FeatureDef::field("id")
                        .with_property(keys::JDBC_TYPE, "INTEGER")
                        .primary_key(),
                )
                .with_feature(FeatureDef::field("name").with_property(keys::VARIABLE_TYPE, "java.lang.String")),
        )
        .unwrap();

    for i in 0..classes {
        let supertype = if i < 8 {
            "bench.Root".to_string()
        } else {
            format!("bench.Class{}", i % 8)
        };
        let class = ClassDef::persistent(format!("bench.Class{}", i))
            .with_supertype(supertype)
            .with_feature(FeatureDef::field(format!("value{}", i)).with_property(keys::VARIABLE_TYPE, "long"))
            .with_feature(FeatureDef::field(format!("rootId{}", i)).with_property(keys::JDBC_TYPE, "INTEGER"))
            .with_feature(
                FeatureDef::reference(format!("root{}", i))
                    .with_property(keys::CLASS_REF, "bench.Root")
                    .with_property(keys::FOREIGNKEY, format!("rootId{}", i)),
            );
        model.add_class(class).unwrap();
    }
    model
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/process");

    for size in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || generate_model(size),
                |mut model| black_box(model.process().unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/check");

    for size in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || generate_model(size),
                |mut model| black_box(model.check_constraints(CheckLevel::Basic).unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_schema(c: &mut Criterion) {
    let mut model = generate_model(100);
    model.check_constraints(CheckLevel::Basic).unwrap();

    c.bench_function("torque/build_100", |b| {
        b.iter(|| black_box(TorqueModelDef::build("bench", &model).unwrap()));
    });
}

criterion_group!(benches, bench_process, bench_check, bench_schema);
criterion_main!(benches);
