use astroassist::{
    BoundInputs, Classifier, ClassifierError, EmergencyMatcher, HashTokenizer, InferenceBackend, LabelMap,
    ModelInputSpec,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[derive(Debug)]
struct ConstantModel {
    inputs: Vec<ModelInputSpec>,
}

impl InferenceBackend for ConstantModel {
    fn declared_inputs(&self) -> &[ModelInputSpec] {
        &self.inputs
    }

    fn run(&self, inputs: &BoundInputs) -> Result<Vec<f32>, ClassifierError> {
        let total: i64 = inputs.iter().map(|(_, t)| t.values.sum()).sum();
        Ok(vec![0.1, (total % 7) as f32, 0.3, 0.2])
    }
}

fn setup_benchmark_classifier() -> Classifier {
    Classifier::builder()
        .with_labels(
            LabelMap::from_pairs([("check_oxygen", 0), ("lights_on", 1), ("status_report", 2), ("open_airlock", 3)])
                .unwrap(),
        )
        .with_backend(ConstantModel {
            inputs: vec![
                ModelInputSpec::new("input_ids"),
                ModelInputSpec::new("attention_mask"),
                ModelInputSpec::new("token_type_ids"),
            ],
        })
        .build()
        .unwrap()
}

fn bench_tokenization(c: &mut Criterion) {
    let tokenizer = HashTokenizer::default();
    let mut group = c.benchmark_group("Tokenization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        tokenizer.encode_text(black_box("open airlock two"))
    }));

    group.bench_function("truncated_text", |b| b.iter(|| {
        tokenizer.encode_text(black_box(
            "run a full diagnostic on the secondary oxygen scrubber in module three and \
             report the filter saturation levels along with the last maintenance timestamp \
             before the crew shift change"
        ))
    }));

    group.finish();
}

fn bench_emergency(c: &mut Criterion) {
    let matcher = EmergencyMatcher::default();
    let mut group = c.benchmark_group("Emergency");
    group.sample_size(50);

    group.bench_function("miss", |b| b.iter(|| {
        matcher.matches(black_box("dim the lights in the crew quarters"))
    }));
    group.bench_function("hit_last_keyword", |b| b.iter(|| {
        matcher.matches(black_box("declare an emergency"))
    }));

    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let classifier = setup_benchmark_classifier();
    let mut group = c.benchmark_group("Classification");
    group.sample_size(50);

    group.bench_function("model_path", |b| b.iter(|| {
        classifier.classify(black_box("open airlock two")).unwrap()
    }));
    group.bench_function("override_path", |b| b.iter(|| {
        classifier.classify(black_box("hull breach on deck two")).unwrap()
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenization,
    bench_emergency,
    bench_classification
);
criterion_main!(benches);
