use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use chrono::Utc;
use vaultwatch::{
    CandidateFinding, EngineConfig, FindingCategory, FindingId, FindingKind, FindingStatus,
    FindingStore, MatchValidator, MatchedIdentifier, MemoryEmitter, MemoryVaultStore, ProfileId,
    ReplayEvidenceSource, RiskProfile, ScanRunner, SeverityLabel, ValidatedFinding,
    VaultIdentifier, redact::mask_value, vault::IdentifierType,
};

fn make_candidate(i: usize) -> CandidateFinding {
    let category = match i % 3 {
        0 => FindingCategory::Breach,
        1 => FindingCategory::Exposure,
        _ => FindingCategory::Impersonation,
    };
    CandidateFinding {
        source_name: format!("source-{i}"),
        category,
        matched_identifiers: vec![MatchedIdentifier::new("email", format!("user{i}@example.com"))],
        confidence_score: Some(85.0 + (i % 15) as f64),
        severity: Some("high".to_string()),
        risk_level: Some("medium".to_string()),
        risk_score: Some((i % 100) as f64),
        content_verbatim: None,
        source_url: None,
    }
}

fn make_finding(i: usize) -> ValidatedFinding {
    let kind = match i % 3 {
        0 => FindingKind::Breach {
            risk_score: (i % 100) as f64,
        },
        1 => FindingKind::Exposure {
            risk_level: SeverityLabel::Medium,
        },
        _ => FindingKind::Impersonation {
            severity: SeverityLabel::High,
        },
    };
    ValidatedFinding {
        id: FindingId::new(format!("f-{i}")),
        profile_id: ProfileId::new("p1"),
        kind,
        matched_identifiers: vec![MatchedIdentifier::new("email", format!("user{i}@example.com"))],
        source_name: format!("source-{i}"),
        source_url: None,
        content_verbatim: None,
        status: FindingStatus::New,
        created_at: Utc::now(),
        version: 0,
    }
}

fn setup_pipeline(identifier_count: usize) -> (ScanRunner, ProfileId) {
    let profile = ProfileId::new("p1");
    let vault = MemoryVaultStore::new();
    let mut evidence = ReplayEvidenceSource::new();
    for i in 0..identifier_count {
        let value = format!("user{i}@example.com");
        vault
            .insert(VaultIdentifier {
                id: format!("v-{i}"),
                profile_id: profile.clone(),
                data_type: IdentifierType::Email,
                value: value.clone(),
                monitoring_enabled: true,
            })
            .unwrap();
        evidence = evidence.with_capture(value, vec![make_candidate(i)]);
    }
    let store = Arc::new(FindingStore::new(Arc::new(MemoryEmitter::new())));
    let runner = ScanRunner::new(
        Arc::new(vault),
        Arc::new(evidence),
        store,
        EngineConfig::default(),
    );
    (runner, profile)
}

fn benchmark_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let validator = MatchValidator::new();

    for count in [1, 10, 100].iter() {
        let candidates: Vec<CandidateFinding> = (0..*count).map(make_candidate).collect();

        group.bench_with_input(BenchmarkId::new("candidates", count), count, |b, _| {
            b.iter(|| {
                for candidate in &candidates {
                    black_box(validator.validate(black_box(candidate)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_risk_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_aggregation");

    for count in [1, 10, 100, 1000].iter() {
        let findings: Vec<ValidatedFinding> = (0..*count).map(make_finding).collect();

        group.bench_with_input(BenchmarkId::new("findings", count), count, |b, _| {
            b.iter(|| {
                let risk = RiskProfile::from_findings(black_box(&findings));
                black_box(risk)
            });
        });
    }

    group.finish();
}

fn benchmark_masking(c: &mut Criterion) {
    c.bench_function("mask_value", |b| {
        b.iter(|| {
            black_box(mask_value(black_box("jane.doe@example.com")));
            black_box(mask_value(black_box("123-45-6789")));
            black_box(mask_value(black_box("555-010-0042")));
            black_box(mask_value(black_box("Jane Doe")));
        });
    });
}

fn benchmark_full_scan(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("full_scan_25_identifiers", |b| {
        b.iter_batched(
            || setup_pipeline(25),
            |(runner, profile)| {
                let report = rt.block_on(runner.run(&profile)).unwrap();
                black_box(report)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_validation,
    benchmark_risk_aggregation,
    benchmark_masking,
    benchmark_full_scan,
);
criterion_main!(benches);
