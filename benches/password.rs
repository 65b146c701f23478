//! Account password benchmarks: Argon2id hashing and form checks.

use criterion::{Criterion, criterion_group, criterion_main};
use majazamooz::errors::FieldErrors;
use majazamooz::utils::password::{check_new_password, hash_password, verify_password};

fn bench_register_hash(c: &mut Criterion) {
    c.bench_function("password/register_hash", |b| {
        b.iter(|| hash_password("tutorial author 1402").expect("hash should succeed"));
    });
}

fn bench_login_verify(c: &mut Criterion) {
    let hash = hash_password("reader password").expect("hash should succeed");

    let mut group = c.benchmark_group("password/login");
    group.bench_function("accepted", |b| {
        b.iter(|| assert!(verify_password("reader password", &hash).unwrap()));
    });
    group.bench_function("rejected", |b| {
        b.iter(|| assert!(!verify_password("guessed password", &hash).unwrap()));
    });
    group.finish();
}

fn bench_new_password_checks(c: &mut Criterion) {
    c.bench_function("password/form_checks", |b| {
        b.iter(|| {
            let mut errors = FieldErrors::new();
            check_new_password(&mut errors, "password", "short", "shorter");
            assert!(!errors.is_empty());
        });
    });
}

criterion_group!(
    benches,
    bench_register_hash,
    bench_login_verify,
    bench_new_password_checks,
);
criterion_main!(benches);
