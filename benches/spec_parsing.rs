//! Benchmarks for repository specifier parsing and ref listing parsing.
//!
//! Both run once per clone (and once per nested `clone` directive), so they
//! sit on the hot path of template composition.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use degit::refs::{parse_ls_remote, select_ref};
use degit::spec::parse;

const SPECIFIERS: &[(&str, &str)] = &[
    ("shorthand", "user/repo"),
    ("with_ref", "user/repo#v1.2.3"),
    ("site_prefix", "gitlab:user/repo/packages/app#main"),
    ("https", "https://bitbucket.org/user/repo.git/sub/dir#feature/x"),
    ("ssh", "git@github.com:user/repo"),
    ("sourcehut", "git.sr.ht/~user/repo"),
];

fn bench_parse_specifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("spec_parse");
    for (name, src) in SPECIFIERS {
        group.bench_with_input(BenchmarkId::from_parameter(name), src, |b, src| {
            b.iter(|| parse(black_box(src)))
        });
    }
    group.finish();
}

fn listing(refs: usize) -> String {
    let mut out = String::new();
    for i in 0..refs {
        let hash = format!("{:040x}", i + 1);
        if i == 0 {
            out.push_str(&format!("{}\tHEAD\n", hash));
        }
        if i % 3 == 0 {
            out.push_str(&format!("{}\trefs/tags/v{}.0.0\n", hash, i));
        } else {
            out.push_str(&format!("{}\trefs/heads/branch-{}\n", hash, i));
        }
    }
    out
}

fn bench_ls_remote(c: &mut Criterion) {
    let mut group = c.benchmark_group("ls_remote");
    for size in [10usize, 100, 1000] {
        let input = listing(size);
        group.bench_with_input(BenchmarkId::new("parse", size), &input, |b, input| {
            b.iter(|| parse_ls_remote(black_box(input)))
        });

        let refs = parse_ls_remote(&input).unwrap();
        let last = refs.last().unwrap().name.clone();
        group.bench_with_input(BenchmarkId::new("select_last", size), &last, |b, name| {
            b.iter(|| select_ref(black_box(&refs), black_box(name)).is_some())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_specifiers, bench_ls_remote);
criterion_main!(benches);
