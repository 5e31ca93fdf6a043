// Criterion benchmarks for graphtr.
//
// Uses a synthetic Latin-to-syllable rule set: every letter maps on its own,
// every consonant-vowel pair maps as a syllable, and vowels after a vowel
// carry a lookbehind class.
//
// Run:
//   cargo bench -p graphtr

use criterion::{Criterion, criterion_group, criterion_main};
use graphtr::{
    RuleSet, TokenVocabulary, TransliterationRule, Transliterator, TransliteratorOptions,
    WhitespaceConfig,
};
use graphtr_graph::ambiguity;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

const VOWELS: &str = "aeiou";

fn vocabulary() -> TokenVocabulary {
    let mut vocabulary = TokenVocabulary::new();
    for c in 'a'..='z' {
        let class = if VOWELS.contains(c) { "vowel" } else { "consonant" };
        vocabulary.insert(c.to_string(), [class]);
    }
    vocabulary.insert(" ", ["wb"]);
    vocabulary
}

fn rules() -> RuleSet {
    let mut rules = Vec::new();
    for c in 'a'..='z' {
        rules.push(TransliterationRule::new([c.to_string()], c.to_uppercase().to_string()));
    }
    for c in ('a'..='z').filter(|c| !VOWELS.contains(*c)) {
        for v in VOWELS.chars() {
            rules.push(TransliterationRule::new(
                [c.to_string(), v.to_string()],
                format!("<{c}{v}>"),
            ));
        }
    }
    for v in VOWELS.chars() {
        rules.push(TransliterationRule::new([v.to_string()], format!("'{v}")).with_prev_classes(["vowel"]));
    }
    rules.push(TransliterationRule::new([" "], "_"));
    RuleSet::new(rules).unwrap_or_default()
}

fn transliterator() -> Option<Transliterator> {
    let options = TransliteratorOptions {
        check_ambiguity: false,
        ..TransliteratorOptions::default()
    };
    Transliterator::new(
        vocabulary(),
        rules(),
        Vec::new(),
        WhitespaceConfig::new(" ", "wb", true),
        options,
    )
    .ok()
}

const TEXT: &str = "the quick brown fox jumps over the lazy dog and keeps \
                    running across the field until evening falls over the quiet hills";

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    let Some(t) = transliterator() else {
        c.bench_function("tokenize (skipped)", |b| b.iter(|| {}));
        return;
    };
    c.bench_function("tokenize_sentence", |b| {
        b.iter(|| {
            std::hint::black_box(t.tokenize(TEXT).ok());
        });
    });
}

fn bench_transliterate(c: &mut Criterion) {
    let Some(t) = transliterator() else {
        c.bench_function("transliterate (skipped)", |b| b.iter(|| {}));
        return;
    };
    c.bench_function("transliterate_sentence", |b| {
        b.iter(|| {
            std::hint::black_box(t.transliterate(TEXT).ok());
        });
    });
}

fn bench_match_at(c: &mut Criterion) {
    let Some(t) = transliterator() else {
        c.bench_function("match_at (skipped)", |b| b.iter(|| {}));
        return;
    };
    let tokens = t.tokenize(TEXT).unwrap_or_default();
    c.bench_function("match_at_every_position", |b| {
        b.iter(|| {
            for position in 1..tokens.len().saturating_sub(1) {
                std::hint::black_box(t.match_at(position, &tokens));
            }
        });
    });
}

fn bench_build(c: &mut Criterion) {
    let vocabulary = vocabulary();
    let rules = rules();
    c.bench_function("build_rule_graph", |b| {
        b.iter(|| {
            std::hint::black_box(graphtr::RuleGraph::build(&rules));
        });
    });
    c.bench_function("check_ambiguity", |b| {
        b.iter(|| {
            std::hint::black_box(ambiguity::check(&rules, &vocabulary));
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_transliterate,
    bench_match_at,
    bench_build,
);
criterion_main!(benches);
