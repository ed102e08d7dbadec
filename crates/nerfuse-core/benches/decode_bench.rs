use std::io::Cursor;
use std::path::Path;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nerfuse_core::decode::{DecodeOptions, FileDecoder};
use nerfuse_core::label::{LabelSpace, LabelVocab};

fn corpus(sentences: usize) -> String {
    let sentence = "EU B-ORG\nrejects O\nGerman B-MISC\ncall O\nto O\nboycott O\n\
                    British B-MISC\nlamb O\n. O\n\nPeter B-PER\nBlackburn I-PER\n\n";
    sentence.repeat(sentences / 2)
}

fn bench_decode(c: &mut Criterion) {
    let space = LabelSpace::default();
    let text = corpus(1_000);

    let decoder = FileDecoder::new(&space, DecodeOptions::default()).unwrap();
    c.bench_function("decode_conll_1000", |b| {
        b.iter(|| {
            let mut vocab = LabelVocab::new();
            decoder
                .decode_reader(Cursor::new(black_box(text.as_bytes())), Path::new("bench"), &mut vocab)
                .unwrap()
        });
    });

    let to_bio = FileDecoder::new(&space, DecodeOptions::default().with_to_bio(true)).unwrap();
    c.bench_function("decode_conll_1000_to_bio", |b| {
        b.iter(|| {
            let mut vocab = LabelVocab::new();
            to_bio
                .decode_reader(Cursor::new(black_box(text.as_bytes())), Path::new("bench"), &mut vocab)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
