//! Integration tests: train, encode, decode, save and load.

use bpekit_core::{MergeTable, SplitPattern, Vocabulary};
use bpekit_tokenizer::{Tokenizer, TokenizerError};
use bpekit_training::{BpeTrainer, TrainingConfig};

const CORPUS: &str = "The quick brown fox jumps over the lazy dog.\n\
    The dog barks; the fox runs away!\n\
    Über den Wolken muss die Freiheit wohl grenzenlos sein.\n\
    東京は日本の首都です。 Numbers: 12345, 3.14159.\n\
    <|endoftext|>The end.\n";

fn trained_tokenizer(vocab_size: usize) -> Tokenizer {
    let config = TrainingConfig::default()
        .with_vocab_size(vocab_size)
        .with_special_tokens(["<|endoftext|>"]);
    let model = BpeTrainer::new(config).train(&CORPUS.repeat(3)).unwrap();
    Tokenizer::from_trained(model).unwrap()
}

/// Test basic encoding and decoding roundtrip.
#[test]
fn test_encode_decode_roundtrip() {
    let tokenizer = trained_tokenizer(400);

    let test_cases = vec![
        "",
        "Hello, world!",
        "The quick brown fox jumps over the lazy dog.",
        "Multi-line\ntext\r\nwith\ttabs",
        "Unicode: こんにちは 世界 🦀",
        "   leading and trailing spaces   ",
        "never seen: qxz ÿ ǅ",
    ];

    for text in test_cases {
        let ids = tokenizer.encode(text).unwrap();
        let decoded = tokenizer.decode(&ids).unwrap();
        assert_eq!(decoded, text, "Roundtrip failed for: {:?}", text);
    }
}

/// Training compresses text it has seen.
#[test]
fn test_trained_merges_compress() {
    let tokenizer = trained_tokenizer(400);
    let text = "The quick brown fox jumps over the lazy dog.";

    let ids = tokenizer.encode(text).unwrap();
    assert!(ids.len() < text.len());
}

/// Training on "ab ab ab" learns exactly (a, b), which encoding then uses.
#[test]
fn test_single_merge_model() {
    let config = TrainingConfig::default()
        .with_vocab_size(257)
        .with_split_pattern(SplitPattern::Whitespace);
    let model = BpeTrainer::new(config).train("ab ab ab").unwrap();

    assert_eq!(model.merges.len(), 1);
    assert_eq!(model.vocab.get_token(256), Some(&b"ab"[..]));

    let tokenizer = Tokenizer::try_from(model).unwrap();
    assert_eq!(tokenizer.encode("ab ab").unwrap(), vec![256, 32, 256]);
    assert_eq!(tokenizer.decode(&[256, 32, 256]).unwrap(), "ab ab");
}

/// Special tokens are encoded as their reserved ID, never as bytes.
#[test]
fn test_special_token_reserved_id() {
    let tokenizer = trained_tokenizer(400);

    assert_eq!(tokenizer.token_to_id(b"<|endoftext|>"), Some(0));
    assert_eq!(tokenizer.encode("<|endoftext|>").unwrap(), vec![0]);

    let ids = tokenizer.encode("end<|endoftext|>start").unwrap();
    assert_eq!(ids.iter().filter(|&&id| id == 0).count(), 1);
    assert_eq!(tokenizer.decode(&ids).unwrap(), "end<|endoftext|>start");
}

/// A longer special token wins over a shorter one sharing its prefix.
#[test]
fn test_longest_special_token_wins() {
    let vocab = Vocabulary::byte_level(&["<|im|>", "<|im|><|start|>"]).unwrap();
    let tokenizer =
        Tokenizer::new(vocab, MergeTable::new(), &["<|im|>", "<|im|><|start|>"]).unwrap();

    assert_eq!(tokenizer.encode("<|im|><|start|>").unwrap(), vec![1]);
    assert_eq!(tokenizer.encode("<|im|><|im|>").unwrap(), vec![0, 0]);
}

/// A pair with a strictly better rank merges first wherever it is.
#[test]
fn test_priority_law() {
    let mut vocab = Vocabulary::byte_level::<&str>(&[]).unwrap();
    let bc = vocab.add_token(b"bc");
    let ab = vocab.add_token(b"ab");
    let merges: MergeTable = vec![
        (b"b".to_vec(), b"c".to_vec()),
        (b"a".to_vec(), b"b".to_vec()),
    ]
    .into();
    let tokenizer = Tokenizer::new::<&str>(vocab, merges, &[]).unwrap();

    // (b, c) outranks the earlier (a, b)
    assert_eq!(tokenizer.encode("abc").unwrap(), vec![b'a' as u32, bc]);
    assert_eq!(tokenizer.encode("ab").unwrap(), vec![ab]);
}

/// Saving and loading gives a tokenizer that behaves identically.
#[test]
fn test_file_roundtrip_trained() {
    let dir = tempfile::tempdir().unwrap();
    let vocab_path = dir.path().join("vocab.txt");
    let merges_path = dir.path().join("merges.txt");

    let tokenizer = trained_tokenizer(450);
    tokenizer.save(&vocab_path, &merges_path).unwrap();
    let loaded = Tokenizer::from_files(&vocab_path, &merges_path, &["<|endoftext|>"]).unwrap();

    assert_eq!(loaded.vocab_size(), tokenizer.vocab_size());
    assert_eq!(loaded.merges(), tokenizer.merges());
    for line in CORPUS.lines() {
        assert_eq!(loaded.encode(line).unwrap(), tokenizer.encode(line).unwrap());
    }
}

/// Tokens containing separators survive the files.
#[test]
fn test_file_roundtrip_awkward_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let vocab_path = dir.path().join("vocab.txt");
    let merges_path = dir.path().join("merges.txt");

    let mut vocab = Vocabulary::byte_level::<&str>(&[]).unwrap();
    let merges: MergeTable = vec![
        (b" ".to_vec(), b"\t".to_vec()),
        (b"\n".to_vec(), b"\\".to_vec()),
        (b"\xe2".to_vec(), b"\x82".to_vec()),
        (b"\xe2\x82".to_vec(), b"\xac".to_vec()),
    ]
    .into();
    for (left, right) in merges.iter() {
        vocab.add_token(&[left, right].concat());
    }

    let tokenizer = Tokenizer::new::<&str>(vocab, merges, &[]).unwrap();
    tokenizer.save(&vocab_path, &merges_path).unwrap();
    let loaded = Tokenizer::from_files::<&str>(&vocab_path, &merges_path, &[]).unwrap();

    assert_eq!(loaded.vocab().entries(), tokenizer.vocab().entries());
    assert_eq!(loaded.merges(), tokenizer.merges());

    let text = "x \t\n\\ costs 5€";
    let ids = loaded.encode(text).unwrap();
    assert_eq!(ids, tokenizer.encode(text).unwrap());
    assert!(ids.contains(&259), "€ should be a single token: {:?}", ids);
    assert_eq!(loaded.decode(&ids).unwrap(), text);
}

/// Loading reports the offending line.
#[test]
fn test_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let vocab_path = dir.path().join("vocab.txt");
    let merges_path = dir.path().join("merges.txt");

    std::fs::write(&vocab_path, "0\ta\n1 b\n").unwrap();
    std::fs::write(&merges_path, "a b\n").unwrap();
    match Tokenizer::from_files::<&str>(&vocab_path, &merges_path, &[]) {
        Err(TokenizerError::MalformedVocabLine { line, content }) => {
            assert_eq!(line, 2);
            assert_eq!(content, "1 b");
        }
        other => panic!("expected malformed vocab line, got {:?}", other.err()),
    }

    std::fs::write(&vocab_path, "0\ta\n1\tb\n").unwrap();
    std::fs::write(&merges_path, "a b\na\n").unwrap();
    assert!(matches!(
        Tokenizer::from_files::<&str>(&vocab_path, &merges_path, &[]),
        Err(TokenizerError::MalformedMergeLine { line: 2, .. })
    ));
}

/// Streaming over lines matches encoding them one by one.
#[test]
fn test_encode_iterable_over_lines() {
    let tokenizer = trained_tokenizer(400);

    let streamed: Vec<u32> = tokenizer
        .encode_iterable(CORPUS.split_inclusive('\n'))
        .collect::<Result<_, _>>()
        .unwrap();
    let expected: Vec<u32> = CORPUS
        .split_inclusive('\n')
        .flat_map(|line| tokenizer.encode(line).unwrap())
        .collect();

    assert_eq!(streamed, expected);
    assert_eq!(tokenizer.decode(&streamed).unwrap(), CORPUS);
}

/// One tokenizer serves many threads.
#[test]
fn test_concurrent_encoding() {
    let tokenizer = trained_tokenizer(400);
    let expected = tokenizer.encode(CORPUS).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(tokenizer.encode(CORPUS).unwrap(), expected);
            });
        }
    });

    let lines: Vec<&str> = CORPUS.lines().collect();
    let batch = tokenizer.encode_batch(&lines).unwrap();
    for (line, ids) in lines.iter().zip(&batch) {
        assert_eq!(tokenizer.decode(ids).unwrap(), *line);
    }
}
