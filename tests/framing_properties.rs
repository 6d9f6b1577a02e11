//! Property tests for stream reassembly.
//!
//! However the byte stream is cut into reads, the framer must deliver the
//! same tokens in the same order and keep exactly the undelimited tail.

use proptest::{prelude::*, test_runner::{Config, TestRunner}};
use rstest::rstest;
use weather_collector::{DelimiterScanner, StreamFramer};

fn token() -> impl Strategy<Value = String> { "[A-Za-z0-9=.]{0,12}" }

/// Split `data` at the sorted, deduplicated `cuts`.
fn chunked<'a>(data: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(&data[start..cut]);
        start = cut;
    }
    chunks.push(&data[start..]);
    chunks
}

fn frame_all(chunks: &[&[u8]]) -> (Vec<String>, String) {
    let mut framer = StreamFramer::new(DelimiterScanner::default()).with_max_pending(None);
    let tokens = chunks
        .iter()
        .flat_map(|chunk| framer.extract_tokens(chunk))
        .collect();
    (tokens, framer.pending().to_owned())
}

proptest! {
    #[test]
    fn tokens_survive_any_chunking(
        tokens in prop::collection::vec(token(), 0..16),
        tail in "[A-Za-z0-9]{0,8}",
        cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let mut stream = tokens.iter().map(|t| format!("{t};")).collect::<String>();
        stream.push_str(&tail);

        let (framed, pending) = frame_all(&chunked(stream.as_bytes(), &cuts));
        prop_assert_eq!(framed, tokens);
        prop_assert_eq!(pending, tail);
    }
}

#[rstest]
fn single_and_bytewise_feeds_agree() {
    let mut runner = TestRunner::new(Config {
        cases: 64,
        ..Config::default()
    });
    runner
        .run(&"[A-Za-z0-9;]{0,64}", |stream| {
            let whole = frame_all(&[stream.as_bytes()]);
            let bytes: Vec<&[u8]> = stream.as_bytes().chunks(1).collect();
            let bytewise = frame_all(&bytes);
            prop_assert_eq!(whole, bytewise);
            Ok(())
        })
        .expect("chunking changed the framed output");
}
