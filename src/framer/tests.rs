//! Unit tests for the stream framer.
//!
//! Covers token extraction across arrivals, scanner fault handling, consumer
//! failure isolation, reply writing, and the pending-data bound.

use std::io;

use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::*;
use crate::{
    consumer::{ConsumeResult, FnConsumer},
    scanner::{DelimiterScanner, FixedLengthScanner, TerminatorScanner},
};

#[fixture]
fn framer() -> StreamFramer<DelimiterScanner> { StreamFramer::new(DelimiterScanner::default()) }

fn strings(items: &[&str]) -> Vec<String> { items.iter().map(ToString::to_string).collect() }

/// Scanner that reports a fixed, possibly bogus, boundary.
struct FixedAnswer(Option<usize>);

impl TokenScanner for FixedAnswer {
    fn find_token(&self, _buffer: &str) -> Option<usize> { self.0 }
}

/// Consumer recording every batch and replying with a fixed string.
#[derive(Default)]
struct Recorder {
    batches: Vec<Vec<String>>,
    reply: Option<String>,
}

impl MessageConsumer for Recorder {
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult {
        self.batches.push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

#[rstest]
fn single_complete_message(mut framer: StreamFramer<DelimiterScanner>) {
    assert_eq!(framer.extract_tokens(b"Hello;"), strings(&["Hello"]));
    assert!(framer.pending().is_empty());
}

#[rstest]
fn multiple_messages_in_one_arrival(mut framer: StreamFramer<DelimiterScanner>) {
    let tokens = framer.extract_tokens(b"Hello;World;This;is;a;test;");
    assert_eq!(tokens, strings(&["Hello", "World", "This", "is", "a", "test"]));
    assert!(framer.pending().is_empty());
}

#[rstest]
fn message_split_across_arrivals(mut framer: StreamFramer<DelimiterScanner>) {
    assert!(framer.extract_tokens(b"Hello World.").is_empty());
    assert_eq!(framer.pending(), "Hello World.");
    assert_eq!(
        framer.extract_tokens(b" This is a test;"),
        strings(&["Hello World. This is a test"])
    );
    assert!(framer.pending().is_empty());
}

#[rstest]
fn back_to_back_delimiters_yield_empty_tokens(mut framer: StreamFramer<DelimiterScanner>) {
    assert_eq!(framer.extract_tokens(b";;"), strings(&["", ""]));
}

#[rstest]
fn trailing_partial_is_retained(mut framer: StreamFramer<DelimiterScanner>) {
    assert_eq!(framer.extract_tokens(b"a;b;par"), strings(&["a", "b"]));
    assert_eq!(framer.pending(), "par");
    assert_eq!(framer.extract_tokens(b"tial;"), strings(&["partial"]));
}

#[rstest]
fn non_ascii_bytes_are_replaced(mut framer: StreamFramer<DelimiterScanner>) {
    assert_eq!(framer.extract_tokens(&[b'T', 0xC2, 0xB0, b';']), strings(&["T??"]));
}

#[test]
fn multi_character_terminator_is_stripped() {
    let mut framer = StreamFramer::new(TerminatorScanner::crlf());
    assert_eq!(framer.extract_tokens(b"one\r\ntwo\r"), strings(&["one"]));
    assert_eq!(framer.extract_tokens(b"\n"), strings(&["two"]));
}

#[test]
fn fixed_length_records_have_no_terminator() {
    let mut framer = StreamFramer::new(FixedLengthScanner::new(3));
    assert_eq!(framer.extract_tokens(b"abcdefg"), strings(&["abc", "def"]));
    assert_eq!(framer.pending(), "g");
}

#[rstest]
#[case(Some(99))]
#[case(Some(0))]
fn malformed_boundary_is_treated_as_not_found(#[case] answer: Option<usize>) {
    let mut framer = StreamFramer::new(FixedAnswer(answer));
    assert!(framer.extract_tokens(b"abc;").is_empty());
    assert_eq!(framer.pending(), "abc;");
    assert_eq!(framer.stats().snapshot().scan_faults, 1);
}

#[test]
fn boundary_at_buffer_end_is_accepted() {
    let mut framer = StreamFramer::new(FixedAnswer(Some(4)));
    assert_eq!(framer.extract_tokens(b"abc;"), strings(&["abc"]));
}

#[test]
fn oversized_pending_message_is_discarded_until_next_boundary() {
    let mut framer = StreamFramer::new(DelimiterScanner::default()).with_max_pending(Some(8));
    assert!(framer.extract_tokens(b"0123456789").is_empty());
    assert!(framer.pending().is_empty());
    assert_eq!(framer.stats().snapshot().oversize_discards, 1);

    assert!(framer.extract_tokens(b"0123456789").is_empty());
    assert_eq!(framer.stats().snapshot().oversize_discards, 1);

    assert_eq!(framer.extract_tokens(b"tail;next;"), strings(&["next"]));
}

#[test]
fn unbounded_framer_keeps_everything() {
    let mut framer = StreamFramer::new(DelimiterScanner::default()).with_max_pending(None);
    let chunk = vec![b'x'; DEFAULT_MAX_PENDING + 1];
    assert!(framer.extract_tokens(&chunk).is_empty());
    assert_eq!(framer.pending().len(), DEFAULT_MAX_PENDING + 1);
}

#[rstest]
#[tokio::test]
async fn reply_is_written_once_per_arrival(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = Recorder {
        reply: Some("ok;".into()),
        ..Recorder::default()
    };
    let mut out = Vec::new();

    let delivered = framer
        .process_arrival(b"a;b;c", &mut consumer, &mut out)
        .await
        .expect("process arrival");

    assert_eq!(delivered, 2);
    assert_eq!(consumer.batches, vec![strings(&["a", "b"])]);
    assert_eq!(out, b"ok;");
    assert_eq!(framer.stats().snapshot().replies_sent, 1);
}

#[rstest]
#[tokio::test]
async fn consumer_not_called_without_complete_token(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = Recorder {
        reply: Some("unexpected".into()),
        ..Recorder::default()
    };
    let mut out = Vec::new();

    let delivered = framer
        .process_arrival(b"partial", &mut consumer, &mut out)
        .await
        .expect("process arrival");

    assert_eq!(delivered, 0);
    assert!(consumer.batches.is_empty());
    assert!(out.is_empty());
}

#[rstest]
#[tokio::test]
async fn empty_reply_is_not_written(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = Recorder {
        reply: Some(String::new()),
        ..Recorder::default()
    };
    let mut out = Vec::new();
    framer
        .process_arrival(b"a;", &mut consumer, &mut out)
        .await
        .expect("process arrival");
    assert!(out.is_empty());
    assert_eq!(framer.stats().snapshot().replies_sent, 0);
}

#[rstest]
#[tokio::test]
async fn reply_is_encoded_as_ascii(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = Recorder {
        reply: Some("21\u{b0}C;".into()),
        ..Recorder::default()
    };
    let mut out = Vec::new();
    framer
        .process_arrival(b"temp;", &mut consumer, &mut out)
        .await
        .expect("process arrival");
    assert_eq!(out, b"21?C;");
}

#[rstest]
#[tokio::test]
async fn consumer_error_yields_no_reply(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = FnConsumer::new(|_: &[String]| -> ConsumeResult {
        Err(io::Error::other("database offline").into())
    });
    let mut out = Vec::new();

    let delivered = framer
        .process_arrival(b"a;", &mut consumer, &mut out)
        .await
        .expect("consumer errors are not I/O errors");

    assert_eq!(delivered, 1);
    assert!(out.is_empty());
    assert_eq!(framer.stats().snapshot().consumer_failures, 1);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn consumer_panic_is_contained(mut framer: StreamFramer<DelimiterScanner>) {
    let mut calls = 0_usize;
    let mut consumer = FnConsumer::new(move |_: &[String]| -> ConsumeResult {
        calls += 1;
        if calls == 1 {
            panic!("bad station record");
        }
        Ok(Some("recovered;".into()))
    });
    let mut out = Vec::new();

    framer
        .process_arrival(b"first;", &mut consumer, &mut out)
        .await
        .expect("panic is contained");
    assert!(out.is_empty());

    framer
        .process_arrival(b"second;", &mut consumer, &mut out)
        .await
        .expect("framer keeps working");
    assert_eq!(out, b"recovered;");
    assert_eq!(framer.stats().snapshot().consumer_failures, 1);
    assert!(logs_contain("consumer panicked"));
    assert!(logs_contain("bad station record"));
}

#[rstest]
#[tokio::test]
async fn reply_write_failure_is_reported(mut framer: StreamFramer<DelimiterScanner>) {
    let mut consumer = Recorder {
        reply: Some("ack;".into()),
        ..Recorder::default()
    };
    let (client, server) = tokio::io::duplex(64);
    drop(client);
    let (_read, mut write) = tokio::io::split(server);

    let err = framer
        .process_arrival(b"a;", &mut consumer, &mut write)
        .await
        .expect_err("peer is gone");
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}
