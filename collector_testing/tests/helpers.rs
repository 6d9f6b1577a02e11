//! Sanity checks for the shared collector test helpers.

use collector_testing::{RecordingConsumer, StationClient, TestResult, spawn_collector, unused_listener};
use weather_collector::LoopState;

#[tokio::test]
async fn spawned_collector_accepts_a_station() -> TestResult {
    let consumer = RecordingConsumer::replying("ok;");
    let collector = spawn_collector(consumer.clone(), unused_listener()?)?;

    let mut station = StationClient::connect(collector.addr()).await?;
    station.send("P=1013;").await?;
    assert_eq!(station.read_reply(3).await?, b"ok;");
    assert_eq!(consumer.messages(), ["P=1013"]);
    assert_eq!(collector.control().state(), LoopState::Connected);

    collector.shutdown().await?;
    assert!(station.closed_by_collector().await);
    Ok(())
}
