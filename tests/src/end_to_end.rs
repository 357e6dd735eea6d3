use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use badcapt_common::packet::{CaptureInfo, Packet};
use badcapt_core::capture::ReplaySource;
use badcapt_core::export::ConsoleExporter;
use badcapt_core::pipeline::{self, BuildOption, Sink};
use badcapt_core::{CaptureStats, Dispatcher, Outcome, Pipeline, Sniffer};
use badcapt_protocols::{decode_frame, frame};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use crate::support::{
    IndexCall, RecordingIndex, SCANNER, SharedBuffer, benign_udp, masscan_syn, mirai_syn, zmap_udp,
};

fn captured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn decode(bytes: &[u8]) -> Packet {
    decode_frame(bytes, CaptureInfo::new(captured_at(), bytes.len(), bytes.len()))
}

async fn indexed(index: Arc<RecordingIndex>, extra: Vec<BuildOption>) -> Arc<Pipeline> {
    let mut options: Vec<BuildOption> = vec![pipeline::set_backend(Sink::SearchIndex(index))];
    options.extend(extra);
    Arc::new(Pipeline::build(options).await.unwrap())
}

async fn console(buffer: &SharedBuffer, extra: Vec<BuildOption>) -> Arc<Pipeline> {
    let mut options: Vec<BuildOption> = vec![pipeline::set_backend(Sink::Console(
        ConsoleExporter::with_writer(buffer.clone()),
    ))];
    options.extend(extra);
    Arc::new(Pipeline::build(options).await.unwrap())
}

#[tokio::test]
async fn masscan_syn_should_be_indexed_as_expected_record() {
    let index: Arc<RecordingIndex> = Arc::new(RecordingIndex::default());
    let dispatcher: Dispatcher = Dispatcher::new(indexed(index.clone(), Vec::new()).await);

    let outcome: Outcome = dispatcher
        .handle(decode(&masscan_syn(51413, 23, 0x1234_5678)))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Exported);
    assert_eq!(
        index.calls(),
        vec![
            IndexCall::Exists("badcapt".into()),
            IndexCall::Create("badcapt".into()),
            IndexCall::Document {
                index: "badcapt".into(),
                category: "bcrecord".into(),
                body: json!({
                    "src_ip": "10.0.0.5",
                    "transport": "tcp",
                    "src_port": 51413,
                    "dst_ip": "203.0.113.9",
                    "dst_port": 23,
                    "date": "2024-05-01T12:00:00Z",
                    "tags": ["masscan"],
                }),
            },
        ]
    );
}

#[tokio::test]
async fn existing_index_should_not_be_created_again() {
    let index: Arc<RecordingIndex> = Arc::new(RecordingIndex::with_existing_index());
    let dispatcher: Dispatcher = Dispatcher::new(
        indexed(index.clone(), vec![pipeline::set_index_name("scanners")]).await,
    );

    dispatcher.handle(decode(&mirai_syn(SCANNER))).await.unwrap();

    let calls: Vec<IndexCall> = index.calls();
    assert_eq!(calls[0], IndexCall::Exists("scanners".into()));
    assert!(!calls.iter().any(|call| matches!(call, IndexCall::Create(_))));
    assert_eq!(index.documents().len(), 1);
}

#[tokio::test]
async fn unmatched_udp_should_not_reach_the_index() {
    let index: Arc<RecordingIndex> = Arc::new(RecordingIndex::default());
    let dispatcher: Dispatcher = Dispatcher::new(indexed(index.clone(), Vec::new()).await);

    let outcome: Outcome = dispatcher.handle(decode(&benign_udp())).await.unwrap();

    assert_eq!(outcome, Outcome::Discarded);
    assert!(index.documents().is_empty());
}

#[tokio::test]
async fn console_should_print_one_line_per_hit() {
    let buffer: SharedBuffer = SharedBuffer::default();
    let dispatcher: Dispatcher = Dispatcher::new(console(&buffer, Vec::new()).await);

    dispatcher
        .handle(decode(&masscan_syn(51413, 23, 0x1234_5678)))
        .await
        .unwrap();

    let output: String = buffer.contents();
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains(r#""tags":["masscan"]"#));
    assert!(!output.contains("\"payload\""));
    assert!(!output.contains("payload_str"));
}

#[tokio::test]
async fn zmap_udp_payload_should_be_exported_both_ways() {
    let buffer: SharedBuffer = SharedBuffer::default();
    let dispatcher: Dispatcher = Dispatcher::new(console(&buffer, Vec::new()).await);

    dispatcher.handle(decode(&zmap_udp(b"public"))).await.unwrap();

    let record: Value = serde_json::from_str(buffer.contents().trim_end()).unwrap();
    assert_eq!(record["transport"], "udp");
    assert_eq!(record["dst_port"], 161);
    assert_eq!(record["tags"], json!(["zmap"]));
    assert_eq!(record["payload"], "cHVibGlj");
    assert_eq!(record["payload_str"], "public");
}

#[tokio::test]
async fn panicking_marker_should_not_hide_builtin_tags() {
    let buffer: SharedBuffer = SharedBuffer::default();
    let broken = |_: &Packet| -> Vec<String> { panic!("marker bug") };
    let dispatcher: Dispatcher = Dispatcher::new(console(&buffer, vec![pipeline::add_marker(broken)]).await);

    let outcome: Outcome = dispatcher.handle(decode(&mirai_syn(SCANNER))).await.unwrap();

    assert_eq!(outcome, Outcome::Exported);
    assert!(buffer.contents().contains(r#""tags":["mirai"]"#));
}

#[tokio::test]
async fn custom_markers_should_add_tags_after_builtins() {
    let buffer: SharedBuffer = SharedBuffer::default();
    let telnet = |packet: &Packet| -> Vec<String> {
        match packet.tcp() {
            Some(tcp) if tcp.destination_port == 23 => vec!["telnet".to_string()],
            _ => Vec::new(),
        }
    };
    let dispatcher: Dispatcher = Dispatcher::new(console(&buffer, vec![pipeline::add_marker(telnet)]).await);

    dispatcher.handle(decode(&mirai_syn(SCANNER))).await.unwrap();

    assert!(buffer.contents().contains(r#""tags":["mirai","telnet"]"#));
}

#[tokio::test]
async fn replayed_traffic_should_be_classified_and_counted() {
    let index: Arc<RecordingIndex> = Arc::new(RecordingIndex::default());
    let everything = |packet: &Packet| -> Vec<String> {
        match packet.ipv6() {
            Some(_) => vec!["v6".to_string()],
            None => Vec::new(),
        }
    };
    let pipeline: Arc<Pipeline> = indexed(
        index.clone(),
        vec![pipeline::add_marker(everything), pipeline::set_max_in_flight(4)],
    )
    .await;

    let ipv6: Vec<u8> = frame::create_ipv6_udp_frame(
        Ipv6Addr::LOCALHOST,
        "2001:db8::1".parse().unwrap(),
        1000,
        2000,
        b"x",
    )
    .unwrap();
    let frames: Vec<Vec<u8>> = vec![
        masscan_syn(51413, 23, 0x1234_5678),
        mirai_syn(SCANNER),
        zmap_udp(b""),
        benign_udp(),
        ipv6,
    ];

    let stats: CaptureStats = Sniffer::new(pipeline)
        .run(ReplaySource::from_frames(&frames), std::future::pending())
        .await
        .unwrap();

    assert_eq!(stats.received, 5);
    assert_eq!(stats.dispatched, 5);
    assert_eq!(stats.exported, 3);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.unclassifiable, 1);
    assert_eq!(stats.failed, 0);

    let mut tags: Vec<String> = index
        .documents()
        .iter()
        .map(|doc| doc["tags"][0].as_str().unwrap_or_default().to_string())
        .collect();
    tags.sort();
    assert_eq!(tags, vec!["masscan", "mirai", "zmap"]);
}

#[tokio::test]
async fn suppression_should_collapse_repeated_scans() {
    let buffer: SharedBuffer = SharedBuffer::default();
    let pipeline: Arc<Pipeline> = console(
        &buffer,
        vec![
            pipeline::set_suppression(1024, Duration::from_secs(300)),
            pipeline::set_max_in_flight(1),
        ],
    )
    .await;

    let other: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 77);
    let frames: Vec<Vec<u8>> = vec![mirai_syn(SCANNER), mirai_syn(SCANNER), mirai_syn(other), mirai_syn(SCANNER)];

    let stats: CaptureStats = Sniffer::new(pipeline)
        .run(ReplaySource::from_frames(&frames), std::future::pending())
        .await
        .unwrap();

    assert_eq!(stats.exported, 2);
    assert_eq!(stats.suppressed, 2);
    assert_eq!(buffer.contents().lines().count(), 2);
}
