// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record write/read integration tests.
//!
//! Tests cover:
//! - Round trips through chunks and segments
//! - Chunk and segment split thresholds
//! - Header and index invariants on disk
//! - Deterministic output
//! - Keyed sinks and timestamp derivation
//! - Incomplete (never closed) files

use std::fs;
use std::path::{Path, PathBuf};

use cyberrec::encoding::seconds_to_nanos;
use cyberrec::io::formats::record::constants::{HEADER_LENGTH, HEADER_REGION_END};
use cyberrec::io::formats::record::{Channel, SectionType};
use cyberrec::{
    CodecTable, HeaderBuilder, MessageSink, ProstCodec, RawCodec, RecordConfig, RecordError,
    RecordFileWriter, RecordParser, RecordWriter, SingleMessage, SinkMap, TimedMessage,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Localization-style message carrying its own time in float seconds.
#[derive(Clone, PartialEq, prost::Message)]
struct Pose {
    #[prost(double, tag = "1")]
    timestamp_sec: f64,
    #[prost(double, tag = "2")]
    x: f64,
    #[prost(double, tag = "3")]
    y: f64,
}

/// Get a temporary directory for test files
fn temp_dir() -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let thread_id = format!("{:?}", std::thread::current().id());
    std::env::temp_dir().join(format!(
        "cyberrec_record_test_{}_{}_{}",
        std::process::id(),
        thread_id,
        random
    ))
}

/// Create a temporary base path with cleanup guard
fn temp_base() -> (PathBuf, CleanupGuard) {
    let dir = temp_dir();
    fs::create_dir_all(&dir).ok();
    let path = dir.join("test.record");
    let guard = CleanupGuard(dir);
    (path, guard)
}

/// Cleanup guard for test temporary files
#[derive(Debug)]
struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn raw_codecs(channels: &[&str]) -> CodecTable<Vec<u8>> {
    let mut codecs = CodecTable::new();
    for name in channels {
        codecs.register(*name, RawCodec::new("test.Raw"));
    }
    codecs
}

/// Two channels, `count` messages each, 10ns apart, `size` bytes per payload.
fn two_channel_input(count: u64, size: usize) -> SinkMap<Vec<u8>> {
    let mut messages = SinkMap::new();
    for (c, name) in ["/camera", "/lidar"].iter().enumerate() {
        let mut sink = MessageSink::ordered();
        for i in 0..count {
            let mut payload = vec![c as u8; size];
            payload[0] = i as u8;
            sink.store(i * 10 + c as u64, payload);
        }
        messages.insert(name.to_string(), sink);
    }
    messages
}

fn ordered_sinks<M>(channels: &[&str]) -> SinkMap<M> {
    channels
        .iter()
        .map(|name| (name.to_string(), MessageSink::ordered()))
        .collect()
}

fn read_all(paths: &[PathBuf], codecs: &CodecTable<Vec<u8>>) -> SinkMap<Vec<u8>> {
    let mut sinks = ordered_sinks(&["/camera", "/lidar"]);
    let mut parser = RecordParser::new();
    for path in paths {
        parser.parse(path, &mut sinks, codecs).unwrap();
    }
    sinks
}

fn raw_channel(name: &str) -> Channel {
    Channel {
        name: name.to_string(),
        message_type: "test.Raw".to_string(),
        proto_desc: Vec::new(),
    }
}

fn open_parser(path: &Path) -> RecordParser {
    let mut parser = RecordParser::new();
    parser.open(path).unwrap();
    parser.read_header().unwrap();
    parser
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_round_trip_single_file() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(20, 8);
    let codecs = raw_codecs(&["/camera", "/lidar"]);

    let summary = RecordWriter::new(RecordConfig::unbounded())
        .write_all(&base, &input, &codecs)
        .unwrap();
    assert_eq!(summary.messages, 40);
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.segments, vec![base.clone()]);

    let output = read_all(&summary.segments, &codecs);
    assert_eq!(output, input);
}

#[test]
fn test_round_trip_across_chunks_and_segments() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(30, 50);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let config = RecordConfig::unbounded()
        .with_chunk_raw_size(300)
        .with_segment_raw_size(1000);

    let summary = RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();
    assert!(summary.segments.len() > 1);
    assert_eq!(summary.segments[0], base.with_extension("record.00000"));

    let output = read_all(&summary.segments, &codecs);
    assert_eq!(output, input);
}

#[test]
fn test_round_trip_prost_codec_with_derived_time() {
    let (base, _guard) = temp_base();
    let codecs = CodecTable::new().with(
        "/pose",
        ProstCodec::<Pose>::new("demo.Pose").with_timestamp(|p| seconds_to_nanos(p.timestamp_sec)),
    );

    let mut sink = MessageSink::ordered();
    sink.push(TimedMessage::untimed(Pose {
        timestamp_sec: 2.0,
        x: 1.0,
        y: 2.0,
    }));
    // explicit time wins over the content-derived one
    sink.push(TimedMessage::at(
        500,
        Pose {
            timestamp_sec: 9.0,
            x: 3.0,
            y: 4.0,
        },
    ));
    let mut input = SinkMap::new();
    input.insert("/pose".to_string(), sink);

    RecordWriter::new(RecordConfig::unbounded())
        .write_all(&base, &input, &codecs)
        .unwrap();

    let mut output = ordered_sinks::<Pose>(&["/pose"]);
    RecordParser::new()
        .parse(&base, &mut output, &codecs)
        .unwrap();
    let entries: Vec<_> = output["/pose"]
        .entries()
        .map(|(time, pose)| (time, pose.x))
        .collect();
    assert_eq!(entries, vec![(Some(500), 3.0), (Some(2_000_000_000), 1.0)]);

    let channels = RecordParser::get_channels(&base).unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].message_type, "demo.Pose");
    assert_eq!(channels[0].message_count, 2);
}

// ============================================================================
// Chunk Tests
// ============================================================================

#[test]
fn test_unsorted_messages_single_chunk() {
    let (path, _guard) = temp_base();
    let mut writer = RecordFileWriter::open(&path).unwrap();
    writer
        .write_header(HeaderBuilder::new().chunk_interval(0).chunk_raw_size(0).build())
        .unwrap();
    writer.write_channel(raw_channel("/a")).unwrap();
    for t in [10u64, 5, 20] {
        writer
            .write_message(SingleMessage::new("/a", t, vec![1, 2, 3]))
            .unwrap();
    }
    writer.close().unwrap();

    let mut parser = open_parser(&path);
    parser.read_index().unwrap();
    let chunks = parser.chunk_summaries();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].begin_time, 5);
    assert_eq!(chunks[0].end_time, 20);
    assert_eq!(chunks[0].message_count, 3);
    assert_eq!(chunks[0].raw_size, 9);
}

#[test]
fn test_chunk_interval_split() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(50, 4);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let config = RecordConfig::unbounded().with_chunk_interval(100);

    RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();

    let mut parser = open_parser(&base);
    parser.read_index().unwrap();
    let chunks = parser.chunk_summaries();
    assert!(chunks.len() > 1);

    let mut total = 0;
    for chunk in &chunks {
        let (header, body) = parser.read_chunk(chunk.position).unwrap();
        assert_eq!(header.message_number, body.messages.len() as u64);
        for message in &body.messages {
            assert!(
                header.begin_time <= message.time && message.time <= header.end_time,
                "message at {} outside chunk [{}, {}]",
                message.time,
                header.begin_time,
                header.end_time
            );
        }
        total += body.messages.len();
    }
    assert_eq!(total, 100);
}

// ============================================================================
// On-Disk Invariant Tests
// ============================================================================

#[test]
fn test_header_and_index_invariants() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(25, 40);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let config = RecordConfig::unbounded().with_chunk_raw_size(200);

    RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();

    let bytes = fs::read(&base).unwrap();
    // header frame at 0, padded region, first channel right after it
    assert_eq!(&bytes[0..4], &(SectionType::SectionHeader as i32).to_le_bytes());
    let header_len = i64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert!(header_len as u64 <= HEADER_LENGTH);
    let next = HEADER_REGION_END as usize;
    assert_eq!(
        &bytes[next..next + 4],
        &(SectionType::SectionChannel as i32).to_le_bytes()
    );

    let mut parser = open_parser(&base);
    let header = parser.header().unwrap().clone();
    assert!(header.is_complete);
    assert_eq!(header.size, bytes.len() as u64);
    assert_eq!(header.message_number, 50);
    assert_eq!(header.channel_number, 2);
    assert_eq!((header.begin_time, header.end_time), (0, 241));

    let index = parser.read_index().unwrap().clone();
    assert_eq!(
        index.indexes.len() as u64,
        header.channel_number + 2 * header.chunk_number
    );
    let chunk_total: u64 = parser.chunk_summaries().iter().map(|c| c.message_count).sum();
    assert_eq!(chunk_total, header.message_number);
    assert_eq!(parser.channel_info("/lidar").unwrap().message_number, 25);
}

#[test]
fn test_segments_are_self_contained() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(40, 30);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let config = RecordConfig::unbounded().with_segment_raw_size(500);

    let summary = RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();
    assert!(summary.segments.len() > 1);

    let mut total = 0;
    for segment in &summary.segments {
        let mut parser = open_parser(segment);
        assert!(parser.header().unwrap().is_complete);
        parser.read_index().unwrap();
        assert_eq!(parser.channels().len(), 2);

        let mut sinks = ordered_sinks(&["/camera", "/lidar"]);
        total += parser.read_messages(&mut sinks, &codecs).unwrap();
    }
    assert_eq!(total, 80);
}

#[test]
fn test_output_is_deterministic() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(30, 50);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let config = RecordConfig::unbounded()
        .with_chunk_raw_size(256)
        .with_segment_raw_size(1200);

    let first = RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();
    let first_bytes: Vec<Vec<u8>> = first.segments.iter().map(|p| fs::read(p).unwrap()).collect();

    let second = RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();
    let second_bytes: Vec<Vec<u8>> = second
        .segments
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();

    assert_eq!(first.segments, second.segments);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn test_header_template_counters_start_at_zero() {
    let (base, _guard) = temp_base();
    let first = base.with_extension("first");
    let mut writer = RecordFileWriter::open(&first).unwrap();
    writer
        .write_header(HeaderBuilder::new().chunk_interval(0).chunk_raw_size(0).build())
        .unwrap();
    writer.write_channel(raw_channel("/a")).unwrap();
    for t in 1..=3u64 {
        writer
            .write_message(SingleMessage::new("/a", t, vec![1, 2]))
            .unwrap();
    }
    writer.close().unwrap();

    // reuse a finished header, counters and all
    let used = open_parser(&first).header().unwrap().clone();
    assert!(used.is_complete);
    assert_eq!(used.message_number, 3);

    let mut recorder = RecordWriter::with_header(used.clone());
    assert_eq!(recorder.header_template().message_number, 0);
    recorder.open(&base).unwrap();
    recorder.write_channel("/b", "test.Raw", &[]).unwrap();
    recorder
        .write_message(SingleMessage::new("/b", 100, vec![9]))
        .unwrap();
    recorder.close().unwrap();
    assert_eq!(recorder.segment_paths().len(), 1);

    let mut parser = open_parser(&recorder.segment_paths()[0]);
    let header = parser.header().unwrap().clone();
    assert!(header.is_complete);
    assert_eq!(header.message_number, 1);
    assert_eq!(header.chunk_number, 1);
    assert_eq!(header.channel_number, 1);
    assert_eq!((header.begin_time, header.end_time), (100, 100));
    assert_eq!(header.chunk_interval, used.chunk_interval);
    assert_eq!(header.segment_raw_size, used.segment_raw_size);

    parser.read_index().unwrap();
    let chunk_total: u64 = parser.chunk_summaries().iter().map(|c| c.message_count).sum();
    assert_eq!(chunk_total, header.message_number);
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_keyed_sink_drops_same_timestamp() {
    let (base, _guard) = temp_base();
    let codecs = raw_codecs(&["/a"]);
    let mut sink = MessageSink::ordered();
    sink.store(7, b"first".to_vec());
    sink.store(7, b"second".to_vec());
    let mut input = SinkMap::new();
    input.insert("/a".to_string(), sink);

    RecordWriter::new(RecordConfig::unbounded())
        .write_all(&base, &input, &codecs)
        .unwrap();

    let mut keyed = SinkMap::new();
    keyed.insert("/a".to_string(), MessageSink::keyed());
    let stored = RecordParser::new().parse(&base, &mut keyed, &codecs).unwrap();
    assert_eq!(stored, 1);
    assert_eq!(keyed["/a"].len(), 1);
    assert_eq!(
        keyed.remove("/a").unwrap().into_messages(),
        vec![b"first".to_vec()]
    );
}

#[test]
fn test_codec_failure_is_schema_error() {
    let (base, _guard) = temp_base();
    let codecs = raw_codecs(&["/pose"]);
    let mut sink = MessageSink::ordered();
    sink.store(1, vec![0xFF, 0xFF, 0xFF]);
    let mut input = SinkMap::new();
    input.insert("/pose".to_string(), sink);
    RecordWriter::new(RecordConfig::unbounded())
        .write_all(&base, &input, &codecs)
        .unwrap();

    let pose_codecs = CodecTable::new().with("/pose", ProstCodec::<Pose>::new("demo.Pose"));
    let mut sinks = ordered_sinks::<Pose>(&["/pose"]);
    let err = RecordParser::new()
        .parse(&base, &mut sinks, &pose_codecs)
        .unwrap_err();
    assert!(matches!(err, RecordError::SchemaError { ref channel, .. } if channel == "/pose"));
}

// ============================================================================
// Incomplete File Tests
// ============================================================================

#[test]
fn test_incomplete_file() {
    let (path, _guard) = temp_base();
    {
        let mut writer = RecordFileWriter::open(&path).unwrap();
        writer
            .write_header(HeaderBuilder::new().chunk_interval(0).chunk_raw_size(1).build())
            .unwrap();
        writer.write_channel(raw_channel("/a")).unwrap();
        for t in 0..3u64 {
            writer
                .write_message(SingleMessage::new("/a", t, vec![t as u8, 0]))
                .unwrap();
        }
        // dropped without close
    }

    let mut parser = open_parser(&path);
    assert!(!parser.header().unwrap().is_complete);
    let err = parser.read_index().unwrap_err();
    assert!(matches!(err, RecordError::IncompleteFile { .. }));
    assert_eq!(parser.position(), HEADER_REGION_END);

    let codecs = raw_codecs(&["/a"]);
    let mut sinks = ordered_sinks(&["/a"]);
    assert_eq!(parser.read_messages(&mut sinks, &codecs).unwrap(), 3);

    let info = RecordParser::info(&path).unwrap();
    assert!(!info.is_complete);
    assert_eq!(info.channels.len(), 1);
    assert_eq!(info.chunk_count, 3);
    assert_eq!(info.message_count, 3);
    assert!(RecordParser::get_channels(&path).is_err());
}

// ============================================================================
// Parser Reuse Tests
// ============================================================================

#[test]
fn test_parser_reuse_and_backward_seek() {
    let (base, _guard) = temp_base();
    let input = two_channel_input(5, 4);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    RecordWriter::new(RecordConfig::unbounded())
        .write_all(&base, &input, &codecs)
        .unwrap();

    let mut parser = open_parser(&base);
    parser.read_index().unwrap();
    let mut sinks = ordered_sinks(&["/camera"]);
    assert_eq!(parser.read_messages(&mut sinks, &codecs).unwrap(), 5);

    // going back to the header reopens the file
    parser.read_header().unwrap();
    let mut again = ordered_sinks(&["/camera"]);
    assert_eq!(parser.read_messages(&mut again, &codecs).unwrap(), 5);
    assert_eq!(sinks, again);
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_from_file_drives_splits() {
    let (base, _guard) = temp_base();
    let config_path = base.with_extension("toml");
    fs::write(
        &config_path,
        "chunk_interval_ns = 0\nsegment_interval_ns = 0\nchunk_raw_size = 0\nsegment_raw_size = 64\n",
    )
    .unwrap();
    let config = RecordConfig::load(&config_path).unwrap();
    assert!(config.is_segmented());

    let input = two_channel_input(10, 16);
    let codecs = raw_codecs(&["/camera", "/lidar"]);
    let summary = RecordWriter::new(config)
        .write_all(&base, &input, &codecs)
        .unwrap();
    assert!(summary.segments.len() >= 4);
    assert_eq!(read_all(&summary.segments, &codecs), input);
}
