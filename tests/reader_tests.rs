// tests/reader_tests.rs
mod common;

use common::*;
use evio_rs::{
    BankKind, CompressionType, Endianness, EvioError, EvioFile, EventCategory, FileKind,
};
use std::io::Write;

/// A file that is nothing but a 14-word header: no records, no trailer.
#[test]
fn test_empty_file() {
    for order in [Order::Little, Order::Big] {
        let mut buf = Buf::new(order);
        file_header(&mut buf, 0, 0, 0, 0, 0);
        let file = EvioFile::from_bytes(buf.bytes).unwrap();
        assert_eq!(file.record_count(), 0);
        assert_eq!(file.records().count(), 0);
        assert_eq!(file.header().record_count, 0);
        assert!(file.trailer_record().unwrap().is_none());
        assert!(file.user_header_bytes().unwrap().is_empty());
        assert!(file.dictionary_bytes().unwrap().is_none());
    }
}

/// One record with zero events and nothing else.
#[test]
fn test_single_empty_record() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(&mut buf, 1, &[], 0, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert_eq!(file.record_count(), 1);
    let rec = file.record(0).unwrap();
    assert_eq!(rec.event_count(), 0);
    assert_eq!(rec.events().unwrap().count(), 0);
    assert!(!rec.is_trailer());
}

#[test]
fn test_open_from_path() {
    let mut buf = Buf::new(Order::Big);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(&mut buf, 1, &[u32_bank(Order::Big, 0xa, 0, &[1, 2, 3])], 0, 0);

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&buf.bytes).unwrap();
    tmp.flush().unwrap();

    let file = EvioFile::open(tmp.path()).unwrap();
    assert_eq!(file.endianness(), Endianness::Big);
    assert_eq!(file.header().kind, FileKind::Evio);
    let root = file.record(0).unwrap().event(0).unwrap().root().unwrap();
    assert_eq!(root.tag(), 0xa);
    assert_eq!(root.as_typed_slice().unwrap().values::<u32>().unwrap(), vec![1, 2, 3]);
}

fn sample_events(order: Order) -> Vec<Vec<u8>> {
    let child_a = u32_bank(order, 0x101, 1, &[10, 20, 30]);
    let child_b = u16_bank(order, 0x102, 2, &[7, 8, 9]);
    let tree = container_bank(order, 0xff11, 0x10, 1, &[child_a, child_b]);
    let flat = u8_bank(order, 0x103, 3, &[1, 2, 3, 4, 5]);
    vec![tree, flat]
}

/// Flatten a file into comparable (tag, num, kind, values) rows.
fn normalize(file: &EvioFile) -> Vec<(u16, u8, BankKind, Vec<u64>)> {
    let mut rows = Vec::new();
    for rec in file.records() {
        let rec = rec.unwrap();
        for event in rec.events().unwrap() {
            let mut stack = vec![event.root().unwrap()];
            while let Some(bank) = stack.pop() {
                let values = if bank.is_container() {
                    let children: Vec<_> =
                        bank.children().unwrap().map(|c| c.unwrap()).collect();
                    stack.extend(children.into_iter().rev());
                    Vec::new()
                } else {
                    let slice = bank.as_typed_slice().unwrap();
                    match slice.element_size() {
                        1 => slice.values::<u8>().unwrap().iter().map(|&v| v as u64).collect(),
                        2 => slice.values::<u16>().unwrap().iter().map(|&v| v as u64).collect(),
                        _ => slice.values::<u32>().unwrap().iter().map(|&v| v as u64).collect(),
                    }
                };
                rows.push((bank.tag(), bank.num(), bank.kind(), values));
            }
        }
    }
    rows
}

/// The same logical content written big- and little-endian decodes to the
/// same bank tree.
#[test]
fn test_endianness_normalization() {
    let mut files = Vec::new();
    for order in [Order::Little, Order::Big] {
        let mut buf = Buf::new(order);
        file_header(&mut buf, 1, 0, 0, 0, 0);
        record(&mut buf, 1, &sample_events(order), 1 << 9, 0);
        files.push(EvioFile::from_bytes(buf.bytes).unwrap());
    }
    assert_eq!(files[0].endianness(), Endianness::Little);
    assert_eq!(files[1].endianness(), Endianness::Big);
    assert_eq!(normalize(&files[0]), normalize(&files[1]));
}

#[test]
fn test_event_count_round_trip() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(&mut buf, 1, &sample_events(Order::Little), 0, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    let rec = file.record(0).unwrap();
    assert_eq!(rec.event_count(), rec.event_spans().unwrap().len());
    assert_eq!(rec.event_count(), 2);
}

/// A trailer index of 142 (length, event-count) pairs gives random access
/// to all 142 records without scanning.
#[test]
fn test_trailer_index_random_access() {
    const RECORDS: u32 = 142;
    let mut buf = Buf::new(Order::Little);
    // one record = 14 header + 1 index + 3 event words
    let record_words = 18u32;
    let first = 56u64;
    let trailer_position = first + RECORDS as u64 * record_words as u64 * 4;
    file_header(&mut buf, RECORDS, 0, 0, 1 << 10, trailer_position);
    for i in 0..RECORDS {
        record(
            &mut buf,
            i + 1,
            &[u32_bank(Order::Little, 0x200 + i as u16, 0, &[i])],
            0,
            0,
        );
    }
    let pairs: Vec<(u32, u32)> = (0..RECORDS).map(|_| (record_words, 1)).collect();
    trailer(&mut buf, RECORDS + 1, &pairs);

    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert_eq!(file.record_count(), 142);

    let rec = file.record(141).unwrap();
    assert_eq!(rec.header().record_number, 142);
    let root = rec.event(0).unwrap().root().unwrap();
    assert_eq!(root.as_typed_slice().unwrap().values::<u32>().unwrap(), vec![141]);

    let trailer_rec = file.trailer_record().unwrap().unwrap();
    assert!(trailer_rec.is_trailer());
    assert!(trailer_rec.is_last());
    assert_eq!(trailer_rec.record_index(Some(RECORDS)).unwrap().len(), 142);
}

/// The file-header index alone also drives discovery.
#[test]
fn test_file_header_index() {
    let events = vec![u32_bank(Order::Little, 1, 0, &[42])];
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 2, 16, 0, 0, 0);
    // (length, event-count) pairs in the file-header index region
    buf.words(&[18, 1, 18, 1]);
    record(&mut buf, 1, &events, 0, 0);
    record(&mut buf, 2, &events, 1 << 9, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert_eq!(file.record_count(), 2);
    assert_eq!(file.record(1).unwrap().header().record_number, 2);
}

/// Disagreeing file-header and trailer indexes are corruption.
#[test]
fn test_index_disagreement_is_corruption() {
    let events = vec![u32_bank(Order::Little, 1, 0, &[42])];
    let mut buf = Buf::new(Order::Little);
    let first = 56 + 16u64;
    let trailer_position = first + 2 * 18 * 4;
    file_header(&mut buf, 2, 16, 0, 1 << 10, trailer_position);
    buf.words(&[18, 1, 18, 1]);
    record(&mut buf, 1, &events, 0, 0);
    record(&mut buf, 2, &events, 0, 0);
    // trailer claims a different length for record 0
    trailer(&mut buf, 3, &[(20, 1), (18, 1)]);
    assert!(matches!(
        EvioFile::from_bytes(buf.bytes),
        Err(EvioError::Corruption(_))
    ));
}

/// A compressed record still reports its header fields but refuses event
/// and leaf access.
#[test]
fn test_compressed_record_header_parses() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(
        &mut buf,
        1,
        &[u32_bank(Order::Little, 1, 0, &[42])],
        (1 << 9) | (1 << 10),
        1,
    );
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    let rec = file.record(0).unwrap();
    assert_eq!(rec.compression_type(), CompressionType::Lz4Fast);
    assert_eq!(rec.compression_type().to_string(), "LZ4 (fast)");
    assert_eq!(rec.event_count(), 1);
    assert_eq!(rec.event_category(), EventCategory::Physics);
    assert!(matches!(
        rec.event(0),
        Err(EvioError::UnsupportedCompression(_))
    ));
}

/// "H\0i\0\x04\x04\x04\x04" decodes to ["H", "i"].
#[test]
fn test_string_bank_event() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(
        &mut buf,
        1,
        &[string_bank(Order::Little, 0x5, 0, b"H\0i\0\x04\x04\x04\x04")],
        1 << 9,
        0,
    );
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    let root = file.record(0).unwrap().event(0).unwrap().root().unwrap();
    assert_eq!(root.as_strings().unwrap(), vec!["H", "i"]);
}

/// The dictionary travels in the file's user header.
#[test]
fn test_dictionary_in_user_header() {
    let xml = b"<xmlDict/>\0\0";
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, xml.len() as u32, 1 << 8, 0);
    buf.raw(xml);
    record(&mut buf, 1, &[], 1 << 9, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert!(file.header().has_dictionary);
    assert_eq!(file.dictionary_bytes().unwrap().unwrap(), xml);
    assert!(file.first_event_bytes().unwrap().is_none());
    assert_eq!(file.record_count(), 1);
}

/// A bad header mid-scan keeps the records before it readable; the
/// iterator surfaces the error once, then stops.
#[test]
fn test_partial_scan_on_corrupt_record() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 2, 0, 0, 0, 0);
    record(&mut buf, 1, &[u32_bank(Order::Little, 1, 0, &[7])], 0, 0);
    buf.raw(&[0u8; 64]);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert_eq!(file.record_count(), 1);
    assert!(file.record(0).is_ok());

    let results: Vec<_> = file.records().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(EvioError::Corruption(_))));
}

/// Repeated access reuses the memoized header and event index and yields
/// identical metadata and spans.
#[test]
fn test_record_access_is_memoized_and_idempotent() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 1, 0, 0, 0, 0);
    record(&mut buf, 7, &sample_events(Order::Little), 1 << 9, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();

    let first = file.record(0).unwrap();
    let second = file.record(0).unwrap();
    assert_eq!(first.header().record_number, 7);
    assert_eq!(
        first.header().record_number,
        second.header().record_number
    );
    assert_eq!(
        first.event_spans().unwrap(),
        second.event_spans().unwrap()
    );
    assert_eq!(
        first.event(0).unwrap().root().unwrap().tag(),
        second.event(0).unwrap().root().unwrap().tag()
    );
}

#[test]
fn test_record_out_of_range() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 0, 0, 0, 0, 0);
    let file = EvioFile::from_bytes(buf.bytes).unwrap();
    assert!(matches!(
        file.record(0),
        Err(EvioError::OutOfRange { index: 0, count: 0 })
    ));
}

#[test]
fn test_truncated_file() {
    let mut buf = Buf::new(Order::Little);
    file_header(&mut buf, 0, 0, 0, 0, 0);
    assert!(matches!(
        EvioFile::from_bytes(&buf.bytes[..40]),
        Err(EvioError::Truncated { .. })
    ));
}

#[test]
fn test_not_an_evio_file() {
    assert!(matches!(
        EvioFile::from_bytes(vec![0u8; 64]),
        Err(EvioError::BadMagic { .. })
    ));
}
