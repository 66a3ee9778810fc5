//! Functions for turning assembled records into output: hex strings,
//! human-readable listings and raw memory segments.

use itertools::Itertools;

use crate::assemble::Assembled;

/// Every byte of `assembled`, in order, as upper-case hex with no separators.
pub fn to_hex_string(assembled: &[Assembled]) -> String {
    assembled.iter()
        .flat_map(|record| record.bytes())
        .map(|byte| format!("{:02X}", byte))
        .join("")
}

/// One line per record: `ADDR HEX<TAB>source` for code and data, `ADDR name:` for labels.
pub fn listing(assembled: &[Assembled]) -> String {
    assembled.iter()
        .map(|record| {
            let address = format!("{:04X}", record.address());
            match record {
                Assembled::Label(label) =>
                    format!("{} {}{}:", address, if label.local { "@" } else { "" }, label.name),
                _ => {
                    let hex = record.bytes().iter().map(|byte| format!("{:02X}", byte)).join("");
                    let source = record.line().map(|line| line.assembly.as_str()).unwrap_or("");
                    format!("{} {}\t{}", address, hex, source)
                }
            }
        })
        .join("\n")
}

/// A run of bytes to be loaded starting at `origin`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    pub origin: u16,
    pub bytes: Vec<u8>,
}

impl Segment {
    /// The address just past the segment's last byte.
    pub fn end(&self) -> u32 {
        u32::from(self.origin) + self.bytes.len() as u32
    }
}

/// Groups the bytes of `assembled` into contiguous segments.
///
/// A new segment starts whenever a record doesn't begin where the previous one ended,
/// which happens after each `.org`. Segments are returned in source order and may overlap.
pub fn segments(assembled: &[Assembled]) -> Vec<Segment> {
    assembled.iter()
        .filter(|record| !record.bytes().is_empty())
        .map(|record| Segment { origin: record.address(), bytes: record.bytes().to_vec() })
        .coalesce(|mut previous, next| {
            if previous.end() == u32::from(next.origin) {
                previous.bytes.extend(next.bytes);
                Ok(previous)
            } else {
                Err((previous, next))
            }
        })
        .collect()
}

/// Layers `segments` onto a single zero-filled image spanning all of them, in the given order.
///
/// No regard is given to bytes that have already been placed; if two segments
/// cover the same address, the later one wins. Returns `None` when there are no segments.
pub fn image(segments: &[Segment]) -> Option<Segment> {
    let origin = segments.iter().map(|segment| segment.origin).min()?;
    let end = segments.iter().map(Segment::end).max()?;
    let mut bytes = vec![0; (end - u32::from(origin)) as usize];
    for segment in segments {
        let start = usize::from(segment.origin - origin);
        bytes[start..start + segment.bytes.len()].copy_from_slice(&segment.bytes);
    }
    Some(Segment { origin, bytes })
}
