//! Polyline Module
//!
//! Encoded polyline (signed varint, 1e5 precision) decoding and encoding.

use crate::geo::Coordinate;

const PRECISION: f64 = 1e5;
const CHAR_OFFSET: i64 = 63;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;

// == Decode ==
/// Decodes an encoded polyline into ordered coordinates.
///
/// Each pair is a delta from the previous point, the first relative to
/// `(0, 0)`. Malformed input (bad characters, truncated values, out-of-range
/// coordinates) yields an empty sequence rather than an error.
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        let (Some(dlat), Some(dlng)) = (
            next_value(bytes, &mut index),
            next_value(bytes, &mut index),
        ) else {
            return Vec::new();
        };
        lat += dlat;
        lng += dlng;

        let point = Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION);
        if !point.is_valid() {
            return Vec::new();
        }
        points.push(point);
    }

    points
}

/// Reads one zig-zag encoded varint starting at `index`.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;
        if !(63..=126).contains(&byte) || shift > 30 {
            return None;
        }
        let chunk = byte as i64 - CHAR_OFFSET;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        if chunk < CONTINUATION {
            break;
        }
    }
    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

// == Encode ==
/// Encodes coordinates with the same scheme [`decode`] reads.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn encode_value(value: i64, out: &mut String) {
    let mut value = if value < 0 { !(value << 1) } else { value << 1 };
    while value >= CONTINUATION {
        out.push(((CONTINUATION | (value & CHUNK_MASK)) + CHAR_OFFSET) as u8 as char);
        value >>= 5;
    }
    out.push((value + CHAR_OFFSET) as u8 as char);
}
