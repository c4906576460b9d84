// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unsynchronization: collapsing/inserting `FF 00` byte pairs so an MPEG sync pattern never
//! appears inside tag data.

/// Collapses every `FF 00` pair in `buf` to a single `FF`, in place, returning the shortened
/// slice.
pub fn decode(buf: &mut [u8]) -> &mut [u8] {
    let len = buf.len();
    if len == 0 {
        return buf;
    }

    let mut src = 0;
    let mut dst = 0;

    while src < len - 1 {
        buf[dst] = buf[src];
        dst += 1;
        src += 1;

        if buf[src - 1] == 0xFF && buf[src] == 0x00 {
            src += 1;
        }
    }

    if src < len {
        buf[dst] = buf[src];
        dst += 1;
    }

    &mut buf[..dst]
}

/// Inserts a `0x00` byte after every `0xFF` byte so the encoded stream never contains a false
/// MPEG sync marker.
pub fn encode(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    for &byte in buf {
        out.push(byte);
        if byte == 0xFF {
            out.push(0x00);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_then_decode() {
        let original = [0x00, 0xFF, 0x01, 0xFF, 0xFF, 0x02];
        let encoded = encode(&original);
        let mut buf = encoded.clone();
        let decoded = decode(&mut buf);
        assert_eq!(decoded, &original[..]);
    }

    #[test]
    fn decode_handles_trailing_byte() {
        let mut buf = [0x01, 0x02, 0x03];
        assert_eq!(decode(&mut buf), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn decode_collapses_ff_00_pair() {
        let mut buf = [0xFF, 0x00, 0x01];
        assert_eq!(decode(&mut buf), &[0xFF, 0x01]);
    }
}
