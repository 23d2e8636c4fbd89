use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::crc8::{crc8, CRC8_INIT, CRC8_POLY};
use crate::frame::{EOF, SOD, SOF};
use crate::limits::{MAX_PKT_LEN, MIN_PKT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitSof,
    ReadLen1,
    ReadLen2,
    ReadHdrCrc,
    WaitSod,
    ReadPayload,
    ReadPktCrc,
    WaitEof,
}

/// Resynchronizing frame decoder.
///
/// Fed one byte at a time by the RX pump; emits one validated payload per
/// complete frame. Any violation (bad length, CRC mismatch, missing
/// marker) drops the frame in progress and returns the machine to hunting
/// for SOF. No state survives a completed or abandoned frame.
#[derive(Debug)]
pub struct FrameParser {
    state: State,
    hdr: [u8; 3],
    pkt_len: usize,
    payload: BytesMut,
    // Running CRC over SOD + payload, so no scratch copy is needed when the
    // pkt_crc byte arrives.
    pkt_crc: u8,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            state: State::WaitSof,
            hdr: [0; 3],
            pkt_len: 0,
            payload: BytesMut::new(),
            pkt_crc: 0,
        }
    }

    fn reset(&mut self) {
        self.state = State::WaitSof;
        self.pkt_len = 0;
        self.payload.clear();
    }

    /// Advance the machine by one byte, yielding a payload when this byte
    /// completes a valid frame.
    pub fn push(&mut self, b: u8) -> Option<Bytes> {
        match self.state {
            State::WaitSof => {
                if b == SOF {
                    self.hdr[0] = b;
                    self.state = State::ReadLen1;
                } else {
                    trace!(byte = b, "noise while hunting for SOF");
                }
            }
            State::ReadLen1 => {
                self.hdr[1] = b;
                self.state = State::ReadLen2;
            }
            State::ReadLen2 => {
                self.hdr[2] = b;
                self.pkt_len = (usize::from(self.hdr[2]) << 8) | usize::from(self.hdr[1]);
                if !(MIN_PKT_LEN..=MAX_PKT_LEN).contains(&self.pkt_len) {
                    debug!(len = self.pkt_len, "packet length out of range, dropping");
                    self.reset();
                } else {
                    self.state = State::ReadHdrCrc;
                }
            }
            State::ReadHdrCrc => {
                let expected = crc8(&self.hdr, CRC8_INIT, CRC8_POLY);
                if b == expected {
                    self.state = State::WaitSod;
                } else {
                    debug!(got = b, expected, "header CRC mismatch, dropping");
                    self.reset();
                }
            }
            State::WaitSod => {
                if b == SOD {
                    self.payload.clear();
                    self.pkt_crc = crc8(&[SOD], CRC8_INIT, CRC8_POLY);
                    self.state = State::ReadPayload;
                } else {
                    debug!(got = b, "expected SOD, dropping");
                    self.reset();
                }
            }
            State::ReadPayload => {
                self.payload.put_u8(b);
                self.pkt_crc = crc8(&[b], self.pkt_crc, CRC8_POLY);
                if self.payload.len() == self.pkt_len - 3 {
                    self.state = State::ReadPktCrc;
                }
            }
            State::ReadPktCrc => {
                if b == self.pkt_crc {
                    self.state = State::WaitEof;
                } else {
                    debug!(got = b, expected = self.pkt_crc, "packet CRC mismatch, dropping");
                    self.reset();
                }
            }
            State::WaitEof => {
                if b == EOF {
                    let payload = self.payload.split().freeze();
                    self.reset();
                    return Some(payload);
                }
                debug!(got = b, "expected EOF, dropping frame");
                self.reset();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::limits::{MAX_PAYLOAD, MIN_PAYLOAD};

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn feed(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Bytes> {
        bytes.iter().filter_map(|&b| parser.push(b)).collect()
    }

    #[test]
    fn roundtrip_byte_by_byte_across_length_range() {
        for len in MIN_PAYLOAD..=MAX_PAYLOAD {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let mut parser = FrameParser::new();
            let emitted = feed(&mut parser, &wire(&payload));
            assert_eq!(emitted.len(), 1, "len {len}");
            assert_eq!(emitted[0].as_ref(), payload.as_slice());
        }
    }

    #[test]
    fn parses_literal_ping_request_frame() {
        let frame = [
            0xFA, 0x0A, 0x00, 0x69, 0xFB, 0x0B, 0x01, 0x70, 0x69, 0x6E, 0x67, 0x00, 0x28, 0xFE,
        ];
        let mut parser = FrameParser::new();
        let emitted = feed(&mut parser, &frame);
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].as_ref(),
            [0x0B, 0x01, b'p', b'i', b'n', b'g', 0x00]
        );
    }

    #[test]
    fn back_to_back_frames() {
        let a = wire(&[0x0B, 0x01, b'a', 0x00]);
        let b = wire(&[0x0C, 0x00, b'b', 0x00, 0x11, 0x22]);
        let mut parser = FrameParser::new();
        let mut stream = a.clone();
        stream.extend_from_slice(&b);

        let emitted = feed(&mut parser, &stream);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].as_ref(), [0x0B, 0x01, b'a', 0x00]);
        assert_eq!(emitted[1].as_ref(), [0x0C, 0x00, b'b', 0x00, 0x11, 0x22]);
    }

    #[test]
    fn non_sof_noise_prefix_is_dropped() {
        let payload = [0x16, 0x02, b'o', b'k', 0x00, 0x01];
        let mut stream: Vec<u8> = (0u16..=255)
            .map(|b| b as u8)
            .filter(|&b| b != SOF)
            .collect();
        stream.extend_from_slice(&wire(&payload));

        let mut parser = FrameParser::new();
        let emitted = feed(&mut parser, &stream);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_ref(), payload);
    }

    #[test]
    fn header_crc_bit_flips_rejected() {
        let payload = [0x0B, 0x05, b'x', 0x00, 0xAA];
        let good = wire(&payload);
        for bit in 0..8 {
            let mut bad = good.clone();
            bad[3] ^= 1 << bit;

            let mut parser = FrameParser::new();
            assert!(feed(&mut parser, &bad).is_empty(), "bit {bit}");
            // Parser must be back at WAIT_SOF and accept a clean frame.
            let emitted = feed(&mut parser, &good);
            assert_eq!(emitted.len(), 1, "bit {bit}");
        }
    }

    #[test]
    fn packet_crc_bit_flips_rejected() {
        let payload = [0x0B, 0x05, b'x', 0x00, 0xAA];
        let good = wire(&payload);
        let crc_pos = good.len() - 2;
        for bit in 0..8 {
            let mut bad = good.clone();
            bad[crc_pos] ^= 1 << bit;

            let mut parser = FrameParser::new();
            assert!(feed(&mut parser, &bad).is_empty(), "bit {bit}");
            let emitted = feed(&mut parser, &good);
            assert_eq!(emitted.len(), 1, "bit {bit}");
        }
    }

    #[test]
    fn out_of_range_length_resyncs() {
        let mut stream = vec![SOF, 0x00, 0x00]; // len 0 < MIN_PKT_LEN
        let payload = [0x0B, 0x01, b'p', 0x00];
        stream.extend_from_slice(&wire(&payload));

        let mut parser = FrameParser::new();
        let emitted = feed(&mut parser, &stream);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_ref(), payload);
    }

    #[test]
    fn missing_sod_resyncs() {
        let payload = [0x0B, 0x01, b'p', 0x00];
        let good = wire(&payload);
        let mut bad = good.clone();
        bad[4] = 0x00; // clobber SOD

        let mut parser = FrameParser::new();
        assert!(feed(&mut parser, &bad).is_empty());
        assert_eq!(feed(&mut parser, &good).len(), 1);
    }

    #[test]
    fn missing_eof_drops_frame() {
        let payload = [0x0B, 0x01, b'p', 0x00];
        let good = wire(&payload);
        let mut bad = good.clone();
        let last = bad.len() - 1;
        bad[last] = 0x00; // clobber EOF

        let mut parser = FrameParser::new();
        assert!(feed(&mut parser, &bad).is_empty());
        assert_eq!(feed(&mut parser, &good).len(), 1);
    }

    #[test]
    fn truncated_frame_recovers_after_flush() {
        let payload = [0x0B, 0x09, b'l', b'o', b's', b't', 0x00];
        let good = wire(&payload);

        let mut parser = FrameParser::new();
        // Stop mid-payload, then the line goes quiet-zero for a while.
        assert!(feed(&mut parser, &good[..8]).is_empty());
        // Zeros can never complete a frame (EOF is 0xFE), so the parser
        // falls back to WAIT_SOF within one max-size packet worth of input.
        assert!(feed(&mut parser, &[0x00; MAX_PKT_LEN + 4]).is_empty());

        let emitted = feed(&mut parser, &good);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_ref(), payload);
    }

    #[test]
    fn no_state_leaks_between_frames() {
        let first = [0x16, 0x01, b'a', b'b', 0x00, 0x01, 0x02];
        let second = [0x0B, 0x02, b'c', 0x00];
        let mut parser = FrameParser::new();

        let got_first = feed(&mut parser, &wire(&first));
        assert_eq!(got_first[0].as_ref(), first);
        let got_second = feed(&mut parser, &wire(&second));
        assert_eq!(got_second[0].as_ref(), second);
    }
}
