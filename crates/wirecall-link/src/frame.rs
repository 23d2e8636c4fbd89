use bytes::{BufMut, BytesMut};

use crate::crc8::{crc8, CRC8_INIT, CRC8_POLY};
use crate::error::{LinkError, Result};
use crate::limits::{MAX_PAYLOAD, MIN_PAYLOAD};

/// Start Of Frame marker.
pub const SOF: u8 = 0xFA;
/// Start Of Data marker.
pub const SOD: u8 = 0xFB;
/// End Of Frame marker.
pub const EOF: u8 = 0xFE;

/// Frame bytes surrounding the payload: SOF, two length bytes, hdr_crc,
/// SOD, pkt_crc, EOF.
const OVERHEAD: usize = 7;

/// Total wire size of a frame carrying `payload_len` bytes.
pub fn frame_size(payload_len: usize) -> usize {
    OVERHEAD + payload_len
}

/// Encode one complete frame into `dst`.
///
/// The payload length must lie in `[MIN_PAYLOAD, MAX_PAYLOAD]`; nothing is
/// written otherwise. The caller hands the filled buffer to the PHY as a
/// single contiguous write.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = payload.len();
    if !(MIN_PAYLOAD..=MAX_PAYLOAD).contains(&len) {
        return Err(LinkError::PayloadSize { len });
    }

    // len field counts SOD + payload + pkt_crc + EOF.
    let pkt_len = (len + 3) as u16;
    let hdr = [SOF, (pkt_len & 0xFF) as u8, (pkt_len >> 8) as u8];

    dst.reserve(frame_size(len));
    dst.put_slice(&hdr);
    dst.put_u8(crc8(&hdr, CRC8_INIT, CRC8_POLY));
    dst.put_u8(SOD);
    dst.put_slice(payload);

    let pkt_crc = crc8(payload, crc8(&[SOD], CRC8_INIT, CRC8_POLY), CRC8_POLY);
    dst.put_u8(pkt_crc);
    dst.put_u8(EOF);
    Ok(())
}
