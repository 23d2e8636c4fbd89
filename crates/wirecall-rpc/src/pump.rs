//! Byte pumps between the physical channel and the protocol queues.
//!
//! Exactly one RX pump reads the channel and exactly one TX pump writes
//! it, so neither the parser nor the encoder needs to be shared. Both
//! loops end when their queue or the channel goes away, which lets a whole
//! endpoint wind down by dropping handles.

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};
use tracing::{debug, error};
use wirecall_osal::queue::{QueueRx, QueueTx};

use wirecall_link::limits::MAX_PAYLOAD;
use wirecall_link::{encode_frame, frame_size, FrameParser};

const READ_CHUNK: usize = 256;

/// Read channel bytes, feed the frame parser, queue each validated
/// payload. Blocks on the RX queue when the dispatcher falls behind,
/// which backpressures into the channel.
pub(crate) fn run_rx(mut phy: impl Read, rx_q: QueueTx<Bytes>) {
    debug!("rx pump started");
    let mut parser = FrameParser::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match phy.read(&mut chunk) {
            Ok(0) => {
                debug!("phy receive closed");
                break;
            }
            Ok(n) => {
                for &b in &chunk[..n] {
                    if let Some(payload) = parser.push(b) {
                        if rx_q.send(payload).is_err() {
                            debug!("rx queue closed");
                            return;
                        }
                    }
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                error!(%err, "phy receive failed");
                break;
            }
        }
    }
}

/// Frame queued payloads and write each as one contiguous channel write.
/// Write failures are logged and the frame dropped; the caller behind it
/// will time out.
pub(crate) fn run_tx(mut phy: impl Write, tx_q: QueueRx<Bytes>) {
    debug!("tx pump started");
    let mut frame = BytesMut::with_capacity(frame_size(MAX_PAYLOAD));
    while let Ok(payload) = tx_q.recv() {
        frame.clear();
        if let Err(err) = encode_frame(&payload, &mut frame) {
            error!(%err, "unframeable payload, dropping");
            continue;
        }
        if let Err(err) = phy.write_all(&frame).and_then(|()| phy.flush()) {
            error!(%err, "phy send failed, dropping frame");
        }
    }
    debug!("tx pump stopped");
}
