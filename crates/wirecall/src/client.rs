use std::path::Path;
use std::time::Duration;

use tracing::info;
use wirecall_rpc::limits::ARGS_MAX;
use wirecall_rpc::{Rpc, RpcConfig};

use crate::exit::{phy_error, rpc_error, CliResult, SUCCESS};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

pub fn run(fifo_first: &Path, fifo_second: &Path, count: u64, interval_ms: u64) -> CliResult<i32> {
    // Cross-wired relative to the server: we write what it reads.
    let (phy_send, phy_recv) = wirecall_phy::open_pair(fifo_second, fifo_first)
        .map_err(|err| phy_error("channel open failed", err))?;

    let rpc = Rpc::new(RpcConfig::default());
    rpc.start(phy_send, phy_recv)
        .map_err(|err| rpc_error("start failed", err))?;

    info!("client ready, sending ping requests");

    let mut resp = [0u8; ARGS_MAX];
    let mut sent = 0u64;
    loop {
        let len = rpc
            .request("ping", &[], &mut resp, Some(REQUEST_TIMEOUT))
            .map_err(|err| rpc_error("request failed", err))?;
        println!("response: {}", String::from_utf8_lossy(&resp[..len]));

        sent += 1;
        if count != 0 && sent >= count {
            break;
        }
        wirecall_osal::sleep_ms(interval_ms);
    }

    Ok(SUCCESS)
}
