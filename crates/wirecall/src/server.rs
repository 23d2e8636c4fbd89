use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use wirecall_rpc::{Rpc, RpcConfig};

use crate::exit::{phy_error, rpc_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(fifo_first: &Path, fifo_second: &Path) -> CliResult<i32> {
    let (phy_send, phy_recv) = wirecall_phy::open_pair(fifo_first, fifo_second)
        .map_err(|err| phy_error("channel open failed", err))?;

    let rpc = Rpc::new(RpcConfig::default());
    rpc.register("ping", |_args, out, _t| {
        out[..4].copy_from_slice(b"pong");
        Ok(4)
    })
    .map_err(|err| rpc_error("registration failed", err))?;

    rpc.start(phy_send, phy_recv)
        .map_err(|err| rpc_error("start failed", err))?;

    info!("server ready, waiting for requests");

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    while running.load(Ordering::SeqCst) {
        wirecall_osal::sleep_ms(100);
    }

    info!("shutting down");
    Ok(SUCCESS)
}
