// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `filer get`: one request/reply round trip through the broker

use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use clap::Args;
use filer_daemon::{env, Client};

use crate::output::{write_reply, OutputFormat};

#[derive(Args)]
pub struct GetArgs {
    /// Path of the file, as seen by the workers
    pub path: String,
    /// Broker front-end address [env: FILERD_FRONTEND]
    #[arg(long)]
    pub addr: Option<SocketAddr>,
    /// Print the reply as JSON instead of the bare file content
    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub async fn handle(args: GetArgs) -> Result<()> {
    let GetArgs { path, addr, output } = args;
    let addr = match addr {
        Some(addr) => addr,
        None => env::frontend_addr()?,
    };
    let timeout = env::request_timeout();

    let reply = tokio::time::timeout(timeout, async move {
        let mut client = Client::connect(addr).await?;
        client.get(path).await
    })
    .await
    .map_err(|_| anyhow!("no reply from {} within {}ms", addr, timeout.as_millis()))??;

    write_reply(&mut std::io::stdout().lock(), &reply, output)
}
