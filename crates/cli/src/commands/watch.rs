// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `filer watch`: follow the change-notification channel

use std::net::SocketAddr;

use anyhow::Result;
use clap::Args;
use filer_daemon::{env, Subscriber};

use crate::output::{write_notification, OutputFormat};

#[derive(Args)]
pub struct WatchArgs {
    /// Notification channel address [env: FILERD_NOTIFY]
    #[arg(long)]
    pub addr: Option<SocketAddr>,
    /// Only show files whose path starts with this prefix
    #[arg(long, default_value = "")]
    pub filter: String,
    /// Exit after this many notifications
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub async fn handle(args: WatchArgs) -> Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => env::notify_addr()?,
    };
    let mut subscriber = Subscriber::connect(addr, args.filter).await?;
    let mut seen = 0;

    while args.count.is_none_or(|limit| seen < limit) {
        let next = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = subscriber.recv() => next?,
        };
        let Some(notification) = next else {
            break;
        };
        write_notification(&mut std::io::stdout().lock(), &notification, args.output)?;
        seen += 1;
    }
    Ok(())
}
