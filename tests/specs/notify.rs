// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use filer_core::Notification;
use filer_daemon::notify::Publisher;
use filer_daemon::Subscriber;

use crate::prelude::TIMEOUT;

#[tokio::test]
async fn same_broadcast_twice_is_received_twice() {
    let publisher = Publisher::bind("127.0.0.1:0").await.unwrap();
    let mut subscriber = Subscriber::connect(publisher.local_addr(), "").await.unwrap();
    publisher.wait_for_subscribers(1).await;

    let change = Notification::new("/srv/docs/report.pdf", 1_700_000_000_000);
    publisher.publish(&change);
    publisher.publish(&change);

    let first = tokio::time::timeout(TIMEOUT, subscriber.recv()).await.unwrap().unwrap();
    let second = tokio::time::timeout(TIMEOUT, subscriber.recv()).await.unwrap().unwrap();
    assert_eq!(first, Some(change.clone()));
    assert_eq!(second, Some(change));
    assert_eq!(
        first.map(|n| n.to_string().starts_with("File \"/srv/docs/report.pdf\" changed at ")),
        Some(true)
    );
}

#[tokio::test]
async fn malformed_notification_does_not_stop_the_subscriber() {
    let publisher = Publisher::bind("127.0.0.1:0").await.unwrap();
    let mut subscriber = Subscriber::connect(publisher.local_addr(), "").await.unwrap();
    publisher.wait_for_subscribers(1).await;

    publisher.publish_raw(b"{\"file\":");
    publisher.publish_raw(b"{\"timestamp\":1}");
    publisher.publish(&Notification::new("/after", 2));

    let next = tokio::time::timeout(TIMEOUT, subscriber.recv()).await.unwrap().unwrap();
    assert_eq!(next, Some(Notification::new("/after", 2)));
}
