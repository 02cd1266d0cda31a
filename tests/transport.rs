mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{echo_reply, tagged_reply, Action, FakeDevice, LOCALHOST};
use escea_fire::{CommandFrame, ConcurrencyPolicy, FireError, UdpTransport};

#[tokio::test]
async fn test_late_reply_is_not_delivered_to_next_request() {
    // Request A is answered after it has timed out, request B right away
    let device = FakeDevice::start(|n, _| match n {
        0 => Action::after(Duration::from_millis(200), tagged_reply(1)),
        _ => Action::now(tagged_reply(2)),
    })
    .await;
    let transport = UdpTransport::new(device.transport_config());

    let a = transport
        .send_and_await(
            LOCALHOST,
            &CommandFrame::status_query(),
            Duration::from_millis(50),
        )
        .await;
    assert!(matches!(a, Err(FireError::Timeout { .. })));

    // Let A's stale reply land on the still-bound endpoint
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(transport.is_open());

    let b = transport
        .send_and_await(
            LOCALHOST,
            &CommandFrame::status_query(),
            Duration::from_millis(500),
        )
        .await
        .unwrap();
    assert_eq!(b.status().room_temp, 2);
}

#[tokio::test]
async fn test_queued_stale_reply_is_discarded_when_next_window_opens() {
    // A is never answered in time; B is answered after 30 ms
    let device = FakeDevice::start(|n, _| match n {
        0 => Action::Ignore,
        _ => Action::after(Duration::from_millis(30), tagged_reply(2)),
    })
    .await;
    let transport = UdpTransport::new(device.transport_config());

    let a = transport
        .send_and_await(
            LOCALHOST,
            &CommandFrame::status_query(),
            Duration::from_millis(50),
        )
        .await;
    assert!(matches!(a, Err(FireError::Timeout { .. })));

    // A's answer lands in the socket queue and B starts without yielding,
    // so the receive task has not read it yet
    let late = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    late.send_to(&tagged_reply(1), transport.local_addr().unwrap())
        .unwrap();

    let b = transport
        .send_and_await(
            LOCALHOST,
            &CommandFrame::status_query(),
            Duration::from_millis(500),
        )
        .await
        .unwrap();
    assert_eq!(b.status().room_temp, 2);
}

#[tokio::test]
async fn test_endpoint_without_idle_limit() {
    let device = FakeDevice::start(|_, _| {
        Action::after(Duration::from_millis(20), tagged_reply(7))
    })
    .await;
    let transport =
        UdpTransport::new(device.transport_config().with_idle_timeout(Duration::MAX));
    let window = Duration::from_millis(300);

    for _ in 0..2 {
        let reply = transport
            .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
            .await
            .unwrap();
        assert_eq!(reply.status().room_temp, 7);
    }
    assert!(transport.is_open());

    transport.close().await;
    assert!(!transport.is_open());
}

#[tokio::test]
async fn test_queued_requests_get_their_own_replies() {
    let device = FakeDevice::start(|_, request| {
        Action::after(Duration::from_millis(100), echo_reply(request))
    })
    .await;
    let transport = Arc::new(UdpTransport::new(device.transport_config()));

    let mut handles = Vec::new();
    for celsius in [12.0, 20.0, 25.0, 31.0] {
        let transport = Arc::clone(&transport);
        handles.push(tokio::spawn(async move {
            let frame = CommandFrame::set_temperature(celsius).unwrap();
            let reply = transport
                .send_and_await(LOCALHOST, &frame, Duration::from_millis(500))
                .await
                .unwrap();
            (celsius as u8, reply.status().desired_temp)
        }));
    }

    for handle in handles {
        let (sent, echoed) = handle.await.unwrap();
        assert_eq!(sent, echoed);
    }
    assert_eq!(device.requests().len(), 4);
}

#[tokio::test]
async fn test_reject_policy() {
    let device = FakeDevice::start(|_, _| {
        Action::after(Duration::from_millis(200), tagged_reply(5))
    })
    .await;
    let transport = Arc::new(UdpTransport::new(
        device
            .transport_config()
            .with_policy(ConcurrencyPolicy::Reject),
    ));

    let first = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move {
            transport
                .send_and_await(
                    LOCALHOST,
                    &CommandFrame::status_query(),
                    Duration::from_millis(500),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = transport
        .send_and_await(LOCALHOST, &CommandFrame::power_on(), Duration::from_millis(500))
        .await;
    assert!(matches!(second, Err(FireError::ConcurrentRequest)));

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status().room_temp, 5);

    // Only the first request went out
    assert_eq!(device.requests().len(), 1);
}

#[tokio::test]
async fn test_endpoint_reused_between_requests() {
    let device = FakeDevice::start(|_, _| Action::now(tagged_reply(3))).await;
    let transport = UdpTransport::new(device.transport_config());
    let window = Duration::from_millis(500);

    transport
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    let first = transport.local_addr().unwrap();

    transport
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    let second = transport.local_addr().unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_idle_endpoint_is_closed_and_reopened() {
    let device = FakeDevice::start(|_, _| Action::now(tagged_reply(4))).await;
    let transport =
        UdpTransport::new(device.transport_config().with_idle_timeout(Duration::from_millis(100)));
    let window = Duration::from_millis(500);

    transport
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    let bound = transport.local_addr().unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!transport.is_open());

    // The port is free for others while idle
    let squatter = std::net::UdpSocket::bind(bound).unwrap();
    drop(squatter);

    let reply = transport
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    assert_eq!(reply.status().room_temp, 4);
    assert!(transport.is_open());
}

#[tokio::test]
async fn test_fixed_local_port_held_by_another_transport() {
    let device = FakeDevice::start(|_, _| Action::now(tagged_reply(6))).await;
    let window = Duration::from_millis(500);

    let first = UdpTransport::new(device.transport_config());
    first
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    let port = first.local_addr().unwrap().port();

    let second = UdpTransport::new(device.transport_config().with_local_port(port));
    let result = second
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await;
    assert!(matches!(result, Err(FireError::TransportBusy { .. })));

    // Once the first one lets go the port can be taken over
    first.close().await;
    let reply = second
        .send_and_await(LOCALHOST, &CommandFrame::status_query(), window)
        .await
        .unwrap();
    assert_eq!(reply.status().room_temp, 6);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_datagram_from_other_host_is_ignored() {
    use tokio::net::UdpSocket;

    // The real answer comes late; a stranger on 127.0.0.2 answers first
    let device = FakeDevice::start(|_, _| {
        Action::after(Duration::from_millis(150), tagged_reply(8))
    })
    .await;
    let transport = Arc::new(UdpTransport::new(device.transport_config()));

    let request = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move {
            transport
                .send_and_await(
                    LOCALHOST,
                    &CommandFrame::status_query(),
                    Duration::from_millis(500),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let target = transport.local_addr().unwrap();
    let stranger = UdpSocket::bind("127.0.0.2:0").await.unwrap();
    stranger.send_to(&tagged_reply(99), target).await.unwrap();

    let reply = request.await.unwrap().unwrap();
    assert_eq!(reply.status().room_temp, 8);
}
