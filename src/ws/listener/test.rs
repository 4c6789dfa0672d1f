use std::{sync::Arc, time::Duration};

use futures_util::{FutureExt, StreamExt};
use tokio::time::{self, Instant};
use url::Url;

use super::{
    close_code,
    mock::{MockConnector, MockServer},
    Listener, ListenerConfig,
};
use crate::ws::{
    ChannelDelegate, ClientEvent, DecodeError, Frame, ListenerEvent, ListenerEvents,
    StreamSubscription,
};

fn setup() -> (Listener, MockServer, Arc<ChannelDelegate>, ListenerEvents) {
    let _ = pretty_env_logger::try_init();

    let (connector, server) = MockConnector::new();
    let base = Url::parse("https://example.social").unwrap();
    let listener =
        Listener::with_connector(&base, "secret", ListenerConfig::default(), connector).unwrap();

    let (delegate, events) = ChannelDelegate::new();
    let delegate = Arc::new(delegate);
    listener.set_delegate(&delegate);

    (listener, server, delegate, events)
}

async fn next(events: &mut ListenerEvents) -> ListenerEvent {
    events.next().await.unwrap()
}

fn assert_about(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff < Duration::from_millis(10),
        "expected about {:?}, got {:?}",
        expected,
        actual
    );
}

async fn assert_quiet(events: &mut ListenerEvents, window: Duration) {
    if let Ok(event) = time::timeout(window, events.next()).await {
        panic!("unexpected listener event {:?}", event);
    }
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_connects_to_stream_url() {
    let (listener, mut server, _delegate, mut events) = setup();

    listener.subscribe(StreamSubscription::Hashtag("rust".to_string()));

    let peer = server.accept().await;
    assert_eq!(
        peer.url.as_str(),
        "wss://example.social/api/v1/streaming?access_token=secret&stream=hashtag&tag=rust"
    );
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
}

#[tokio::test(start_paused = true)]
async fn test_events_and_decode_errors_are_dispatched() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    peer.send_text("");
    peer.send_text(r#"{"event":"bogus"}"#);
    peer.send_text(r#"{"event":"delete","payload":"42"}"#);

    match next(&mut events).await {
        ListenerEvent::DecodeError(DecodeError::UnknownEventType { event }) => {
            assert_eq!(event, "bogus")
        }
        other => panic!("unexpected {:?}", other),
    }
    match next(&mut events).await {
        ListenerEvent::Event(ClientEvent::Delete { status_id }) => assert_eq!(status_id, "42"),
        other => panic!("unexpected {:?}", other),
    }

    // decode failures never close the connection
    assert!(peer.from_client.try_recv().is_err());
    assert_eq!(server.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_close_reconnects_to_same_url() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::PublicLocal);
    let peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    let closed_at = Instant::now();
    peer.send(Frame::Close(Some(1001)));
    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected { code: 1001 }
    ));

    let again = server.accept().await;
    assert_about(closed_at.elapsed(), Duration::from_millis(500));
    assert_eq!(again.url, peer.url);
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
}

#[tokio::test(start_paused = true)]
async fn test_stream_end_is_abnormal() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    drop(peer);
    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::ABNORMAL
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_failed_connects_back_off() {
    let (listener, mut server, _delegate, mut events) = setup();
    server.fail_next(3);

    let start = Instant::now();
    listener.subscribe(StreamSubscription::User);

    for _ in 0..3 {
        assert!(matches!(
            next(&mut events).await,
            ListenerEvent::Disconnected {
                code: close_code::ABNORMAL
            }
        ));
    }
    let peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    let offsets: Vec<_> = server.attempts().iter().map(|t| *t - start).collect();
    assert_eq!(offsets.len(), 4);
    for (actual, expected) in offsets.into_iter().zip([0, 500, 1500, 3500]) {
        assert_about(actual, Duration::from_millis(expected));
    }

    // a successful connect resets the delay
    let closed_at = Instant::now();
    peer.send(Frame::Close(None));
    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::NO_STATUS
        }
    ));
    let _peer = server.accept().await;
    assert_about(closed_at.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_delay_above_max_keeps_retrying() {
    let _ = pretty_env_logger::try_init();

    let (connector, mut server) = MockConnector::new();
    let base = Url::parse("https://example.social").unwrap();
    let config = ListenerConfig {
        reconnect_delay_start: Duration::from_secs(20),
        reconnect_delay_max: Duration::from_secs(15),
        ..ListenerConfig::default()
    };
    let listener = Listener::with_connector(&base, "secret", config, connector).unwrap();
    let (delegate, mut events) = ChannelDelegate::new();
    let delegate = Arc::new(delegate);
    listener.set_delegate(&delegate);

    server.fail_next(2);
    let start = Instant::now();
    listener.subscribe(StreamSubscription::User);

    for _ in 0..2 {
        assert!(matches!(
            next(&mut events).await,
            ListenerEvent::Disconnected {
                code: close_code::ABNORMAL
            }
        ));
    }
    let _peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    let offsets: Vec<_> = server.attempts().iter().map(|t| *t - start).collect();
    assert_eq!(offsets.len(), 3);
    for (actual, expected) in offsets.into_iter().zip([0, 20, 40]) {
        assert_about(actual, Duration::from_secs(expected));
    }
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_requests_coalesce() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut first = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    listener.reconnect();
    listener.reconnect();
    listener.reconnect();

    let _second = server.accept().await;
    assert_eq!(
        first.from_client.recv().await,
        Some(Frame::Close(Some(close_code::NO_STATUS)))
    );
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(server.attempts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_without_subscription_does_nothing() {
    let (listener, server, _delegate, mut events) = setup();

    listener.reconnect();
    assert_quiet(&mut events, Duration::from_secs(10)).await;
    assert!(server.attempts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_closes_silent_connection() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
    let connected_at = Instant::now();

    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Ping(b"ping".to_vec()))
    );
    assert_about(connected_at.elapsed(), Duration::from_secs(60));

    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::WATCHDOG_TIMEOUT
        }
    ));
    assert_about(connected_at.elapsed(), Duration::from_secs(65));
    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Close(Some(close_code::WATCHDOG_TIMEOUT)))
    );

    // and comes back on its own
    let _again = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_ping_write_is_bounded() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
    let connected_at = Instant::now();

    server.stall_sends(true);

    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::WATCHDOG_TIMEOUT
        }
    ));
    assert_about(connected_at.elapsed(), Duration::from_secs(65));

    // the ping never made it out, only the close did
    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Close(Some(close_code::WATCHDOG_TIMEOUT)))
    );

    // the loop is free again, disconnect cancels the scheduled reconnect
    listener.disconnect();
    assert_quiet(&mut events, Duration::from_secs(30)).await;
    assert_eq!(server.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pong_keeps_connection_alive() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Ping(b"ping".to_vec()))
    );
    peer.send(Frame::Pong(b"ping".to_vec()));

    assert_quiet(&mut events, Duration::from_secs(30)).await;
    assert_eq!(server.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_traffic_keeps_watchdog_quiet() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    for _ in 0..5 {
        time::sleep(Duration::from_secs(50)).await;
        peer.send_text("");
    }

    time::sleep(Duration::from_secs(1)).await;
    assert!(peer.from_client.try_recv().is_err());
    assert!(events.next().now_or_never().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout() {
    let (listener, server, _delegate, mut events) = setup();
    server.hang(true);

    let start = Instant::now();
    listener.subscribe(StreamSubscription::User);

    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::ABNORMAL
        }
    ));
    assert_about(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_and_stays_down() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    listener.disconnect();
    assert!(matches!(
        next(&mut events).await,
        ListenerEvent::Disconnected {
            code: close_code::NORMAL
        }
    ));
    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Close(Some(close_code::NORMAL)))
    );

    assert_quiet(&mut events, Duration::from_secs(30)).await;
    assert_eq!(server.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_connect() {
    let (listener, server, _delegate, mut events) = setup();
    server.hang(true);

    listener.subscribe(StreamSubscription::User);
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(server.attempts().len(), 1);

    listener.disconnect();

    // the connect timeout would have reported a failure by now
    assert_quiet(&mut events, Duration::from_secs(30)).await;
    assert_eq!(server.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resubscribe_replaces_connection() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut first = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    listener.subscribe(StreamSubscription::Public);
    let second = server.accept().await;
    assert_eq!(
        first.from_client.recv().await,
        Some(Frame::Close(Some(close_code::NO_STATUS)))
    );
    assert!(second.url.as_str().ends_with("stream=public"));

    // replacing a socket is not reported as a disconnect
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_closes_socket() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let mut peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    drop(listener);

    assert_eq!(
        peer.from_client.recv().await,
        Some(Frame::Close(Some(close_code::NORMAL)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_removed_delegate_gets_nothing() {
    let (listener, mut server, _delegate, mut events) = setup();
    listener.subscribe(StreamSubscription::User);
    let peer = server.accept().await;
    assert!(matches!(next(&mut events).await, ListenerEvent::Connected));

    listener.remove_delegate();
    peer.send_text(r#"{"event":"delete","payload":"1"}"#);

    assert_quiet(&mut events, Duration::from_secs(1)).await;
}
