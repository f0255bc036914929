//! Integration tests for the GazeFlow client against a loopback tracker.

mod common;

use common::{sample_payload, text_payload, FakeTracker, Script};
use focusflow::error::{ConnectionError, Error, ProtocolError, StateError};
use focusflow::protocol::{encode_varint, ClientConfig, ClientState, GazeSessionClient};
use std::thread;
use std::time::{Duration, Instant};

fn connect(tracker: &FakeTracker, key: &str) -> (GazeSessionClient, focusflow::Result<()>) {
    let mut client = GazeSessionClient::new(ClientConfig {
        connect_timeout: Some(Duration::from_secs(2)),
        read_timeout: Some(Duration::from_secs(5)),
    });
    let result = client.connect("127.0.0.1", tracker.port, key);
    (client, result)
}

#[test]
fn test_handshake_bytes_are_exact() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();
    assert_eq!(client.state(), ClientState::Streaming);
    client.disconnect();

    let mut expected = b"xml".to_vec();
    expected.push(10);
    expected.extend_from_slice(b"AppKeyDemo");
    assert_eq!(tracker.handshake_bytes(), expected);
}

#[test]
fn test_long_key_uses_multi_byte_prefix() {
    let key = "k".repeat(300);
    let tracker = FakeTracker::spawn(Script::accepting(vec![]));
    let (mut client, result) = connect(&tracker, &key);
    result.unwrap();
    client.disconnect();

    let mut expected = b"xml".to_vec();
    expected.extend_from_slice(&encode_varint(300));
    expected.extend_from_slice(key.as_bytes());
    assert_eq!(&expected[3..5], &[0xAC, 0x02]);
    assert_eq!(tracker.handshake_bytes(), expected);
}

#[test]
fn test_ok_prefix_with_details_is_accepted() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]).with_status("ok,reason=x"));
    let (client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();
    assert!(client.is_connected());
    assert!(client.peer_addr().is_some());
}

#[test]
fn test_rejection_carries_reason() {
    let tracker =
        FakeTracker::spawn(Script::accepting(vec![]).with_status("error: invalid app key"));
    let (client, result) = connect(&tracker, "WrongKey");

    match result {
        Err(Error::Connection(ConnectionError::ConnectionRejected { reason })) => {
            assert_eq!(reason, "error: invalid app key");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[test]
fn test_close_before_status_fails_handshake() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]).with_status(""));
    let (client, result) = connect(&tracker, "AppKeyDemo");

    assert!(matches!(
        result,
        Err(Error::Protocol(ProtocolError::StreamClosed))
    ));
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[test]
fn test_samples_arrive_in_order_then_connection_lost() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![
        sample_payload(10.0, 20.0),
        sample_payload(-5.5, 1e3),
        sample_payload(0.25, 0.0),
    ]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    let first = client.receive_sample().unwrap();
    assert_eq!((first.x, first.y), (10.0, 20.0));
    let second = client.receive_sample().unwrap();
    assert_eq!((second.x, second.y), (-5.5, 1000.0));
    let third = client.receive_sample().unwrap();
    assert_eq!((third.x, third.y), (0.25, 0.0));

    assert!(matches!(
        client.receive_sample(),
        Err(Error::Connection(ConnectionError::ConnectionLost))
    ));
    assert_eq!(client.state(), ClientState::Disconnected);

    assert!(matches!(
        client.receive_sample(),
        Err(Error::State(StateError::NotConnected))
    ));
}

#[test]
fn test_malformed_sample_is_not_fatal() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![
        sample_payload(1.0, 2.0),
        text_payload("<GazeData><GazeX>abc</GazeX><GazeY>1</GazeY></GazeData>"),
        text_payload("<GazeData><GazeY>1</GazeY></GazeData>"),
        sample_payload(3.0, 4.0),
    ]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    assert!(client.receive_sample().is_ok());

    let err = client.receive_sample().unwrap_err();
    assert!(err.is_recoverable());
    assert!(client.is_connected());

    assert!(matches!(client.receive_sample(), Err(Error::Sample(_))));

    let sample = client.receive_sample().unwrap();
    assert_eq!((sample.x, sample.y), (3.0, 4.0));
}

#[test]
fn test_non_utf8_payload_is_not_fatal() {
    let mut garbled = encode_varint(2);
    garbled.extend_from_slice(&[0xC3, 0x28]);
    let tracker = FakeTracker::spawn(Script::accepting(vec![garbled, sample_payload(5.0, 6.0)]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    let err = client.receive_sample().unwrap_err();
    assert!(matches!(err, Error::Sample(_)));
    assert!(err.is_recoverable());
    assert_eq!(client.state(), ClientState::Streaming);

    let sample = client.receive_sample().unwrap();
    assert_eq!((sample.x, sample.y), (5.0, 6.0));
}

#[test]
fn test_oversized_length_prefix_loses_connection() {
    let mut bogus = encode_varint(1 << 62);
    bogus.extend_from_slice(b"<Gaz");
    let tracker = FakeTracker::spawn(Script::accepting(vec![bogus]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    assert!(matches!(
        client.receive_sample(),
        Err(Error::Connection(ConnectionError::ConnectionLost))
    ));
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[test]
fn test_read_timeout_while_streaming_loses_connection() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]).hold_open(Duration::from_secs(5)));
    let mut client = GazeSessionClient::new(ClientConfig {
        connect_timeout: Some(Duration::from_secs(2)),
        read_timeout: Some(Duration::from_millis(100)),
    });
    client.connect("127.0.0.1", tracker.port, "AppKeyDemo").unwrap();

    let started = Instant::now();
    let err = client.receive_sample().unwrap_err();
    assert!(err.is_connection_lost());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(client.state(), ClientState::Disconnected);

    tracker.handshake_bytes();
}

#[test]
fn test_empty_payload_ends_connection() {
    let tracker = FakeTracker::spawn(
        Script::accepting(vec![text_payload("")]).hold_open(Duration::from_secs(5)),
    );
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    let err = client.receive_sample().unwrap_err();
    assert!(err.is_connection_lost());
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[test]
fn test_connect_twice_is_rejected_and_disconnect_is_idempotent() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    assert!(matches!(
        client.connect("127.0.0.1", tracker.port, "AppKeyDemo"),
        Err(Error::State(StateError::AlreadyConnected))
    ));
    assert!(client.is_connected());

    client.disconnect();
    client.disconnect();
    assert_eq!(client.state(), ClientState::Disconnected);
}

#[test]
fn test_shutdown_handle_unblocks_pending_read() {
    let tracker = FakeTracker::spawn(Script::accepting(vec![]).hold_open(Duration::from_secs(10)));
    let (mut client, result) = connect(&tracker, "AppKeyDemo");
    result.unwrap();

    let handle = client.shutdown_handle();
    let reader = thread::spawn(move || {
        let started = Instant::now();
        let outcome = client.receive_sample();
        (outcome, started.elapsed(), client.state())
    });

    thread::sleep(Duration::from_millis(100));
    handle.shutdown();

    let (outcome, waited, state) = reader.join().unwrap();
    assert!(matches!(
        outcome,
        Err(Error::Connection(ConnectionError::ConnectionLost))
    ));
    assert!(waited < Duration::from_secs(3));
    assert_eq!(state, ClientState::Disconnected);
}

#[test]
fn test_unreachable_tracker() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = GazeSessionClient::default();
    assert!(matches!(
        client.connect("127.0.0.1", port, "AppKeyDemo"),
        Err(Error::Protocol(ProtocolError::Io(_)))
    ));
    assert_eq!(client.state(), ClientState::Disconnected);
}
