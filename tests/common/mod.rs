//! Scripted GazeFlow stand-in for integration tests.

#![allow(dead_code)]

use focusflow::protocol::{encode_length_prefixed_string, GazeSample};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the fake tracker does once it has sent its payloads.
#[derive(Debug, Clone, Copy)]
pub enum AfterScript {
    /// Close the connection right away
    Close,
    /// Keep the connection open until the client goes away or the timeout passes
    HoldOpen(Duration),
}

pub struct Script {
    pub status: String,
    pub payloads: Vec<Vec<u8>>,
    /// Pause between payloads
    pub pacing: Duration,
    pub after: AfterScript,
}

impl Script {
    pub fn accepting(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            status: "ok".to_string(),
            payloads,
            pacing: Duration::ZERO,
            after: AfterScript::Close,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn hold_open(mut self, timeout: Duration) -> Self {
        self.after = AfterScript::HoldOpen(timeout);
        self
    }
}

pub struct FakeTracker {
    pub port: u16,
    handle: JoinHandle<Vec<u8>>,
}

impl FakeTracker {
    /// Bind a loopback port and serve `script` to the first client.
    pub fn spawn(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream, script)
        });
        Self { port, handle }
    }

    /// Wait for the session to end and return the handshake bytes received.
    pub fn handshake_bytes(self) -> Vec<u8> {
        self.handle.join().unwrap()
    }
}

fn serve(mut stream: TcpStream, script: Script) -> Vec<u8> {
    let mut received = vec![0u8; 3];
    stream.read_exact(&mut received).unwrap();

    // Varint length, recorded byte for byte
    let mut len: u64 = 0;
    let mut shift = 0;
    loop {
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte).unwrap();
        received.push(byte[0]);
        len |= u64::from(byte[0] & 0x7F) << shift;
        shift += 7;
        if byte[0] & 0x80 == 0 {
            break;
        }
    }
    let mut key = vec![0u8; len as usize];
    stream.read_exact(&mut key).unwrap();
    received.extend_from_slice(&key);

    let mut outgoing = Vec::new();
    if !script.status.is_empty() {
        outgoing.push(encode_length_prefixed_string(&script.status));
    }
    outgoing.extend(script.payloads);

    for payload in outgoing {
        if stream.write_all(&payload).is_err() {
            return received;
        }
        if !script.pacing.is_zero() {
            thread::sleep(script.pacing);
        }
    }

    if let AfterScript::HoldOpen(timeout) = script.after {
        let _ = stream.set_read_timeout(Some(timeout));
        let mut sink = [0u8; 64];
        while let Ok(n) = stream.read(&mut sink) {
            if n == 0 {
                break;
            }
        }
    }

    received
}

pub fn sample_payload(x: f64, y: f64) -> Vec<u8> {
    encode_length_prefixed_string(&GazeSample::new(x, y).to_xml())
}

pub fn text_payload(text: &str) -> Vec<u8> {
    encode_length_prefixed_string(text)
}
