//! Node message loops, in memory and over loopback TCP.
//!
//! 1. **Delivery**: console lines arrive as output lines, in order, with
//!    empty lines skipped
//! 2. **Resilience**: a rejected message is logged and skipped, later
//!    messages still arrive
//! 3. **Termination**: the receiver stops when the sender closes the link,
//!    the sender stops when the receiver is gone
//! 4. **TCP**: a listening and a connecting node agree over a real socket

use std::{
    io::Cursor,
    net::{TcpListener, TcpStream},
    thread,
    time::Duration,
};

use sealink_core::{HandshakeError, IoError, ProtocolConfig, Role, SessionError};
use sealink_harness::{
    MemoryLink, SIM_IO_TIMEOUT, Tamper, establish, establish_pair, sim_config, sim_peer,
};
use sealink_node::{NodeError, receive_lines, secure_session, send_lines};

#[test]
fn console_lines_become_output_lines() {
    let (a, b) = establish_pair(1, 2).unwrap();
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    let sent = send_lines(&mut alice, Cursor::new("hello\n\n\r\nworld\r\n")).unwrap();
    assert_eq!(sent, 2);
    drop(alice);

    let mut output = Vec::new();
    let received = receive_lines(&mut bob, &mut output).unwrap();

    assert_eq!(received, 2);
    assert_eq!(String::from_utf8(output).unwrap(), "hello\nworld\n");
}

#[test]
fn long_line_is_delivered_truncated() {
    let (a, b) = establish_pair(3, 4).unwrap();
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    let line = format!("{}\n", "z".repeat(200));
    send_lines(&mut alice, Cursor::new(line)).unwrap();
    drop(alice);

    let mut output = Vec::new();
    receive_lines(&mut bob, &mut output).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), format!("{}\n", "z".repeat(127)));
}

#[test]
fn rejected_message_is_skipped() {
    let (a, b) = MemoryLink::pair(SIM_IO_TIMEOUT);
    let initiator = sim_peer(5, sim_config(Role::Initiator), a).unwrap();
    // Frame 5 at the responder is the first message's ciphertext.
    let b = Tamper::new(b).flip(5, 0, 0x01);
    let responder = sim_peer(6, sim_config(Role::Responder), b).unwrap();
    let (a, b) = establish(initiator, responder);
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    send_lines(&mut alice, Cursor::new("lost\nkept\n")).unwrap();
    drop(alice);

    let mut output = Vec::new();
    let received = receive_lines(&mut bob, &mut output).unwrap();

    assert_eq!(received, 1);
    assert_eq!(String::from_utf8(output).unwrap(), "kept\n");
}

#[test]
fn sender_stops_when_receiver_is_gone() {
    let (a, b) = establish_pair(7, 8).unwrap();
    let mut alice = a.unwrap();
    drop(b);

    let err = send_lines(&mut alice, Cursor::new("anyone there?\n")).unwrap_err();

    let NodeError::Session(err) = err else {
        unreachable!("expected a session error, got {err:?}");
    };
    assert!(err.is_link_closed());
    assert_eq!(alice.messages_sent(), 0);
}

#[test]
fn unreachable_device_drops_one_message() {
    let (a, b) = establish_pair(9, 10).unwrap();
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    alice.peer_mut().element_mut().set_online(false);
    assert_eq!(send_lines(&mut alice, Cursor::new("first\n")).unwrap(), 0);
    alice.peer_mut().element_mut().set_online(true);
    assert_eq!(send_lines(&mut alice, Cursor::new("second\n")).unwrap(), 1);
    drop(alice);

    let mut output = Vec::new();
    receive_lines(&mut bob, &mut output).unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "second\n");
}

#[test]
fn idle_link_is_not_an_error() {
    let (a, b) = establish_pair(11, 12).unwrap();
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    let receiver = thread::spawn(move || {
        let mut output = Vec::new();
        let result = receive_lines(&mut bob, &mut output);
        (result.map_err(|e| e.to_string()), output)
    });

    // Stay silent past one receive timeout before sending.
    #[allow(clippy::disallowed_methods)]
    thread::sleep(SIM_IO_TIMEOUT + Duration::from_millis(100));
    send_lines(&mut alice, Cursor::new("late\n")).unwrap();
    drop(alice);

    let (result, output) = receiver.join().unwrap();
    assert_eq!(result, Ok(1));
    assert_eq!(output, b"late\n");
}

#[test]
fn nodes_talk_over_loopback_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let config = |role| ProtocolConfig {
        io_timeout: Duration::from_secs(2),
        ..ProtocolConfig::for_role(role)
    };

    let responder = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut messenger = secure_session(stream, config(Role::Responder)).unwrap();
        let mut output = Vec::new();
        let received = receive_lines(&mut messenger, &mut output).unwrap();
        (received, *messenger.peer_key().as_raw(), output)
    });

    let stream = TcpStream::connect(addr).unwrap();
    let mut messenger = secure_session(stream, config(Role::Initiator)).unwrap();
    let initiator_key = *messenger.peer().identity().public_key();
    let sent = send_lines(&mut messenger, Cursor::new("over tcp\nsecond line\n")).unwrap();
    drop(messenger);

    let (received, seen_key, output) = responder.join().unwrap();
    assert_eq!(sent, 2);
    assert_eq!(received, 2);
    assert_eq!(seen_key, initiator_key);
    assert_eq!(String::from_utf8(output).unwrap(), "over tcp\nsecond line\n");
}

#[test]
fn tcp_handshake_without_peer_gives_up() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept, then say nothing.
    let silent = thread::spawn(move || listener.accept().map(|(stream, _)| stream));

    let stream = TcpStream::connect(addr).unwrap();
    let config = ProtocolConfig {
        io_timeout: Duration::from_millis(100),
        max_attempts: 2,
        retry_backoff: Duration::from_millis(10),
        ..ProtocolConfig::for_role(Role::Initiator)
    };
    let err = secure_session(stream, config).err().unwrap();
    let _held = silent.join().unwrap().unwrap();

    let NodeError::Handshake(HandshakeError::RetriesExhausted { attempts, last }) = err else {
        unreachable!("expected RetriesExhausted, got {err:?}");
    };
    assert_eq!(attempts, 2);
    assert_eq!(last.source, SessionError::Io(IoError::Timeout));
}
