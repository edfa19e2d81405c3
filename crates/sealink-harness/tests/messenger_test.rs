//! Encrypted messaging over an established session.
//!
//! 1. **Delivery**: a message sent by one side is returned byte-exact by the
//!    other, in both directions
//! 2. **IV freshness**: no IV repeats within a session, and a stuck entropy
//!    source is caught before anything is encrypted
//! 3. **Integrity**: a corrupted tag, ciphertext or signature is rejected and
//!    the session stays usable
//! 4. **Bounds**: empty and oversized messages fail without touching the link

use std::collections::HashSet;

use sealink_core::{AuthenticationError, HandshakeState, Role, SessionError};
use sealink_crypto::CryptoError;
use sealink_harness::{
    MemoryLink, SIM_IO_TIMEOUT, SimMessenger, Tamper, establish, establish_pair, sim_config,
    sim_peer,
};
use sealink_proto::{FrameError, MAX_PLAINTEXT_SIZE};

fn session(seed: u64) -> (SimMessenger, SimMessenger) {
    let (a, b) = establish_pair(seed, seed + 1).unwrap();
    (a.unwrap(), b.unwrap())
}

/// Session whose responder sees incoming frame `frame_index` with byte
/// `offset` flipped.
///
/// The responder receives three handshake frames first, so the first
/// message occupies frames 3 (IV), 4 (tag), 5 (ciphertext), 6 (signature).
fn tampered_session(
    seed: u64,
    frame_index: usize,
    offset: usize,
) -> (SimMessenger, SimMessenger<Tamper<MemoryLink>>) {
    let (a, b) = MemoryLink::pair(SIM_IO_TIMEOUT);
    let initiator = sim_peer(seed, sim_config(Role::Initiator), a).unwrap();
    let b = Tamper::new(b).flip(frame_index, offset, 0x01);
    let responder = sim_peer(seed + 1, sim_config(Role::Responder), b).unwrap();

    let (a, b) = establish(initiator, responder);
    (a.unwrap(), b.unwrap())
}

#[test]
fn hello_is_delivered_byte_exact() {
    let (mut alice, mut bob) = session(1);

    let sent = alice.send(b"hello").unwrap();
    let received = bob.receive().unwrap();

    assert_eq!(received, vec![0x68, 0x65, 0x6c, 0x6c, 0x6f]);
    assert_eq!(sent.ciphertext.len(), 5);
    assert_ne!(sent.ciphertext.as_bytes(), b"hello");
    assert_eq!(sent.wire_len(), 12 + 16 + 5 + 64);
}

#[test]
fn messages_flow_both_ways() {
    let (mut alice, mut bob) = session(3);

    alice.send(b"ping").unwrap();
    assert_eq!(bob.receive().unwrap(), b"ping");

    bob.send(b"pong").unwrap();
    assert_eq!(alice.receive().unwrap(), b"pong");

    assert_eq!(alice.messages_sent(), 1);
    assert_eq!(alice.messages_received(), 1);
    assert_eq!(alice.peer_key().as_raw(), bob.peer().identity().public_key());
}

#[test]
fn each_message_is_four_frames() {
    let (mut alice, _bob) = session(5);
    let before = alice.peer().transport().frames_sent();

    alice.send(b"x").unwrap();

    assert_eq!(alice.peer().transport().frames_sent() - before, 4);
}

#[test]
fn largest_message_fits() {
    let (mut alice, mut bob) = session(7);
    let message = vec![0xA5; MAX_PLAINTEXT_SIZE];

    alice.send(&message).unwrap();

    assert_eq!(bob.receive().unwrap(), message);
}

#[test]
fn ivs_never_repeat_within_a_session() {
    let (mut alice, mut bob) = session(9);
    let mut ivs = HashSet::new();

    for i in 0..200u32 {
        let payload = i.to_be_bytes();
        let sent = alice.send(&payload).unwrap();
        assert!(ivs.insert(sent.iv), "IV repeated at message {i}");
        assert_eq!(bob.receive().unwrap(), payload);
    }
}

#[test]
fn stuck_entropy_source_is_refused() {
    let (mut alice, mut bob) = session(11);
    alice.peer().env().freeze_random(0x00);

    // The first draw is new to the session, the second repeats it.
    alice.send(b"first").unwrap();
    let before = alice.peer().transport().frames_sent();
    let err = alice.send(b"second").unwrap_err();

    assert_eq!(err, SessionError::Crypto(CryptoError::IvReuse));
    assert_eq!(alice.peer().transport().frames_sent(), before);
    assert_eq!(bob.receive().unwrap(), b"first");

    alice.peer().env().unfreeze_random();
    alice.send(b"third").unwrap();
    assert_eq!(bob.receive().unwrap(), b"third");
}

#[test]
fn replayed_message_is_rejected() {
    let (mut alice, mut bob) = session(13);

    let sealed = alice.seal(b"pay 10").unwrap();
    alice.transmit(&sealed).unwrap();
    alice.transmit(&sealed).unwrap();

    assert_eq!(bob.receive().unwrap(), b"pay 10");
    assert_eq!(
        bob.receive().unwrap_err(),
        SessionError::Authentication(AuthenticationError::Replay)
    );
    assert_eq!(bob.messages_received(), 1);
}

#[test]
fn corrupted_tag_is_rejected_and_session_survives() {
    let (mut alice, mut bob) = tampered_session(20, 4, 0);

    alice.send(b"first").unwrap();
    assert_eq!(bob.receive().unwrap_err(), SessionError::Crypto(CryptoError::DecryptionFailed));

    alice.send(b"second").unwrap();
    assert_eq!(bob.receive().unwrap(), b"second");
}

#[test]
fn corrupted_ciphertext_is_rejected() {
    let (mut alice, mut bob) = tampered_session(22, 5, 0);

    alice.send(b"attack at dawn").unwrap();

    assert_eq!(bob.receive().unwrap_err(), SessionError::Crypto(CryptoError::DecryptionFailed));
}

#[test]
fn corrupted_signature_withholds_plaintext() {
    let (mut alice, mut bob) = tampered_session(24, 6, 3);

    alice.send(b"signed").unwrap();

    assert_eq!(
        bob.receive().unwrap_err(),
        SessionError::Authentication(AuthenticationError::SignatureMismatch)
    );
    assert_eq!(bob.messages_received(), 0);
}

#[test]
fn out_of_bounds_messages_never_reach_the_link() {
    let (mut alice, mut bob) = session(30);
    let before = alice.peer().transport().frames_sent();

    assert_eq!(alice.send(b"").unwrap_err(), SessionError::Frame(FrameError::EmptyPayload));
    assert_eq!(
        alice.send(&[0u8; MAX_PLAINTEXT_SIZE + 1]).unwrap_err(),
        SessionError::Frame(FrameError::PayloadTooLarge { size: 128, max: 127 })
    );
    assert_eq!(alice.peer().transport().frames_sent(), before);

    alice.send(b"still fine").unwrap();
    assert_eq!(bob.receive().unwrap(), b"still fine");
}

#[test]
fn unreachable_device_fails_one_message() {
    let (mut alice, mut bob) = session(32);

    alice.peer_mut().element_mut().set_online(false);
    assert!(matches!(alice.send(b"lost"), Err(SessionError::Device(_))));

    alice.peer_mut().element_mut().set_online(true);
    alice.send(b"found").unwrap();
    assert_eq!(bob.receive().unwrap(), b"found");
}

#[test]
fn closed_link_is_reported() {
    let (mut alice, bob) = session(34);
    drop(bob);

    let err = alice.receive().unwrap_err();
    assert!(err.is_link_closed());
}

#[test]
fn session_can_be_rekeyed() {
    let (alice, bob) = session(40);
    let (alice, bob) = (alice.into_peer(), bob.into_peer());
    assert_eq!(alice.handshake_state(), HandshakeState::Idle);

    let (a, b) = establish(alice, bob);
    let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

    alice.send(b"after rekey").unwrap();
    assert_eq!(bob.receive().unwrap(), b"after rekey");
}
