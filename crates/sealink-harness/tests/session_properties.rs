//! Property-based tests over whole sessions.
//!
//! 1. **Key agreement**: for any pair of seeds both peers derive the same
//!    session key
//! 2. **Delivery**: any message of 1..=127 bytes arrives unchanged

use std::thread;

use proptest::prelude::*;
use sealink_harness::{establish_pair, linked_pair};
use sealink_proto::MAX_PLAINTEXT_SIZE;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_both_peers_derive_the_same_key(seed_a in any::<u64>(), seed_b in any::<u64>()) {
        prop_assume!(seed_a != seed_b);
        let (mut initiator, mut responder) = linked_pair(seed_a, seed_b).unwrap();

        let (a, b) = thread::scope(|scope| {
            let a = scope.spawn(|| initiator.handshake());
            let b = scope.spawn(|| responder.handshake());
            (a.join().unwrap(), b.join().unwrap())
        });
        let (a, b) = (a.unwrap(), b.unwrap());

        // PROPERTY: shared secret symmetry carries through to the session key
        prop_assert_eq!(a.session_key(), b.session_key());
        prop_assert_eq!(a.peer_key().as_raw(), responder.identity().public_key());
    }

    #[test]
    fn prop_any_valid_message_roundtrips(
        seed in any::<u32>(),
        messages in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 1..=MAX_PLAINTEXT_SIZE),
            1..8,
        ),
    ) {
        let seed = u64::from(seed);
        let (a, b) = establish_pair(seed, seed + 1).unwrap();
        let (mut alice, mut bob) = (a.unwrap(), b.unwrap());

        for message in &messages {
            alice.send(message).unwrap();

            // PROPERTY: the receiver returns exactly what was sent
            prop_assert_eq!(&bob.receive().unwrap(), message);
        }
    }
}
