//! Property-based tests for the session register.
//!
//! - Exactly the first action of each session is new
//! - The store holds one claim per distinct session

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use super::*;

/// Strategy for a stream of actions drawn from a small pool of sessions,
/// so repeats are common.
fn action_stream() -> impl Strategy<Value = Vec<(u8, bool)>> {
    prop::collection::vec((0u8..12, any::<bool>()), 1..60)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Only the first occurrence of each session id is reported as new.
    #[test]
    fn prop_only_first_action_is_new(actions in action_stream()) {
        let store = Arc::new(InMemoryClaimStore::new());
        let register = SessionRegister::new(store.clone());

        let results: Vec<bool> = runtime().block_on(async {
            let mut results = Vec::with_capacity(actions.len());
            for (session, is_scan) in &actions {
                let key = SessionKey::parse(&format!("session-{session}")).unwrap();
                let action = if *is_scan { ActionKind::QrScan } else { ActionKind::SocialClick };
                results.push(register.claim(&key, action, ClaimContext::default()).await);
            }
            results
        });

        let mut seen = HashSet::new();
        for ((session, _), is_new) in actions.iter().zip(&results) {
            prop_assert_eq!(*is_new, seen.insert(*session));
        }
        prop_assert_eq!(store.len(), seen.len());
    }

    /// A cached register gives the same answers as an uncached one.
    #[test]
    fn prop_cache_is_transparent(actions in action_stream()) {
        let plain = SessionRegister::new(Arc::new(InMemoryClaimStore::new()));
        let cached = SessionRegister::new(Arc::new(InMemoryClaimStore::new()))
            .with_cache(KnownSessionCache::new());

        let (left, right) = runtime().block_on(async {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for (session, _) in &actions {
                let key = SessionKey::parse(&format!("session-{session}")).unwrap();
                left.push(plain.claim(&key, ActionKind::QrScan, ClaimContext::default()).await);
                right.push(cached.claim(&key, ActionKind::QrScan, ClaimContext::default()).await);
            }
            (left, right)
        });

        prop_assert_eq!(left, right);
    }
}
