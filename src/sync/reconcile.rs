//! Merging a fresh remote listing into the local subscription table.
//!
//! Works much like a git merge: the local table is the source of truth for
//! pending subscribes and unsubscribes, the remote listing is the source of
//! truth for everything else.

use std::collections::HashSet;

use crate::domain::{PendingState, Subscription};

/// Produce the new canonical local set from the current local rows and the
/// names Reddit just reported.
///
/// Local rows come first in their original order, followed by names only the
/// remote knows about, deduplicated and in remote order.
pub fn merge_remote_with_local(local: &[Subscription], remote_names: &[String]) -> Vec<Subscription> {
    let remote: HashSet<&str> = remote_names.iter().map(String::as_str).collect();
    let mut merged = Vec::with_capacity(local.len().max(remote.len()));

    for sub in local {
        let on_remote = remote.contains(sub.name.as_str());

        match (sub.pending_state, on_remote) {
            // Unsubscribe hasn't landed yet, so remote still lists it.
            (PendingState::PendingUnsubscribe, true) => merged.push(sub.clone()),
            // Remote confirms an earlier subscribe.
            (PendingState::PendingSubscribe, true) => {
                merged.push(sub.with_pending_state(PendingState::None))
            }
            (PendingState::None, true) => merged.push(sub.clone()),
            // Subscribe call hasn't been made yet.
            (PendingState::PendingSubscribe, false) => merged.push(sub.clone()),
            // Removed on remote.
            (PendingState::None, false) | (PendingState::PendingUnsubscribe, false) => {}
        }
    }

    let mut known: HashSet<&str> = local.iter().map(|s| s.name.as_str()).collect();
    for name in remote_names {
        if known.insert(name.as_str()) {
            merged.push(Subscription::confirmed(name.clone()));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sub(name: &str, state: PendingState) -> Subscription {
        Subscription::new(name, state, false)
    }

    fn sorted(mut subs: Vec<Subscription>) -> Vec<Subscription> {
        subs.sort_by(|a, b| a.name.cmp(&b.name));
        subs
    }

    #[test]
    fn test_confirms_pending_subscribe() {
        let merged = merge_remote_with_local(
            &[sub("aww", PendingState::PendingSubscribe)],
            &remote(&["aww"]),
        );
        assert_eq!(merged, vec![sub("aww", PendingState::None)]);
    }

    #[test]
    fn test_keeps_pending_unsubscribe_listed_on_remote() {
        let merged = merge_remote_with_local(
            &[sub("aww", PendingState::PendingUnsubscribe)],
            &remote(&["aww"]),
        );
        assert_eq!(merged, vec![sub("aww", PendingState::PendingUnsubscribe)]);
    }

    #[test]
    fn test_drops_sub_removed_on_remote() {
        let merged = merge_remote_with_local(&[sub("aww", PendingState::None)], &[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_drops_pending_unsubscribe_gone_from_remote() {
        let merged =
            merge_remote_with_local(&[sub("aww", PendingState::PendingUnsubscribe)], &[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_keeps_optimistic_pending_subscribe() {
        let merged =
            merge_remote_with_local(&[sub("newsub", PendingState::PendingSubscribe)], &[]);
        assert_eq!(merged, vec![sub("newsub", PendingState::PendingSubscribe)]);
    }

    #[test]
    fn test_adds_remote_only_subs() {
        let merged = merge_remote_with_local(&[], &remote(&["funny", "pics"]));
        assert_eq!(
            merged,
            vec![
                Subscription::confirmed("funny"),
                Subscription::confirmed("pics")
            ]
        );
    }

    #[test]
    fn test_duplicate_remote_names_emitted_once() {
        let merged = merge_remote_with_local(
            &[sub("aww", PendingState::None)],
            &remote(&["pics", "aww", "pics", "aww"]),
        );
        assert_eq!(
            merged,
            vec![sub("aww", PendingState::None), Subscription::confirmed("pics")]
        );
    }

    #[test]
    fn test_preserves_hidden_flag() {
        let local = vec![
            Subscription::new("aww", PendingState::None, true),
            Subscription::new("pics", PendingState::PendingSubscribe, true),
        ];
        let merged = merge_remote_with_local(&local, &remote(&["aww", "pics"]));
        assert!(merged.iter().all(|s| s.hidden));
        assert!(merged.iter().all(|s| s.pending_state == PendingState::None));
    }

    #[test]
    fn test_key_lookup_is_case_sensitive() {
        let merged = merge_remote_with_local(&[sub("Pics", PendingState::None)], &remote(&["pics"]));
        assert_eq!(merged, vec![Subscription::confirmed("pics")]);
    }

    #[test]
    fn test_merge_is_a_fixed_point() {
        let cases: Vec<(Vec<Subscription>, Vec<String>)> = vec![
            (vec![], remote(&["a", "b"])),
            (
                vec![
                    sub("a", PendingState::PendingSubscribe),
                    sub("b", PendingState::PendingUnsubscribe),
                    sub("c", PendingState::None),
                    sub("d", PendingState::PendingSubscribe),
                    Subscription::new("e", PendingState::None, true),
                ],
                remote(&["a", "b", "e", "f", "f"]),
            ),
            (vec![sub("x", PendingState::None)], vec![]),
        ];

        for (local, names) in cases {
            let once = merge_remote_with_local(&local, &names);
            let twice = merge_remote_with_local(&once, &names);
            assert_eq!(sorted(once), sorted(twice));
        }
    }

    #[test]
    fn test_mixed_merge() {
        let local = vec![
            sub("a", PendingState::PendingSubscribe),
            sub("b", PendingState::PendingUnsubscribe),
            sub("c", PendingState::None),
            sub("d", PendingState::PendingSubscribe),
            sub("e", PendingState::None),
        ];
        let merged = merge_remote_with_local(&local, &remote(&["a", "b", "e", "f"]));

        assert_eq!(
            merged,
            vec![
                sub("a", PendingState::None),
                sub("b", PendingState::PendingUnsubscribe),
                sub("d", PendingState::PendingSubscribe),
                sub("e", PendingState::None),
                sub("f", PendingState::None),
            ]
        );
    }
}
