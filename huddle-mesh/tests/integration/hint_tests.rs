use crate::utils::{bed, hint, snapshot};
use huddle_core::{ParticipantId, SignalMessage};

#[tokio::test]
async fn hints_queue_until_remote_description_then_drain_in_order() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    let link = bed.links.last_link(&b).unwrap();

    for n in 1..=3 {
        bed.engine
            .handle_signal(SignalMessage::Hint {
                peer: b.clone(),
                payload: hint(n),
            })
            .await;
    }
    assert!(link.applied_hints().is_empty());
    assert_eq!(bed.engine.registry().get(&b).unwrap().pending_hints.len(), 3);

    bed.engine
        .handle_signal(SignalMessage::Answer {
            peer: b.clone(),
            sdp: "v=0 answer".to_string(),
        })
        .await;

    let applied: Vec<String> = link
        .applied_hints()
        .into_iter()
        .map(|h| h.candidate)
        .collect();
    assert_eq!(applied, vec!["candidate:1", "candidate:2", "candidate:3"]);
    assert!(bed.engine.registry().get(&b).unwrap().pending_hints.is_empty());
}

#[tokio::test]
async fn hints_apply_immediately_once_stable() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    bed.engine
        .handle_signal(SignalMessage::Answer {
            peer: b.clone(),
            sdp: "v=0 answer".to_string(),
        })
        .await;

    bed.engine
        .handle_signal(SignalMessage::Hint {
            peer: b.clone(),
            payload: hint(7),
        })
        .await;

    let link = bed.links.last_link(&b).unwrap();
    assert_eq!(link.applied_hints().len(), 1);
    assert!(bed.engine.registry().get(&b).unwrap().pending_hints.is_empty());
}

#[tokio::test]
async fn inbound_offer_session_applies_hints_directly() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    // Accepting the offer applies the remote description, so later hints
    // never touch the queue.
    bed.engine
        .handle_signal(SignalMessage::Offer {
            peer: b.clone(),
            sdp: "v=0 offer".to_string(),
        })
        .await;
    bed.engine
        .handle_signal(SignalMessage::Hint {
            peer: b.clone(),
            payload: hint(1),
        })
        .await;

    let link = bed.links.last_link(&b).unwrap();
    assert_eq!(link.applied_hints().len(), 1);
    assert!(bed.engine.registry().get(&b).unwrap().pending_hints.is_empty());
}

#[tokio::test]
async fn hint_for_unknown_participant_is_dropped() {
    let mut bed = bed("a").await;

    bed.engine
        .handle_signal(SignalMessage::Hint {
            peer: ParticipantId::from("ghost"),
            payload: hint(1),
        })
        .await;

    assert!(bed.engine.registry().is_empty());
    assert_eq!(bed.links.total_built(), 0);
}

#[tokio::test]
async fn teardown_discards_queued_hints() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    bed.engine
        .handle_signal(SignalMessage::Hint {
            peer: b.clone(),
            payload: hint(1),
        })
        .await;

    bed.engine.handle_signal(snapshot(&["a"])).await;
    assert!(!bed.engine.registry().contains(&b));

    // A straggler hint after teardown is an anomaly, not a revival.
    bed.engine
        .handle_signal(SignalMessage::Hint {
            peer: b.clone(),
            payload: hint(2),
        })
        .await;
    assert!(!bed.engine.registry().contains(&b));
    assert_eq!(bed.links.build_count(&b), 1);
}
