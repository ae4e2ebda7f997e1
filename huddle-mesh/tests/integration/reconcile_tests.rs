use crate::utils::{bed, bed_unwelcomed, participant, snapshot};
use huddle_core::{ParticipantId, SignalMessage};
use std::collections::HashSet;

#[tokio::test]
async fn snapshot_creates_one_session_and_offer_per_remote() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    let c = ParticipantId::from("c");

    bed.engine.handle_signal(snapshot(&["a", "b", "c"])).await;

    assert!(bed.engine.registry().contains(&b));
    assert!(bed.engine.registry().contains(&c));
    assert!(!bed.engine.registry().contains(&ParticipantId::from("a")));
    assert_eq!(bed.engine.factory().live_count(), 2);

    assert_eq!(bed.signaling.offers_to(&b).len(), 1);
    assert_eq!(bed.signaling.offers_to(&c).len(), 1);

    // Fresh sessions get a media-state exchange.
    let requests = bed.signaling.count(|m| {
        matches!(m, SignalMessage::MediaStateRequest { .. })
    });
    assert_eq!(requests, 2);
}

#[tokio::test]
async fn identical_snapshot_is_a_noop() {
    let mut bed = bed("a").await;
    bed.engine.handle_signal(snapshot(&["a", "b", "c"])).await;

    bed.signaling.clear();
    bed.engine.handle_signal(snapshot(&["a", "b", "c"])).await;

    assert!(bed.signaling.is_empty(), "second reconcile sent messages");
    assert_eq!(bed.links.total_built(), 2);
    assert_eq!(bed.engine.registry().len(), 2);
}

#[tokio::test]
async fn vanished_participant_is_torn_down() {
    let mut bed = bed("a").await;
    let c = ParticipantId::from("c");

    bed.engine.handle_signal(snapshot(&["a", "b", "c"])).await;
    let link_c = bed.links.last_link(&c).unwrap();

    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    assert!(!bed.engine.registry().contains(&c));
    assert_eq!(link_c.close_count(), 1);
    assert!(bed.handles.view.get(&c).is_none());
    assert_eq!(bed.engine.factory().live_count(), 1);
}

#[tokio::test]
async fn live_sessions_always_match_latest_snapshot() {
    let mut bed = bed("a").await;

    for ids in [
        vec!["a", "b"],
        vec!["a", "b", "c", "d"],
        vec!["a", "d"],
        vec!["a"],
        vec!["a", "e"],
    ] {
        bed.engine.handle_signal(snapshot(&ids)).await;

        let expected: HashSet<ParticipantId> = ids
            .iter()
            .filter(|id| **id != "a")
            .map(|id| ParticipantId::from(*id))
            .collect();
        let live: HashSet<ParticipantId> =
            bed.engine.registry().ids().into_iter().collect();
        assert_eq!(live, expected, "registry drifted from snapshot {ids:?}");
    }
}

#[tokio::test]
async fn color_tag_survives_leaving_and_rejoining() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    let color = bed.handles.view.get(&b).unwrap().color;

    bed.engine.handle_signal(snapshot(&["a"])).await;
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    assert_eq!(bed.handles.view.get(&b).unwrap().color, color);
}

#[tokio::test]
async fn snapshot_before_welcome_is_dropped() {
    let mut bed = bed_unwelcomed("a").await;

    bed.engine
        .handle_signal(snapshot(&["a", "b"]))
        .await;

    assert!(bed.engine.registry().is_empty());
    assert_eq!(bed.links.total_built(), 0);
    assert!(bed.signaling.is_empty());
}

#[tokio::test]
async fn snapshot_adopts_display_name_for_offer_created_session() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");

    // Session born from an inbound offer knows only a placeholder name.
    bed.engine
        .handle_signal(SignalMessage::Offer {
            peer: b.clone(),
            sdp: "v=0 offer".to_string(),
        })
        .await;

    bed.engine
        .handle_signal(SignalMessage::RoomSnapshot {
            participants: vec![participant("a"), participant("b")],
        })
        .await;

    assert_eq!(
        bed.handles.view.get(&b).unwrap().participant.display_name,
        "User-b"
    );
    // The existing session was reused, not replaced.
    assert_eq!(bed.links.build_count(&b), 1);
}
