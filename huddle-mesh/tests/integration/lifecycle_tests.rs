use crate::utils::{bed, bed_unwelcomed, hint, participant, snapshot, wait_until};
use huddle_core::{MediaKind, ParticipantId, SignalMessage};
use huddle_mesh::{EngineCommand, LinkEvent, LinkState, RemoteTrackInfo};

#[tokio::test]
async fn participant_left_tears_down_exactly_once() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    let link = bed.links.last_link(&b).unwrap();

    for _ in 0..2 {
        bed.engine
            .handle_signal(SignalMessage::ParticipantLeft { peer: b.clone() })
            .await;
    }

    assert!(!bed.engine.registry().contains(&b));
    assert!(bed.handles.view.get(&b).is_none());
    assert_eq!(link.close_count(), 1);
}

#[tokio::test]
async fn failed_link_tears_the_session_down() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    bed.engine
        .handle_link_event(LinkEvent::StateChanged(b.clone(), LinkState::Failed))
        .await;

    assert!(!bed.engine.registry().contains(&b));
    assert_eq!(bed.links.last_link(&b).unwrap().close_count(), 1);
}

#[tokio::test]
async fn connected_state_change_is_not_a_teardown() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    bed.engine
        .handle_link_event(LinkEvent::StateChanged(b.clone(), LinkState::Connected))
        .await;

    assert!(bed.engine.registry().contains(&b));
    assert_eq!(bed.links.last_link(&b).unwrap().close_count(), 0);
}

#[tokio::test]
async fn local_hints_are_relayed_only_for_live_sessions() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;
    bed.signaling.clear();

    bed.engine
        .handle_link_event(LinkEvent::LocalHint(b.clone(), hint(1)))
        .await;
    let relayed = bed.signaling.count(|m| {
        matches!(m, SignalMessage::Hint { peer, .. } if *peer == b)
    });
    assert_eq!(relayed, 1);

    bed.engine.handle_signal(snapshot(&["a"])).await;
    bed.signaling.clear();

    // A hint surfacing from the link after teardown goes nowhere.
    bed.engine
        .handle_link_event(LinkEvent::LocalHint(b.clone(), hint(2)))
        .await;
    assert!(bed.signaling.is_empty());
}

#[tokio::test]
async fn remote_tracks_surface_in_the_view() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    for (kind, id) in [(MediaKind::Audio, "t-audio"), (MediaKind::Video, "t-video")] {
        bed.engine
            .handle_link_event(LinkEvent::RemoteTrack(
                b.clone(),
                RemoteTrackInfo {
                    kind,
                    track_id: id.to_string(),
                },
            ))
            .await;
    }

    let tracks = bed.handles.view.get(&b).unwrap().tracks.clone();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].track_id, "t-audio");
    assert_eq!(tracks[1].track_id, "t-video");
}

#[tokio::test]
async fn tracks_survive_view_resyncs() {
    let mut bed = bed("a").await;
    let b = ParticipantId::from("b");
    bed.engine.handle_signal(snapshot(&["a", "b"])).await;

    bed.engine
        .handle_link_event(LinkEvent::RemoteTrack(
            b.clone(),
            RemoteTrackInfo {
                kind: MediaKind::Video,
                track_id: "t-video".to_string(),
            },
        ))
        .await;

    // A state-bearing update rewrites the view entry; tracks must persist.
    bed.engine
        .handle_signal(SignalMessage::MediaState {
            peer: b.clone(),
            audio: false,
            video: true,
        })
        .await;

    assert_eq!(bed.handles.view.get(&b).unwrap().tracks.len(), 1);
}

#[tokio::test]
async fn run_loop_joins_negotiates_and_leaves_cleanly() {
    let bed = bed_unwelcomed("a").await;
    let signaling = bed.signaling.clone();
    let links = bed.links.clone();
    let media = bed.media.clone();
    let view = bed.handles.view.clone();
    let signal_tx = bed.handles.signal_tx.clone();
    let command_tx = bed.handles.command_tx.clone();

    let driver = tokio::spawn(bed.engine.run());

    signal_tx
        .send(SignalMessage::Welcome {
            participant: participant("a"),
        })
        .await
        .unwrap();
    signal_tx.send(snapshot(&["a", "b"])).await.unwrap();

    let b = ParticipantId::from("b");
    assert!(
        wait_until(|| signaling.offers_to(&b).len() == 1, 1000).await,
        "no offer went out"
    );
    assert!(matches!(
        signaling.sent().first(),
        Some(SignalMessage::Join { .. })
    ));

    command_tx.send(EngineCommand::Leave).await.unwrap();
    driver.await.unwrap();

    assert!(media.is_stopped());
    assert!(view.is_empty());
    assert_eq!(links.last_link(&b).unwrap().close_count(), 1);
}
