//! Chapter advance: exactly-once hand-off, URL precedence, claims.

mod common;

use bridge_traits::CachedAudioEntry;
use common::{chapter, context, Harness, MockChapterApi, TableApi};
use core_playback::{AdvanceOutcome, AdvanceState, AdvanceTrigger, ErrorKind, PageKind, UrlSource};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn triggers() -> Vec<AdvanceTrigger> {
    vec![
        AdvanceTrigger::EngineEnded,
        AdvanceTrigger::MediaSessionNext,
        AdvanceTrigger::PageHelper { pre_resolved: None },
    ]
}

async fn playing_first_chapter(harness: &Harness) {
    harness
        .core
        .play(chapter("c1"), Some("https://cdn.test/c1.mp3".into()))
        .await
        .unwrap();
    harness
        .core
        .prime_chapter_context("book-1", "c1", context(None, Some("c2")));
}

#[tokio::test(start_paused = true)]
async fn concurrent_triggers_advance_exactly_once() {
    for rotation in 0..3 {
        let harness = Harness::new(Arc::new(TableApi::default()));
        playing_first_chapter(&harness).await;
        harness
            .prefetch
            .0
            .lock()
            .insert("c2".into(), CachedAudioEntry::new("c2", "blob:c2"));

        let mut order = triggers();
        order.rotate_left(rotation);
        let [a, b, c]: [AdvanceTrigger; 3] = order.try_into().unwrap();

        let core = &harness.core;
        let (ra, rb, rc) = tokio::join!(
            core.request_advance(a),
            core.request_advance(b),
            core.request_advance(c)
        );
        let outcomes = [ra, rb, rc];

        let advanced = outcomes
            .iter()
            .filter(|o| matches!(o, AdvanceOutcome::Advanced { .. }))
            .count();
        let in_flight = outcomes
            .iter()
            .filter(|o| **o == AdvanceOutcome::AlreadyInFlight)
            .count();

        assert_eq!(advanced, 1, "rotation {rotation}: {outcomes:?}");
        assert_eq!(in_flight, 2, "rotation {rotation}: {outcomes:?}");
        assert_eq!(harness.engine.loads(), 2);
        assert_eq!(core.session().unwrap().chapter_id, "c2");
        assert_eq!(core.coordinator().state(), AdvanceState::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn prefetch_hit_beats_stale_legacy_slot_without_network() {
    let mut api = MockChapterApi::new();
    api.expect_resolve_chapter_context()
        .times(1)
        .returning(|_, _, _| Ok(context(None, Some("c2"))));
    api.expect_resolve_playable_url().times(0);

    let harness = Harness::new(Arc::new(api));
    harness
        .core
        .play(chapter("c1"), Some("https://cdn.test/c1.mp3".into()))
        .await
        .unwrap();

    harness
        .prefetch
        .0
        .lock()
        .insert("c2".into(), CachedAudioEntry::new("c2", "https://cdn.test/c2-fresh.mp3"));
    *harness.slot.0.lock() = Some(CachedAudioEntry::new("c2", "https://cdn.test/c2-stale.mp3"));

    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert_eq!(
        outcome,
        AdvanceOutcome::Advanced {
            from: "c1".into(),
            to: "c2".into(),
            source: UrlSource::PrefetchCache
        }
    );
    assert_eq!(
        harness.core.session().unwrap().audio_url.as_deref(),
        Some("https://cdn.test/c2-fresh.mp3")
    );
}

#[tokio::test(start_paused = true)]
async fn legacy_slot_only_counts_for_matching_chapter() {
    let api = Arc::new(
        TableApi::default()
            .with_context("c1", context(None, Some("c2")))
            .with_url("c2", "https://cdn.test/c2-network.mp3"),
    );
    let harness = Harness::new(api.clone());
    harness
        .core
        .play(chapter("c1"), Some("https://cdn.test/c1.mp3".into()))
        .await
        .unwrap();

    *harness.slot.0.lock() = Some(CachedAudioEntry::new("c7", "https://cdn.test/c7.mp3"));
    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert!(matches!(
        outcome,
        AdvanceOutcome::Advanced {
            source: UrlSource::Network,
            ..
        }
    ));
    assert_eq!(api.url_calls.load(Ordering::SeqCst), 1);

    harness
        .core
        .prime_chapter_context("book-1", "c2", context(Some("c1"), Some("c3")));
    *harness.slot.0.lock() = Some(CachedAudioEntry::new("c3", "https://cdn.test/c3-slot.mp3"));
    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert!(matches!(
        outcome,
        AdvanceOutcome::Advanced {
            source: UrlSource::LegacySlot,
            ..
        }
    ));
    assert_eq!(api.url_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn claimed_transition_is_left_to_the_claimer() {
    let harness = Harness::new(Arc::new(TableApi::default().with_url("c2", "https://cdn.test/c2.mp3")));
    playing_first_chapter(&harness).await;

    let claims = harness.core.claims();
    assert!(claims.claim("c2"));

    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert_eq!(
        outcome,
        AdvanceOutcome::ClaimedElsewhere {
            chapter_id: "c2".into()
        }
    );
    assert_eq!(claims.current(), None);
    assert_eq!(harness.engine.loads(), 1);
    assert_eq!(harness.core.session().unwrap().chapter_id, "c1");
}

#[tokio::test(start_paused = true)]
async fn page_helper_uses_its_own_claim_and_url() {
    let harness = Harness::new(Arc::new(TableApi::default()));
    playing_first_chapter(&harness).await;

    let claims = harness.core.claims();
    assert!(claims.claim("c2"));

    let outcome = harness
        .core
        .request_advance(AdvanceTrigger::PageHelper {
            pre_resolved: Some("https://cdn.test/c2-page.mp3".into()),
        })
        .await;
    assert_eq!(
        outcome,
        AdvanceOutcome::Advanced {
            from: "c1".into(),
            to: "c2".into(),
            source: UrlSource::PreResolved
        }
    );
    assert_eq!(claims.current(), None);
    assert_eq!(
        harness.engine.current_source().as_deref(),
        Some("https://cdn.test/c2-page.mp3")
    );
}

#[tokio::test(start_paused = true)]
async fn engine_end_is_left_to_the_player_page() {
    let harness = Harness::new(Arc::new(TableApi::default().with_url("c2", "https://cdn.test/c2.mp3")));
    playing_first_chapter(&harness).await;

    harness.core.set_page_kind(PageKind::PlayerPage);
    assert_eq!(
        harness.core.request_advance(AdvanceTrigger::EngineEnded).await,
        AdvanceOutcome::Ignored
    );

    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert!(matches!(outcome, AdvanceOutcome::Advanced { .. }));
}

#[tokio::test(start_paused = true)]
async fn ended_event_routes_to_the_coordinator() {
    let harness = Harness::new(Arc::new(TableApi::default().with_url("c2", "https://cdn.test/c2.mp3")));
    playing_first_chapter(&harness).await;

    let task = harness
        .core
        .handle_event(bridge_traits::MediaEvent::Ended)
        .await
        .expect("ended schedules an advance");
    assert!(matches!(task.await.unwrap(), AdvanceOutcome::Advanced { .. }));
    assert_eq!(harness.core.session().unwrap().chapter_id, "c2");
    assert!(!harness.core.session().unwrap().paused);
}

#[tokio::test(start_paused = true)]
async fn end_of_book_pauses_quietly() {
    let harness = Harness::new(Arc::new(TableApi::default()));
    harness
        .core
        .play(chapter("c9"), Some("https://cdn.test/c9.mp3".into()))
        .await
        .unwrap();
    harness
        .core
        .prime_chapter_context("book-1", "c9", context(Some("c8"), None));

    let outcome = harness.core.request_advance(AdvanceTrigger::EngineEnded).await;
    assert_eq!(outcome, AdvanceOutcome::NoNextChapter);
    assert!(harness.core.session().unwrap().paused);
    assert_eq!(harness.notices.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn resolution_failure_notifies_and_keeps_state() {
    let harness = Harness::new(Arc::new(TableApi::default()));
    harness
        .core
        .play(chapter("c1"), Some("https://cdn.test/c1.mp3".into()))
        .await
        .unwrap();

    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert_eq!(outcome, AdvanceOutcome::Failed(ErrorKind::ResolutionFailed));
    assert_eq!(harness.notices.count(), 1);
    assert_eq!(harness.core.session().unwrap().chapter_id, "c1");
    assert_eq!(harness.core.coordinator().state(), AdvanceState::Idle);

    // The in-flight flag was cleared, so a later request runs again.
    harness
        .core
        .prime_chapter_context("book-1", "c1", context(None, None));
    assert_eq!(
        harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await,
        AdvanceOutcome::NoNextChapter
    );
}

#[tokio::test(start_paused = true)]
async fn previous_track_walks_backwards() {
    let harness = Harness::new(Arc::new(TableApi::default().with_url("c1", "https://cdn.test/c1.mp3")));
    harness
        .core
        .play(chapter("c2"), Some("https://cdn.test/c2.mp3".into()))
        .await
        .unwrap();
    harness
        .core
        .prime_chapter_context("book-1", "c2", context(Some("c1"), Some("c3")));

    let outcome = harness.core.request_previous().await;
    assert_eq!(
        outcome,
        AdvanceOutcome::Advanced {
            from: "c2".into(),
            to: "c1".into(),
            source: UrlSource::Network
        }
    );

    harness
        .core
        .prime_chapter_context("book-1", "c1", context(None, Some("c2")));
    assert_eq!(
        harness.core.request_previous().await,
        AdvanceOutcome::NoPreviousChapter
    );
}

#[tokio::test(start_paused = true)]
async fn no_session_means_nothing_to_advance() {
    let harness = Harness::new(Arc::new(TableApi::default()));
    assert_eq!(
        harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await,
        AdvanceOutcome::NoActiveSession
    );
}

fn slow_api() -> Arc<TableApi> {
    Arc::new(
        TableApi::default()
            .with_url("c2", "https://cdn.test/c2.mp3")
            .with_url_delay(Duration::from_millis(500)),
    )
}

#[tokio::test(start_paused = true)]
async fn stop_while_resolving_abandons_the_advance() {
    let harness = Harness::new(slow_api());
    playing_first_chapter(&harness).await;

    let core = harness.core.clone();
    let advance = tokio::spawn(async move { core.request_advance(AdvanceTrigger::MediaSessionNext).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(matches!(harness.core.coordinator().state(), AdvanceState::Resolving { .. }));

    harness.core.stop().await;

    assert_eq!(advance.await.unwrap(), AdvanceOutcome::Superseded);
    assert!(harness.core.session().is_none());
    assert!(harness.kv.get("globalPlayerState").is_none());
    assert_eq!(harness.engine.loads(), 1);
    assert_eq!(harness.notices.count(), 0);
    assert_eq!(harness.core.coordinator().state(), AdvanceState::Idle);
}

#[tokio::test(start_paused = true)]
async fn user_play_while_resolving_wins_over_the_advance() {
    let harness = Harness::new(slow_api());
    playing_first_chapter(&harness).await;

    let core = harness.core.clone();
    let advance = tokio::spawn(async move { core.request_advance(AdvanceTrigger::EngineEnded).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness
        .core
        .play(chapter("c5"), Some("https://cdn.test/c5.mp3".into()))
        .await
        .unwrap();

    assert_eq!(advance.await.unwrap(), AdvanceOutcome::Superseded);
    let session = harness.core.session().unwrap();
    assert_eq!(session.chapter_id, "c5");
    assert_eq!(session.audio_url.as_deref(), Some("https://cdn.test/c5.mp3"));
    assert_eq!(harness.engine.loads(), 2);
    assert_eq!(
        harness.engine.current_source().as_deref(),
        Some("https://cdn.test/c5.mp3")
    );
}

#[tokio::test(start_paused = true)]
async fn advance_after_an_abandoned_one_still_runs() {
    let harness = Harness::new(slow_api());
    playing_first_chapter(&harness).await;

    let core = harness.core.clone();
    let advance = tokio::spawn(async move { core.request_advance(AdvanceTrigger::MediaSessionNext).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.core.stop().await;
    assert_eq!(advance.await.unwrap(), AdvanceOutcome::Superseded);

    playing_first_chapter(&harness).await;
    let outcome = harness.core.request_advance(AdvanceTrigger::MediaSessionNext).await;
    assert_eq!(
        outcome,
        AdvanceOutcome::Advanced {
            from: "c1".into(),
            to: "c2".into(),
            source: UrlSource::Network
        }
    );
}
