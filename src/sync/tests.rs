use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::*;
use crate::cache::{init_cache, LocalCache, LOGS_SLOT};
use crate::remote::fake::FakeMirror;
use crate::remote::{RemoteMirror, RemoteOp};
use crate::store::Entity;

struct Fixture {
    sync: SyncOrchestrator,
    cache: LocalCache,
    mirror: Arc<FakeMirror>,
    _dir: TempDir,
}

/// Forwards remote failures to a channel.
struct ChannelSink(mpsc::UnboundedSender<String>);

impl FailureSink for ChannelSink {
    fn report(&self, op: &RemoteOp, _error: &AppError) {
        let _ = self.0.send(op.to_string());
    }
}

async fn open_cache(dir: &TempDir) -> LocalCache {
    let pool = init_cache(&dir.path().join("study.sqlite")).await.unwrap();
    LocalCache::new(pool)
}

async fn online_with(mirror: FakeMirror, sink: Arc<dyn FailureSink>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir).await;
    let mirror = Arc::new(mirror);
    let remote_mirror: Arc<dyn RemoteMirror> = mirror.clone();
    let dispatcher = RemoteDispatcher::new(Some(remote_mirror), sink);
    let sync = SyncOrchestrator::load(cache.clone(), dispatcher).await;

    Fixture {
        sync,
        cache,
        mirror,
        _dir: dir,
    }
}

async fn online() -> Fixture {
    online_with(FakeMirror::default(), Arc::new(LogSink)).await
}

async fn offline(dir: &TempDir) -> SyncOrchestrator {
    let cache = open_cache(dir).await;
    SyncOrchestrator::load(cache, RemoteDispatcher::new(None, Arc::new(LogSink))).await
}

fn entry_request(topic: &str, content: &str) -> CreateEntryRequest {
    CreateEntryRequest {
        topic: topic.to_string(),
        content: content.to_string(),
        tags: None,
    }
}

fn card_request(front: &str, back: &str) -> CreateCardRequest {
    CreateCardRequest {
        front: front.to_string(),
        back: back.to_string(),
    }
}

fn remote_entry(id: i64, topic: &str) -> JournalEntry {
    JournalEntry {
        id,
        date: "remote".to_string(),
        topic: topic.to_string(),
        tags: None,
        content: "from the mirror".to_string(),
    }
}

async fn master_logs(sync: &SyncOrchestrator) -> Vec<JournalEntry> {
    sync.export().await.logs
}

async fn master_cards(sync: &SyncOrchestrator) -> Vec<Flashcard> {
    sync.export().await.cards
}

#[tokio::test]
async fn test_empty_cache_starts_empty() {
    let dir = TempDir::new().unwrap();
    let sync = offline(&dir).await;

    let snapshot = sync.snapshot().await;
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.cards.is_empty());
    assert_eq!(snapshot.streak.days, 0);
    assert!(!sync.is_online());
}

#[tokio::test]
async fn test_corrupt_cache_starts_empty() {
    let dir = TempDir::new().unwrap();
    open_cache(&dir)
        .await
        .write_raw(LOGS_SLOT, "definitely not json")
        .await
        .unwrap();

    let sync = offline(&dir).await;
    assert!(sync.list_entries().await.is_empty());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let sync = offline(&dir).await;
        sync.create_entry(&entry_request("Ownership", "Moves and borrows"))
            .await
            .unwrap();
        sync.create_card(&card_request("Q", "A")).await.unwrap();
    }

    let sync = offline(&dir).await;
    assert_eq!(sync.list_entries().await[0].topic, "Ownership");
    assert_eq!(sync.list_cards().await[0].front, "Q");
}

#[tokio::test]
async fn test_create_then_delete_restores_master() {
    let fx = online().await;
    fx.sync.create_entry(&entry_request("a", "b")).await.unwrap();
    let before = master_logs(&fx.sync).await;

    let created = fx.sync.create_entry(&entry_request("c", "d")).await.unwrap();
    assert!(fx.sync.delete_entry(created.id).await);

    assert_eq!(master_logs(&fx.sync).await, before);
    assert_eq!(fx.cache.load_logs().await, before);
}

#[tokio::test]
async fn test_create_validation_changes_nothing() {
    let fx = online().await;

    let err = fx
        .sync
        .create_entry(&entry_request("   ", "content"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = fx.sync.create_card(&card_request("front", "")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(master_logs(&fx.sync).await.is_empty());
    assert!(master_cards(&fx.sync).await.is_empty());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.mirror.calls().is_empty());
}

#[tokio::test]
async fn test_journal_prepends_and_cards_append() {
    let fx = online().await;

    let first = fx.sync.create_entry(&entry_request("first", "x")).await.unwrap();
    let second = fx.sync.create_entry(&entry_request("second", "x")).await.unwrap();
    assert!(second.id > first.id);
    let topics: Vec<String> = fx.sync.list_entries().await.into_iter().map(|e| e.topic).collect();
    assert_eq!(topics, vec!["second", "first"]);

    fx.sync.create_card(&card_request("one", "1")).await.unwrap();
    fx.sync.create_card(&card_request("two", "2")).await.unwrap();
    let fronts: Vec<String> = fx.sync.list_cards().await.into_iter().map(|c| c.front).collect();
    assert_eq!(fronts, vec!["one", "two"]);
}

#[tokio::test]
async fn test_update_reads_back_and_keeps_id() {
    let fx = online().await;
    let created = fx
        .sync
        .create_entry(&entry_request("Traits", "Static dispatch"))
        .await
        .unwrap();

    let updated = fx
        .sync
        .update_entry(
            created.id,
            &UpdateEntryRequest {
                content: Some("Dynamic dispatch".to_string()),
                tags: Some("rust, traits".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let read_back = fx.sync.get_entry(created.id).await.unwrap();
    assert_eq!(read_back, updated);
    assert_eq!(read_back.id, created.id);
    assert_eq!(read_back.topic, "Traits");
    assert_eq!(read_back.content, "Dynamic dispatch");
    assert_eq!(read_back.tags.as_deref(), Some("rust, traits"));
    assert_eq!(fx.cache.load_logs().await, vec![read_back]);
}

#[tokio::test]
async fn test_card_update_keeps_position() {
    let fx = online().await;
    let a = fx.sync.create_card(&card_request("a", "1")).await.unwrap();
    fx.sync.create_card(&card_request("b", "2")).await.unwrap();

    fx.sync
        .update_card(
            a.id,
            &UpdateCardRequest {
                back: Some("one".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cards = fx.sync.list_cards().await;
    assert_eq!(cards[0].id, a.id);
    assert_eq!(cards[0].back, "one");
}

#[tokio::test]
async fn test_update_unknown_id() {
    let fx = online().await;

    let err = fx
        .sync
        .update_entry(42, &UpdateEntryRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = fx
        .sync
        .update_card(42, &UpdateCardRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_unknown_id_is_noop() {
    let fx = online().await;
    fx.sync.create_card(&card_request("a", "b")).await.unwrap();
    fx.mirror.wait_for_calls(1).await;

    assert!(!fx.sync.delete_card(12345).await);
    assert!(!fx.sync.delete_entry(12345).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fx.mirror.calls().len(), 1);
    assert_eq!(master_cards(&fx.sync).await.len(), 1);
}

#[tokio::test]
async fn test_mutations_are_mirrored() {
    let fx = online().await;

    let entry = fx.sync.create_entry(&entry_request("t", "c")).await.unwrap();
    fx.sync
        .update_entry(
            entry.id,
            &UpdateEntryRequest {
                topic: Some("t2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let card = fx.sync.create_card(&card_request("f", "b")).await.unwrap();
    fx.sync.delete_card(card.id).await;

    let calls = fx.mirror.wait_for_calls(4).await;
    let has = |verb: &str, table: RemoteTable, id: i64| {
        calls
            .iter()
            .any(|c| c.verb == verb && c.table == table && c.id == id)
    };
    assert!(has("insert", RemoteTable::Logs, entry.id));
    assert!(has("update", RemoteTable::Logs, entry.id));
    assert!(has("insert", RemoteTable::Cards, card.id));
    assert!(has("delete", RemoteTable::Cards, card.id));

    let update = calls.iter().find(|c| c.verb == "update").unwrap();
    assert_eq!(update.row.as_ref().unwrap()["topic"], "t2");
}

#[tokio::test]
async fn test_remote_failure_never_reaches_caller() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mirror = FakeMirror::default();
    mirror.set_failing(true);
    let fx = online_with(mirror, Arc::new(ChannelSink(tx))).await;

    let created = fx.sync.create_entry(&entry_request("t", "c")).await.unwrap();

    let failed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed, format!("insert logs#{}", created.id));
    assert_eq!(master_logs(&fx.sync).await, vec![created.clone()]);
    assert_eq!(fx.cache.load_logs().await, vec![created]);
}

#[tokio::test]
async fn test_search_properties() {
    let fx = online().await;
    fx.sync
        .create_entry(&CreateEntryRequest {
            topic: "Async".to_string(),
            content: "tokio runtime".to_string(),
            tags: Some("Concurrency".to_string()),
        })
        .await
        .unwrap();
    fx.sync.create_entry(&entry_request("Macros", "macro_rules")).await.unwrap();
    fx.sync.create_card(&card_request("What is TOKIO?", "A runtime")).await.unwrap();
    fx.sync.create_card(&card_request("Lifetimes", "Regions")).await.unwrap();

    for term in ["tokio", "CONCURRENCY", "macro", "runtime", "zzz"] {
        let view = fx.sync.search(term).await;
        let needle = term.to_lowercase();
        let master = fx.sync.export().await;
        assert!(view.logs.iter().all(|e| e.matches(&needle) && master.logs.contains(e)));
        assert!(view.cards.iter().all(|c| c.matches(&needle) && master.cards.contains(c)));
        assert_eq!(
            view.logs.len(),
            master.logs.iter().filter(|e| e.matches(&needle)).count()
        );
    }

    let view = fx.sync.search("tokio").await;
    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.cards.len(), 1);

    let reset = fx.sync.search("").await;
    let master = fx.sync.export().await;
    assert_eq!(reset.logs, master.logs);
    assert_eq!(reset.cards, master.cards);
}

#[tokio::test]
async fn test_create_under_filter_then_clear() {
    let fx = online().await;
    fx.sync.search("rust").await;

    fx.sync.create_entry(&entry_request("Go", "channels")).await.unwrap();
    fx.sync.create_entry(&entry_request("Rust", "ownership")).await.unwrap();

    let shown = fx.sync.list_entries().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].topic, "Rust");
    assert_eq!(master_logs(&fx.sync).await.len(), 2);

    let all = fx.sync.search("  ").await;
    assert_eq!(all.logs.len(), 2);
}

#[tokio::test]
async fn test_edit_session_lifecycle() {
    let fx = online().await;
    let a = fx.sync.create_entry(&entry_request("a", "a")).await.unwrap();
    let b = fx.sync.create_entry(&entry_request("b", "b")).await.unwrap();

    assert_eq!(fx.sync.begin_edit(a.id).await.unwrap(), a);
    let err = fx.sync.begin_edit(b.id).await.unwrap_err();
    assert_eq!(err, AppError::EditInProgress { active_id: a.id });
    assert_eq!(fx.sync.editing().await, Some(a.id));

    fx.sync.search("b").await;
    assert_eq!(fx.sync.editing().await, Some(a.id));

    fx.sync
        .update_entry(
            a.id,
            &UpdateEntryRequest {
                topic: Some("a2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(fx.sync.editing().await, None);

    fx.sync.begin_edit(b.id).await.unwrap();
    assert_eq!(fx.sync.cancel_edit().await, Some(b.id));
    assert_eq!(fx.sync.editing().await, None);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let fx = online().await;
    fx.sync.create_entry(&entry_request("a", "1")).await.unwrap();
    fx.sync.create_entry(&entry_request("b", "2")).await.unwrap();
    fx.sync.create_card(&card_request("q", "a")).await.unwrap();
    let exported = fx.sync.export().await;

    let dir = TempDir::new().unwrap();
    let other = offline(&dir).await;
    let raw = serde_json::to_string(&exported).unwrap();
    let summary = other.import_raw(&raw).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            logs: Some(2),
            cards: Some(1)
        }
    );
    let restored = other.export().await;
    assert_eq!(restored.logs, exported.logs);
    assert_eq!(restored.cards, exported.cards);
    assert_eq!(other.cache.load_logs().await, exported.logs);
}

#[tokio::test]
async fn test_import_only_present_keys() {
    let fx = online().await;
    fx.sync.create_entry(&entry_request("keep", "me")).await.unwrap();
    fx.sync.create_card(&card_request("old", "card")).await.unwrap();
    let calls_before = fx.mirror.wait_for_calls(2).await.len();

    let summary = fx
        .sync
        .import_raw(r#"{"cards": [{"id": 1, "front": "new", "back": "card"}]}"#)
        .await
        .unwrap();

    assert_eq!(summary.logs, None);
    assert_eq!(master_logs(&fx.sync).await[0].topic, "keep");
    assert_eq!(master_cards(&fx.sync).await[0].front, "new");
    assert_eq!(fx.cache.load_cards().await[0].front, "new");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fx.mirror.calls().len(), calls_before);
}

#[tokio::test]
async fn test_malformed_import_leaves_state() {
    let fx = online().await;
    fx.sync.create_entry(&entry_request("keep", "me")).await.unwrap();
    let before = fx.sync.export().await;

    let err = fx.sync.import_raw("{\"logs\": [").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let after = fx.sync.export().await;
    assert_eq!(after.logs, before.logs);
    assert_eq!(after.cards, before.cards);
}

#[tokio::test]
async fn test_hydration_replaces_and_persists() {
    let mirror = FakeMirror::with_data(
        vec![remote_entry(1, "older"), remote_entry(2, "newer")],
        vec![Flashcard {
            id: 5,
            front: "remote".to_string(),
            back: "card".to_string(),
        }],
    );
    let fx = online_with(mirror, Arc::new(LogSink)).await;
    let local = fx.sync.create_entry(&entry_request("local only", "x")).await.unwrap();
    fx.mirror.wait_for_calls(1).await;
    fx.sync.search("newer").await;

    let report = fx.sync.hydrate_from_remote().await;

    assert_eq!(
        report,
        HydrationReport::Completed {
            logs: CollectionSync::Replaced { count: 3 },
            cards: CollectionSync::Replaced { count: 1 },
        }
    );
    let logs = master_logs(&fx.sync).await;
    assert_eq!(
        logs.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![local.id, 2, 1]
    );
    assert_eq!(fx.sync.list_entries().await, vec![remote_entry(2, "newer")]);
    assert_eq!(fx.cache.load_logs().await, logs);
    assert_eq!(fx.cache.load_cards().await.len(), 1);
}

#[tokio::test]
async fn test_deleted_entry_stays_deleted_after_hydration() {
    let mirror = FakeMirror::default();
    mirror.set_insert_delay(Duration::from_millis(30));
    let fx = online_with(mirror, Arc::new(LogSink)).await;

    let typo = fx.sync.create_entry(&entry_request("typo", "oops")).await.unwrap();
    assert!(fx.sync.delete_entry(typo.id).await);
    fx.mirror.wait_for_calls(2).await;

    let report = fx.sync.hydrate_from_remote().await;

    assert!(matches!(
        report,
        HydrationReport::Completed {
            logs: CollectionSync::Replaced { count: 0 },
            ..
        }
    ));
    assert!(master_logs(&fx.sync).await.is_empty());
    assert!(fx.cache.load_logs().await.is_empty());
}

#[tokio::test]
async fn test_edits_reach_mirror_in_order() {
    let mirror = FakeMirror::default();
    mirror.set_insert_delay(Duration::from_millis(30));
    let fx = online_with(mirror, Arc::new(LogSink)).await;

    let card = fx.sync.create_card(&card_request("draft", "b")).await.unwrap();
    fx.sync
        .update_card(
            card.id,
            &UpdateCardRequest {
                front: Some("final".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fx.sync.delete_card(card.id).await;

    let calls = fx.mirror.wait_for_calls(3).await;
    let verbs: Vec<&str> = calls.iter().map(|c| c.verb).collect();
    assert_eq!(verbs, vec!["insert", "update", "delete"]);
    assert_eq!(calls[1].row.as_ref().unwrap()["front"], "final");
    assert!(fx.mirror.fetch_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_hydration_keeps_local_state() {
    let mirror = FakeMirror::with_data(vec![remote_entry(1, "remote")], vec![]);
    mirror.set_failing(true);
    let fx = online_with(mirror, Arc::new(LogSink)).await;
    let local = fx.sync.create_entry(&entry_request("local", "x")).await.unwrap();

    let report = fx.sync.hydrate_from_remote().await;

    assert!(matches!(
        report,
        HydrationReport::Completed {
            logs: CollectionSync::Failed { .. },
            cards: CollectionSync::Failed { .. },
        }
    ));
    assert_eq!(master_logs(&fx.sync).await, vec![local]);
}

#[tokio::test]
async fn test_offline_hydration_is_noop() {
    let dir = TempDir::new().unwrap();
    let sync = offline(&dir).await;
    assert_eq!(sync.hydrate_from_remote().await, HydrationReport::Offline);
}

#[tokio::test]
async fn test_one_hydration_at_a_time() {
    let mirror = FakeMirror::default();
    mirror.set_fetch_delay(Duration::from_millis(300));
    let fx = Arc::new(online_with(mirror, Arc::new(LogSink)).await);

    let first = {
        let fx = Arc::clone(&fx);
        tokio::spawn(async move { fx.sync.hydrate_from_remote().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(fx.sync.hydrate_from_remote().await, HydrationReport::InProgress);
    assert!(matches!(
        first.await.unwrap(),
        HydrationReport::Completed { .. }
    ));
    assert!(matches!(
        fx.sync.hydrate_from_remote().await,
        HydrationReport::Completed { .. }
    ));
}

#[tokio::test]
async fn test_initialize_hydrates_in_background() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir).await;
    cache.save_logs(&[remote_entry(1, "cached")]).await.unwrap();

    let mirror: Arc<dyn RemoteMirror> =
        Arc::new(FakeMirror::with_data(vec![remote_entry(2, "remote")], vec![]));
    let sync = SyncOrchestrator::initialize(
        cache.clone(),
        RemoteDispatcher::new(Some(mirror), Arc::new(LogSink)),
    )
    .await;

    let hydrated = async {
        loop {
            if sync.list_entries().await == vec![remote_entry(2, "remote")] {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), hydrated)
        .await
        .unwrap();
    assert_eq!(cache.load_logs().await, vec![remote_entry(2, "remote")]);
}

#[tokio::test]
async fn test_streak_counts_new_entry() {
    let fx = online().await;
    assert_eq!(fx.sync.streak().await.days, 0);

    fx.sync.create_entry(&entry_request("today", "x")).await.unwrap();
    fx.sync.create_entry(&entry_request("again", "y")).await.unwrap();

    let streak = fx.sync.streak().await;
    assert_eq!(streak.days, 1);
    assert_eq!(streak.label, "1 dia");
}

#[tokio::test]
async fn test_deck_navigation() {
    let fx = online().await;
    assert_eq!(fx.sync.deck().await.card, None);

    let a = fx.sync.create_card(&card_request("a", "1")).await.unwrap();
    let b = fx.sync.create_card(&card_request("b", "2")).await.unwrap();

    assert_eq!(fx.sync.deck().await.card, Some(a.clone()));
    assert_eq!(fx.sync.next_card().await.card, Some(b.clone()));
    assert_eq!(fx.sync.next_card().await.card, Some(a.clone()));
    assert_eq!(fx.sync.prev_card().await.card, Some(b.clone()));

    fx.sync.delete_card(b.id).await;
    let deck = fx.sync.deck().await;
    assert_eq!(deck.total, 1);
    assert_eq!(deck.card, Some(a));
}
