//! End-to-end board behaviour against the in-memory store: the full request
//! lifecycle, budget guarding, month rollover, two-step delete, and the
//! optimistic-write reconciliation rules.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use ciboard_board::{BoardError, DeleteOutcome, RequestBoard};
use ciboard_core::workflow::ReorderDirection;
use ciboard_core::{
    Attachment, AttachmentKind, Base64FileEncoder, CommentAuthor, DomainError, FileEncoder,
    MonthKey, Request, RequestId, RequestStatus,
};
use ciboard_store::{InMemoryStore, RequestStore, StoreError};

fn board_with_budget(hours: i64) -> (Arc<InMemoryStore>, RequestBoard<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let board = RequestBoard::new(store.clone(), Decimal::new(hours, 0));
    (store, board)
}

async fn submit(board: &mut RequestBoard<InMemoryStore>, title: &str) -> RequestId {
    board.submit(title, None, None, Utc::now()).await.expect("submit")
}

async fn submit_estimated(
    board: &mut RequestBoard<InMemoryStore>,
    title: &str,
    hours: i64,
) -> RequestId {
    let id = submit(board, title).await;
    board.estimate(&id, Decimal::new(hours, 0), None).await.expect("estimate");
    id
}

#[tokio::test]
async fn status_moves_only_along_workflow_edges() {
    let (_, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Export to CSV").await;

    let error = board.approve(&id).await.expect_err("pending cannot be approved");
    assert!(matches!(
        error,
        BoardError::Domain(DomainError::InvalidTransition { from: RequestStatus::Pending, .. })
    ));

    let error = board.archive(&id).await.expect_err("pending cannot be archived");
    assert!(matches!(error, BoardError::Domain(DomainError::InvalidTransition { .. })));
}

#[tokio::test]
async fn full_lifecycle_reaches_the_archive() {
    let (store, mut board) = board_with_budget(12);
    let id = submit_estimated(&mut board, "Fix login", 3).await;

    board.approve(&id).await.expect("approve");
    let due = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
    board.set_completion_date(&id, due).await.expect("completion date");
    board.mark_done(&id, Utc::now()).await.expect("finish");
    board.archive(&id).await.expect("archive");

    let stored = store.get(&id).await.expect("persisted");
    assert_eq!(stored.status, RequestStatus::Archived);
    assert_eq!(stored.estimated_completion_date, Some(due));
    assert!(stored.completed_date.is_some());
}

#[tokio::test]
async fn approved_hours_do_not_depend_on_operation_order() {
    let (_, mut first) = board_with_budget(12);
    let a = submit_estimated(&mut first, "Request A", 3).await;
    let b = submit_estimated(&mut first, "Request B", 4).await;
    first.approve(&a).await.expect("approve a");
    first.approve(&b).await.expect("approve b");

    let (_, mut second) = board_with_budget(12);
    let b = submit(&mut second, "Request B").await;
    let a = submit(&mut second, "Request A").await;
    second.estimate(&b, Decimal::new(4, 0), None).await.expect("estimate b");
    second.approve(&b).await.expect("approve b");
    second.estimate(&a, Decimal::new(3, 0), None).await.expect("estimate a");
    second.approve(&a).await.expect("approve a");

    assert_eq!(first.budget_summary().approved, Decimal::new(7, 0));
    assert_eq!(first.budget_summary().approved, second.budget_summary().approved);
    assert_eq!(first.budget_summary().remaining, second.budget_summary().remaining);
}

#[tokio::test]
async fn reorder_at_the_boundaries_is_a_no_op() {
    let (_, mut board) = board_with_budget(12);
    let first = submit_estimated(&mut board, "First", 1).await;
    let _middle = submit_estimated(&mut board, "Middle", 1).await;
    let last = submit_estimated(&mut board, "Last", 1).await;

    let order_before: Vec<RequestId> =
        board.estimated_requests().iter().map(|r| r.id.clone()).collect();

    board.reorder(&first, ReorderDirection::Up).await.expect("no-op up");
    board.reorder(&last, ReorderDirection::Down).await.expect("no-op down");

    let order_after: Vec<RequestId> =
        board.estimated_requests().iter().map(|r| r.id.clone()).collect();
    assert_eq!(order_before, order_after);
}

#[tokio::test]
async fn reorder_swaps_adjacent_requests_and_persists_both() {
    let (store, mut board) = board_with_budget(12);
    let first = submit_estimated(&mut board, "First", 1).await;
    let second = submit_estimated(&mut board, "Second", 1).await;

    board.reorder(&second, ReorderDirection::Up).await.expect("swap");

    let order: Vec<RequestId> = board.estimated_requests().iter().map(|r| r.id.clone()).collect();
    assert_eq!(order, vec![second.clone(), first.clone()]);

    let stored_first = store.get(&first).await.expect("persisted");
    let stored_second = store.get(&second).await.expect("persisted");
    assert_eq!(stored_first.priority, Some(2));
    assert_eq!(stored_second.priority, Some(1));
}

#[tokio::test]
async fn over_budget_approval_is_rejected_and_remaining_unchanged() {
    let (_, mut board) = board_with_budget(12);
    let big = submit_estimated(&mut board, "Big rework", 8).await;
    board.approve(&big).await.expect("approve within budget");

    let too_big = submit_estimated(&mut board, "Another rework", 5).await;
    assert!(!board.can_approve(&too_big));

    let error = board.approve(&too_big).await.expect_err("overdraw rejected");
    assert!(matches!(
        error,
        BoardError::Domain(DomainError::InsufficientBudget { requested, remaining })
            if requested == Decimal::new(5, 0) && remaining == Decimal::new(4, 0)
    ));

    assert_eq!(board.budget_summary().remaining, Decimal::new(4, 0));
    let request = board.requests().iter().find(|r| r.id == too_big).expect("still on board");
    assert_eq!(request.status, RequestStatus::Estimated);
}

#[tokio::test]
async fn worked_example_leaves_nine_hours_remaining() {
    let (_, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Fix login").await;
    board.estimate(&id, Decimal::new(3, 0), None).await.expect("estimate");
    board.approve(&id).await.expect("approve");

    let summary = board.budget_summary();
    assert_eq!(summary.approved, Decimal::new(3, 0));
    assert_eq!(summary.remaining, Decimal::new(9, 0));
    assert_eq!(summary.percent_used, 25.0);
}

#[tokio::test]
async fn month_rollover_is_idempotent_within_a_month() {
    let (_, mut board) = board_with_budget(12);
    let id = submit_estimated(&mut board, "Fix login", 5).await;
    board.approve(&id).await.expect("approve");

    let this_month = board.ledger().current_month().clone();
    let next_month = Utc::now().checked_add_days(Days::new(40)).expect("valid date");

    let closed = board.check_month_rollover(next_month);
    assert_eq!(closed, Some((this_month.clone(), Decimal::new(5, 0))));
    assert_eq!(board.ledger().history().get(&this_month), Some(&Decimal::new(5, 0)));

    assert_eq!(board.check_month_rollover(next_month), None);
    assert_eq!(board.ledger().history().len(), 1);
}

#[tokio::test]
async fn delete_requires_arming_before_removal() {
    let (store, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Accidental entry").await;

    let outcome = board.delete(&id).await.expect("arm");
    assert_eq!(outcome, DeleteOutcome::Armed);
    assert_eq!(board.armed_delete(), Some(&id));
    assert_eq!(store.len().await, 1);
    assert_eq!(board.requests().len(), 1);

    let outcome = board.delete(&id).await.expect("confirm");
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(board.requests().is_empty());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn arming_a_different_id_moves_the_confirmation() {
    let (store, mut board) = board_with_budget(12);
    let first = submit(&mut board, "First").await;
    let second = submit(&mut board, "Second").await;

    board.delete(&first).await.expect("arm first");
    let outcome = board.delete(&second).await.expect("re-arm");
    assert_eq!(outcome, DeleteOutcome::Armed);
    assert_eq!(board.armed_delete(), Some(&second));
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn comments_are_append_only_across_sync() {
    let (_, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Needs discussion").await;

    board.add_comment(&id, CommentAuthor::Submitter, "please expedite", Utc::now())
        .await
        .expect("comment");
    board.add_comment(&id, CommentAuthor::Estimator, "needs API access", Utc::now())
        .await
        .expect("comment");
    board.add_comment(&id, CommentAuthor::Submitter, "access granted", Utc::now())
        .await
        .expect("comment");

    board.refresh().await.expect("refresh");

    let request = board.requests().iter().find(|r| r.id == id).expect("on board");
    let texts: Vec<&str> = request.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["please expedite", "needs API access", "access granted"]);
}

#[tokio::test]
async fn submit_rebinds_to_the_store_assigned_id() {
    let (store, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Fix login").await;

    assert_eq!(id, RequestId("REQ-1".to_string()));
    assert_eq!(board.requests()[0].id, id);
    assert!(store.get(&id).await.is_some());
    assert!(!board.has_pending_changes());
}

#[tokio::test]
async fn failed_submit_surfaces_the_error_but_keeps_the_local_copy() {
    let (store, mut board) = board_with_budget(12);
    store.fail_writes(true);

    let error = board
        .submit("Offline entry", None, None, Utc::now())
        .await
        .expect_err("store is down");
    assert!(matches!(error, BoardError::Store(StoreError::Rejected(_))));

    assert_eq!(board.requests().len(), 1);
    assert!(board.requests()[0].id.0.starts_with("local-"));
    assert!(board.has_pending_changes());

    // The unacknowledged record survives a reload even though the store has
    // never seen it.
    store.fail_writes(false);
    board.refresh().await.expect("refresh");
    assert_eq!(board.requests().len(), 1);
}

#[tokio::test]
async fn refresh_prefers_pending_local_changes_over_the_snapshot() {
    let (store, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Shared request").await;

    store.fail_writes(true);
    board.estimate(&id, Decimal::new(2, 0), None).await.expect("local estimate");
    assert!(board.has_pending_changes());

    // The store still holds the pre-estimate version; the snapshot must not
    // clobber the unacknowledged local change.
    store.fail_writes(false);
    board.refresh().await.expect("refresh");

    let request = board.requests().iter().find(|r| r.id == id).expect("on board");
    assert_eq!(request.status, RequestStatus::Estimated);
    assert_eq!(request.estimated_hours, Some(Decimal::new(2, 0)));
}

#[tokio::test]
async fn refresh_drops_records_deleted_by_other_clients() {
    let (store, mut board) = board_with_budget(12);
    let keep = submit(&mut board, "Keep me").await;
    let gone = submit(&mut board, "Delete me").await;

    store.delete_request(&gone).await.expect("other client deletes");
    board.refresh().await.expect("refresh");

    assert_eq!(board.requests().len(), 1);
    assert_eq!(board.requests()[0].id, keep);
}

#[tokio::test]
async fn refresh_adopts_the_stored_month_and_merges_history() {
    let (store, mut board) = board_with_budget(12);
    let january = MonthKey::parse("2025-01").expect("valid month");
    let february = MonthKey::parse("2025-02").expect("valid month");
    store.set_current_month(february.clone()).await;
    store.set_history(january.clone(), Decimal::new(11, 0)).await;

    board.refresh().await.expect("refresh");

    assert_eq!(board.ledger().current_month(), &february);
    assert_eq!(board.ledger().history().get(&january), Some(&Decimal::new(11, 0)));
    assert_eq!(board.budget_summary().month, february);
}

#[tokio::test]
async fn swallowed_update_failures_keep_the_board_usable() {
    let (store, mut board) = board_with_budget(12);
    let id = submit(&mut board, "Flaky network").await;

    store.fail_writes(true);
    board.estimate(&id, Decimal::new(2, 0), None).await.expect("local apply succeeds");
    assert!(!board.is_syncing());
    assert!(board.has_pending_changes());

    // Stored copy is stale, local copy moved on.
    let stored = store.get(&id).await.expect("stored");
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(
        board.requests().iter().find(|r| r.id == id).map(|r| r.status),
        Some(RequestStatus::Estimated)
    );
}

#[tokio::test]
async fn submitted_attachment_round_trips_through_the_store() {
    let (store, mut board) = board_with_budget(12);
    let data = Base64FileEncoder.encode(AttachmentKind::Pdf, b"%PDF-1.4 meeting minutes");

    let id = board
        .submit(
            "With minutes",
            None,
            Some(Attachment { kind: AttachmentKind::Pdf, data: data.clone() }),
            Utc::now(),
        )
        .await
        .expect("submit");
    board
        .estimate(
            &id,
            Decimal::new(2, 0),
            Some(Attachment {
                kind: AttachmentKind::Png,
                data: Base64FileEncoder.encode(AttachmentKind::Png, &[0x89, 0x50, 0x4e, 0x47]),
            }),
        )
        .await
        .expect("estimate");

    let stored = store.get(&id).await.expect("persisted");
    let submitter = stored.submitter_attachment.expect("submitter slot kept");
    assert_eq!(submitter.data, data);
    assert_eq!(submitter.data.kind(), Some(AttachmentKind::Pdf));
    let estimator = stored.estimator_attachment.expect("estimator slot kept");
    assert_eq!(estimator.data.kind(), Some(AttachmentKind::Png));
}

#[tokio::test]
async fn unknown_request_ids_are_rejected() {
    let (_, mut board) = board_with_budget(12);
    let ghost = RequestId("REQ-404".to_string());

    let error = board.delete(&ghost).await.expect_err("unknown id");
    assert!(matches!(error, BoardError::Domain(DomainError::UnknownRequest(_))));

    let error = board
        .add_comment(&ghost, CommentAuthor::Submitter, "hello?", Utc::now())
        .await
        .expect_err("unknown id");
    assert!(matches!(error, BoardError::Domain(DomainError::UnknownRequest(_))));
}

#[tokio::test]
async fn views_split_the_collection_by_status() {
    let (_, mut board) = board_with_budget(12);
    let pending = submit(&mut board, "Pending one").await;
    let estimated = submit_estimated(&mut board, "Estimated one", 2).await;
    let approved = submit_estimated(&mut board, "Approved one", 3).await;
    board.approve(&approved).await.expect("approve");
    let finished = submit_estimated(&mut board, "Finished one", 1).await;
    board.approve(&finished).await.expect("approve");
    board.mark_done(&finished, Utc::now()).await.expect("finish");

    let ids = |requests: Vec<&Request>| -> Vec<RequestId> {
        requests.iter().map(|r| r.id.clone()).collect()
    };

    assert_eq!(ids(board.pending_requests()), vec![pending]);
    assert_eq!(ids(board.estimated_requests()), vec![estimated]);
    assert_eq!(ids(board.approved_requests()), vec![approved]);
    assert_eq!(ids(board.finished_requests()), vec![finished]);
    assert!(board.archived_requests().is_empty());
}
