//! Sharing state machine: authorization, transitions, snapshot forking, and
//! per-viewer visibility.

use chrono::NaiveDate;
use daygrid_core::{
    authorize, fork_snapshot, visibility, CanonicalEvent, ShareAction, ShareError, ShareStatus,
    SharedEvent, ShareVisibility,
};

fn snapshot() -> CanonicalEvent {
    let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    let mut event = CanonicalEvent::new("e1", "u1", "Dinner", date);
    event.photos = vec!["https://cdn.example/a.jpg".to_owned()];
    event.private_photos = vec!["https://cdn.example/b.jpg".to_owned()];
    event
}

fn pending() -> SharedEvent {
    SharedEvent {
        id: "s1".to_owned(),
        original_event_id: Some("e1".to_owned()),
        shared_by: "u1".to_owned(),
        shared_with: "u2".to_owned(),
        status: ShareStatus::Pending,
        snapshot: snapshot(),
        created_at: None,
        updated_at: None,
    }
}

fn accepted() -> SharedEvent {
    SharedEvent {
        status: ShareStatus::Accepted,
        ..pending()
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn only_the_recipient_may_accept() {
    let share = pending();
    assert!(authorize(&share, "u2", ShareAction::Accept).is_ok());
    assert_eq!(
        authorize(&share, "u1", ShareAction::Accept),
        Err(ShareError::NotRecipient { action: "accept" })
    );
    assert_eq!(
        authorize(&share, "u3", ShareAction::Accept),
        Err(ShareError::NotRecipient { action: "accept" })
    );
}

#[test]
fn only_the_recipient_may_decline() {
    let share = pending();
    assert!(authorize(&share, "u2", ShareAction::Decline).is_ok());
    assert!(matches!(
        authorize(&share, "u1", ShareAction::Decline),
        Err(ShareError::NotRecipient { .. })
    ));
}

#[test]
fn only_the_sender_may_cancel() {
    let share = pending();
    assert!(authorize(&share, "u1", ShareAction::Cancel).is_ok());
    assert_eq!(
        authorize(&share, "u2", ShareAction::Cancel),
        Err(ShareError::NotSender { action: "cancel" })
    );
}

#[test]
fn accept_requires_a_pending_row() {
    let share = accepted();
    assert_eq!(
        authorize(&share, "u2", ShareAction::Accept),
        Err(ShareError::WrongStatus {
            action: "accept",
            status: ShareStatus::Accepted,
            expected: ShareStatus::Pending,
        })
    );
}

#[test]
fn cancel_requires_a_pending_row() {
    let share = accepted();
    assert!(matches!(
        authorize(&share, "u1", ShareAction::Cancel),
        Err(ShareError::WrongStatus { .. })
    ));
}

#[test]
fn retract_requires_an_accepted_row() {
    assert!(authorize(&accepted(), "u2", ShareAction::Retract).is_ok());
    assert!(matches!(
        authorize(&pending(), "u2", ShareAction::Retract),
        Err(ShareError::WrongStatus { .. })
    ));
    assert!(matches!(
        authorize(&accepted(), "u1", ShareAction::Retract),
        Err(ShareError::NotRecipient { .. })
    ));
}

#[test]
fn wrong_status_error_reads_naturally() {
    let err = authorize(&accepted(), "u2", ShareAction::Accept).unwrap_err();
    assert_eq!(err.to_string(), "share is accepted, but accept requires pending");
}

// ---------------------------------------------------------------------------
// Forking
// ---------------------------------------------------------------------------

#[test]
fn fork_reassigns_id_and_owner_and_keeps_everything_else() {
    let share = pending();
    let fork = fork_snapshot(&share, "f1");

    assert_eq!(fork.id, "f1");
    assert_eq!(fork.owner, "u2");
    assert_eq!(fork.title, "Dinner");
    assert_eq!(fork.date, share.snapshot.date);
    assert_eq!(fork.photos, share.snapshot.photos);
    assert_eq!(fork.private_photos, share.snapshot.private_photos);
}

#[test]
fn editing_the_fork_leaves_the_snapshot_untouched() {
    let share = pending();
    let mut fork = fork_snapshot(&share, "f1");

    fork.title = "Dinner (moved)".to_owned();
    fork.photos.clear();

    assert_eq!(share.snapshot.title, "Dinner");
    assert_eq!(share.snapshot.photos.len(), 1);
}

#[test]
fn accepted_marker_is_detected_by_cleared_original_id() {
    let mut share = accepted();
    assert!(!share.is_accepted_marker());
    share.original_event_id = None;
    assert!(share.is_accepted_marker());
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[test]
fn pending_is_sent_pending_for_sender_and_hidden_for_recipient() {
    let share = pending();
    assert_eq!(visibility(&share, "u1"), ShareVisibility::SentPending);
    assert_eq!(visibility(&share, "u2"), ShareVisibility::Hidden);
    assert_eq!(visibility(&share, "u3"), ShareVisibility::Hidden);
}

#[test]
fn accepted_unforked_is_visible_only_to_the_recipient() {
    let share = accepted();
    assert_eq!(visibility(&share, "u2"), ShareVisibility::ReceivedAccepted);
    assert_eq!(visibility(&share, "u1"), ShareVisibility::Hidden);
}

#[test]
fn accepted_marker_is_hidden_everywhere() {
    let mut share = accepted();
    share.original_event_id = None;
    assert_eq!(visibility(&share, "u1"), ShareVisibility::Hidden);
    assert_eq!(visibility(&share, "u2"), ShareVisibility::Hidden);
}

#[test]
fn declined_is_hidden_everywhere() {
    let share = SharedEvent {
        status: ShareStatus::Declined,
        ..pending()
    };
    assert_eq!(visibility(&share, "u1"), ShareVisibility::Hidden);
    assert_eq!(visibility(&share, "u2"), ShareVisibility::Hidden);
}

// ---------------------------------------------------------------------------
// Wire status
// ---------------------------------------------------------------------------

#[test]
fn status_round_trips_through_its_wire_spelling() {
    for status in [ShareStatus::Pending, ShareStatus::Accepted, ShareStatus::Declined] {
        assert_eq!(ShareStatus::from_wire(status.as_wire()), status);
    }
}

#[test]
fn unknown_wire_status_degrades_to_declined() {
    assert_eq!(ShareStatus::from_wire("revoked"), ShareStatus::Declined);
    assert_eq!(ShareStatus::from_wire(""), ShareStatus::Declined);
}
