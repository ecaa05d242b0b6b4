//! Token access gateway integration tests
//!
//! Covers:
//! - malformed and unknown tokens are indistinguishable
//! - reads never mutate

use valentine::error::{AppError, INVALID_LINK_MESSAGE};
use valentine::models::invite::InviteStatus;
use valentine::services::gateway::find_followup;
use valentine::services::invites::FollowupDraft;

mod common;
use common::{answer_draft, create_test_student, create_test_user, invite_draft, TestHarness};

fn assert_invalid_link(err: AppError) {
    match err {
        AppError::NotFound(msg) => assert_eq!(msg, INVALID_LINK_MESSAGE),
        other => panic!("expected uniform not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_and_unknown_tokens_look_the_same() {
    let h = TestHarness::new().await;
    let gateway = h.state.invites.gateway();

    let not_hex = "z".repeat(48);
    let unknown = "0".repeat(48);
    for token in ["", "short", "../../etc/passwd", not_hex.as_str(), unknown.as_str()] {
        assert_invalid_link(gateway.resolve(token).await.unwrap_err());
    }
}

#[tokio::test]
async fn test_repeated_reads_never_mutate() {
    let h = TestHarness::new().await;
    let sender = create_test_user(&h.db, "sender@example.com", "Sam").await;
    let recipient = create_test_student(&h.db, "Riya", Some("riya@example.com"), None).await;
    let invite = h
        .state
        .invites
        .create(&sender, recipient.id, &invite_draft())
        .await
        .unwrap();
    h.state
        .invites
        .respond(&invite.secret_token, &answer_draft("yes", "followup"))
        .await
        .unwrap();
    h.state
        .invites
        .request_followup(
            &sender,
            invite.id,
            &FollowupDraft {
                message: Some("Library?".to_string()),
            },
        )
        .await
        .unwrap();
    h.settle().await;

    let before = h.reload(invite.id).await;
    let mails_before = h.mail.sent().len();
    for _ in 0..5 {
        let (read, student) = h
            .state
            .invites
            .gateway()
            .resolve_with_recipient(&invite.secret_token)
            .await
            .unwrap();
        assert_eq!(student.id, recipient.id);
        assert_eq!(read, before);
    }
    h.settle().await;

    let after = h.reload(invite.id).await;
    assert_eq!(after, before);
    assert_eq!(after.status, InviteStatus::Accepted);
    assert_eq!(h.mail.sent().len(), mails_before);
}

#[tokio::test]
async fn test_followup_ids_resolve_only_under_their_invite() {
    let h = TestHarness::new().await;
    let sender = create_test_user(&h.db, "sender@example.com", "Sam").await;
    let riya = create_test_student(&h.db, "Riya", Some("riya@example.com"), None).await;
    let arjun = create_test_student(&h.db, "Arjun", Some("arjun@example.com"), None).await;

    let with_followup = h
        .state
        .invites
        .create(&sender, riya.id, &invite_draft())
        .await
        .unwrap();
    let other = h
        .state
        .invites
        .create(&sender, arjun.id, &invite_draft())
        .await
        .unwrap();
    h.state
        .invites
        .respond(&with_followup.secret_token, &answer_draft("yes", "followup"))
        .await
        .unwrap();
    let followup = h
        .state
        .invites
        .request_followup(
            &sender,
            with_followup.id,
            &FollowupDraft {
                message: Some("Library?".to_string()),
            },
        )
        .await
        .unwrap();

    let owner = h.reload(with_followup.id).await;
    assert_eq!(
        find_followup(&owner, &followup.id.to_string()).unwrap().id,
        followup.id
    );

    let other = h.reload(other.id).await;
    assert_invalid_link(find_followup(&other, &followup.id.to_string()).unwrap_err());
    assert_invalid_link(find_followup(&owner, "not-a-uuid").unwrap_err());

    let err = h
        .state
        .invites
        .respond_to_followup(&other.secret_token, &followup.id.to_string(), &Default::default())
        .await
        .unwrap_err();
    assert_invalid_link(err);
}
