mod test_helpers;

use nanochef::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use test_helpers::{photo, ScriptedGateway};

fn edited(data: &str) -> EditResult {
    EditResult {
        text: Some("Done".into()),
        image: Some(ImagePayload::new(data, "image/png")),
    }
}

#[tokio::test]
async fn test_submit_requires_image_and_instruction() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(edited("x"));
    let session = EditSession::new(gateway.clone());

    session.set_instruction("make it pop");
    assert_eq!(session.submit().await, SessionState::Idle);

    session.upload(photo("cat"));
    session.set_instruction("   \t ");
    assert_eq!(session.submit().await, SessionState::Idle);

    assert_eq!(gateway.edit_calls.load(Ordering::SeqCst), 0);
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_submit_success_stores_result() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(edited("edited-bytes"));
    let session = EditSession::new(gateway.clone());
    session.upload(photo("cat"));
    session.set_instruction("add a retro filter");

    assert_eq!(session.submit().await, SessionState::Complete);
    assert_eq!(session.state(), SessionState::Complete);
    assert_eq!(session.result_image().unwrap().data, "edited-bytes");
    assert_eq!(session.result().unwrap().text.as_deref(), Some("Done"));
    assert_eq!(gateway.seen_instructions(), vec!["add a retro filter"]);
}

#[tokio::test]
async fn test_text_only_response_is_an_empty_result_failure() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(EditResult {
        text: Some("I cannot edit this image".into()),
        image: None,
    });
    let session = EditSession::new(gateway);
    session.upload(photo("cat"));
    session.set_instruction("remove the cat");

    assert_eq!(session.submit().await, SessionState::Failed);
    let failure = session.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::EmptyResult);
    assert!(failure.detail.contains("did not return an image"));
    assert_eq!(session.error_message(), Some(EDIT_FAILURE_MESSAGE));
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_transport_failure_is_a_request_failure() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit_failure();
    let session = EditSession::new(gateway);
    session.upload(photo("cat"));
    session.set_instruction("sharpen");

    assert_eq!(session.submit().await, SessionState::Failed);
    assert_eq!(session.failure().unwrap().kind, FailureKind::RequestFailed);
    assert_eq!(session.payload(), Some(photo("cat")));
}

#[tokio::test]
async fn test_resubmit_clears_prior_result_while_pending() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(edited("first"));
    gateway.push_edit(edited("second"));
    let session = EditSession::new(gateway.clone());
    session.upload(photo("cat"));
    session.set_instruction("warmer");
    session.submit().await;

    let gate = gateway.gate_edit();
    let (state, ()) = tokio::join!(session.submit(), async {
        assert_eq!(session.state(), SessionState::Generating);
        assert!(session.result().is_none());
        gate.send(()).unwrap();
    });

    assert_eq!(state, SessionState::Complete);
    assert_eq!(session.result_image().unwrap().data, "second");
}

#[tokio::test]
async fn test_upload_resets_result_and_instruction() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(edited("x"));
    let session = EditSession::new(gateway);
    session.upload(photo("cat"));
    session.set_instruction("blur background");
    session.submit().await;

    session.upload(photo("dog"));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.result().is_none());
    assert_eq!(session.instruction(), "");
    assert_eq!(session.payload(), Some(photo("dog")));
}

#[tokio::test]
async fn test_upload_while_pending_discards_late_edit() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_edit(edited("stale"));
    let gate = gateway.gate_edit();
    let session = EditSession::new(gateway);
    session.upload(photo("cat"));
    session.set_instruction("add snow");

    let (state, ()) = tokio::join!(session.submit(), async {
        session.upload(photo("dog"));
        gate.send(()).unwrap();
    });

    assert_eq!(state, SessionState::Idle);
    assert!(session.result().is_none());
    assert!(session.failure().is_none());
}

#[tokio::test]
async fn test_clear_drops_image_and_instruction() {
    let gateway = Arc::new(ScriptedGateway::new());
    let session = EditSession::new(gateway);
    session.upload(photo("cat"));
    session.set_instruction("sepia");

    session.clear();
    assert!(session.payload().is_none());
    assert!(session.preview_url().is_none());
    assert_eq!(session.instruction(), "");
    assert_eq!(session.state(), SessionState::Idle);
}
