mod test_helpers;

use nanochef::*;
use std::sync::Arc;
use test_helpers::{photo, recipes, ScriptedGateway};

const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn studio(gateway: &Arc<ScriptedGateway>, policy: IntakePolicy) -> Studio {
    Studio::new(gateway.clone(), ImageIntake::new(policy))
}

#[test]
fn test_mode_parsing() {
    assert_eq!("chef".parse::<Mode>(), Ok(Mode::Chef));
    assert_eq!("Edit".parse::<Mode>(), Ok(Mode::Editor));
    assert!("paint".parse::<Mode>().is_err());
}

#[tokio::test]
async fn test_upload_goes_to_active_mode_only() {
    let gateway = Arc::new(ScriptedGateway::new());
    let mut studio = studio(&gateway, IntakePolicy::Silent);
    assert_eq!(studio.mode(), Mode::Chef);

    studio.upload(photo("fridge"));
    assert!(studio.chef().payload().is_some());
    assert!(studio.editor().payload().is_none());

    studio.set_mode(Mode::Editor);
    studio.upload(photo("portrait"));
    assert_eq!(studio.editor().payload(), Some(photo("portrait")));
    assert_eq!(studio.chef().payload(), Some(photo("fridge")));
}

#[tokio::test]
async fn test_switching_modes_keeps_session_state() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_recipes(recipes(&["A", "B"]));
    let mut studio = studio(&gateway, IntakePolicy::Silent);

    studio.upload(photo("fridge"));
    studio.chef().generate().await;
    studio.chef().advance();

    studio.set_mode(Mode::Editor);
    assert_eq!(studio.active_state(), SessionState::Idle);
    studio.set_mode(Mode::Chef);
    assert_eq!(studio.active_state(), SessionState::Complete);
    assert_eq!(studio.chef().cursor(), Some(1));
}

#[tokio::test]
async fn test_upload_file_resets_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pantry.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();

    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_recipes(recipes(&["A"]));
    let studio = studio(&gateway, IntakePolicy::Silent);
    studio.upload(photo("fridge"));
    studio.chef().generate().await;

    assert!(studio.upload_file(&path).await.unwrap());
    assert_eq!(studio.active_state(), SessionState::Idle);
    assert!(studio.chef().recipes().is_empty());
    assert_eq!(
        studio.chef().payload().unwrap().content_type,
        "image/png"
    );
}

#[tokio::test]
async fn test_non_image_file_leaves_session_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopping.txt");
    std::fs::write(&path, "milk").unwrap();

    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_recipes(recipes(&["A"]));
    let studio = studio(&gateway, IntakePolicy::Silent);
    studio.upload(photo("fridge"));
    studio.chef().generate().await;

    assert!(!studio.upload_file(&path).await.unwrap());
    assert_eq!(studio.active_state(), SessionState::Complete);
    assert_eq!(studio.chef().recipes().len(), 1);

    let strict = Studio::new(gateway.clone(), ImageIntake::new(IntakePolicy::Strict));
    assert!(matches!(
        strict.upload_file(&path).await,
        Err(NanoChefError::IntakeRejected(_))
    ));
}

#[tokio::test]
async fn test_clear_only_affects_active_mode() {
    let gateway = Arc::new(ScriptedGateway::new());
    let mut studio = studio(&gateway, IntakePolicy::Silent);
    studio.upload(photo("fridge"));
    studio.set_mode(Mode::Editor);
    studio.upload(photo("portrait"));

    studio.clear();
    assert!(studio.editor().payload().is_none());
    assert!(studio.chef().payload().is_some());
}
