mod common;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use common::{
    InstantOutput, RecordingTransport, client_with, inline_response, png_bytes, text_response,
};
use tokio::sync::Semaphore;
use wojtek_core::persona::GREETING;
use wojtek_core::storage::KeyValueStore;
use wojtek_core::{ImageSlot, MessageRole, PersonaMode, WojtekError};
use wojtek_infrastructure::{JsonFileStore, MemoryStore};
use wojtek_infrastructure::storage::json_file_store::RELOAD_INTERVAL;
use wojtek_interaction::{
    ChatSession, ERROR_REPLY, Gallery, ImageOrigin, SpeechController, SpeechOutcome,
};
use wojtek_media::{ImagePipeline, PlaybackAdapter};

#[tokio::test]
async fn test_chat_opens_with_greeting_and_maps_errors() {
    let transport = Arc::new(RecordingTransport::new());
    transport.respond(text_response("Nie ucz się. Zrób reset."));
    transport.fail(WojtekError::transport(Some(500), "INTERNAL"));
    let mut session = ChatSession::new(client_with(transport.clone(), Some("test-key")));

    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].text, GREETING);
    assert_eq!(session.messages()[0].role, MessageRole::Model);

    let reply = session.send("  Mam egzamin jutro  ").await.unwrap();
    assert_eq!(reply.text, "Nie ucz się. Zrób reset.");
    // Whitespace only decides emptiness; the text goes out as typed.
    assert_eq!(session.messages()[1].text, "  Mam egzamin jutro  ");
    let (_, request) = &transport.calls()[0];
    assert_eq!(request.contents[0].joined_text(), "  Mam egzamin jutro  ");

    let reply = session.send("A teraz?").await.unwrap();
    assert_eq!(reply.text, ERROR_REPLY);
    assert_eq!(session.messages().len(), 5);
}

#[tokio::test]
async fn test_chat_ignores_blank_input_and_toggles_mode() {
    let transport = Arc::new(RecordingTransport::new());
    let mut session = ChatSession::new(client_with(transport.clone(), Some("test-key")));

    assert!(session.send("   ").await.is_none());
    assert_eq!(session.messages().len(), 1);
    assert_eq!(transport.call_count(), 0);

    assert_eq!(session.mode(), PersonaMode::Demotivation);
    assert_eq!(session.toggle_mode(), PersonaMode::Storytelling);
    assert_eq!(session.toggle_mode(), PersonaMode::Demotivation);
}

fn speech_controller(transport: Arc<RecordingTransport>, output: Arc<InstantOutput>) -> SpeechController {
    SpeechController::new(
        client_with(transport, Some("test-key")),
        PlaybackAdapter::new(output),
    )
}

#[tokio::test]
async fn test_rapid_speak_triggers_send_one_request() {
    let gate = Arc::new(Semaphore::new(0));
    let transport = Arc::new(RecordingTransport::gated(gate.clone()));
    // 3 mono frames
    transport.respond(inline_response("audio/pcm", "AQACAAMA"));
    let output = Arc::new(InstantOutput::default());
    let speech = Arc::new(speech_controller(transport.clone(), output.clone()));

    let first = tokio::spawn({
        let speech = speech.clone();
        async move { speech.speak_message(3, "Siema").await }
    });
    transport.wait_for_calls(1).await;
    assert!(speech.is_speaking(3));

    assert_eq!(
        speech.speak_message(3, "Siema").await,
        SpeechOutcome::AlreadySpeaking
    );

    gate.add_permits(1);
    assert_eq!(first.await.unwrap(), SpeechOutcome::Played);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(output.started(), vec![3]);
    assert!(!speech.is_speaking(3));
}

#[tokio::test]
async fn test_speech_strips_asterisks_and_is_silent_without_audio() {
    let transport = Arc::new(RecordingTransport::new());
    transport.respond(text_response("no audio"));
    let output = Arc::new(InstantOutput::default());
    let speech = speech_controller(transport.clone(), output.clone());

    let outcome = speech.speak_message(0, ERROR_REPLY).await;
    assert_eq!(outcome, SpeechOutcome::Silent);
    assert!(output.started().is_empty());

    let (_, request) = &transport.calls()[0];
    let sent = request.contents[0].joined_text();
    assert!(sent.ends_with("Wojtek ma Kopfschmerzen. Reset!"));
    assert!(!sent.contains('*'));
}

#[tokio::test]
async fn test_speech_without_key_makes_no_request() {
    let transport = Arc::new(RecordingTransport::new());
    let output = Arc::new(InstantOutput::default());
    let speech = SpeechController::new(
        client_with(transport.clone(), None),
        PlaybackAdapter::new(output.clone()),
    );

    assert_eq!(speech.speak("Reset").await, SpeechOutcome::Silent);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_speech_errors_are_swallowed() {
    let transport = Arc::new(RecordingTransport::new());
    transport.fail(WojtekError::transport(None, "connection reset"));
    transport.respond(inline_response("audio/pcm", "not base64 at all!"));
    let output = Arc::new(InstantOutput::default());
    let speech = speech_controller(transport.clone(), output.clone());

    assert_eq!(speech.speak_message(1, "a").await, SpeechOutcome::Failed);
    // A failed message can be retried.
    assert_eq!(speech.speak_message(1, "a").await, SpeechOutcome::Failed);
    assert_eq!(transport.call_count(), 2);
    assert!(output.started().is_empty());
}

#[tokio::test]
async fn test_uploaded_image_is_shown_by_gallery() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(dir.path().join("local_storage.json"), None)
            .await
            .unwrap(),
    );
    let pipeline = ImagePipeline::new(store.clone()).await.unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let gallery = Gallery::new(client_with(transport.clone(), Some("test-key")), pipeline)
        .with_asset_dir(dir.path());

    gallery
        .pipeline()
        .upload(ImageSlot::Szaszlyk, png_bytes(1600, 1200))
        .await
        .unwrap();

    let shown = gallery.resolve(ImageSlot::Szaszlyk).await;
    assert_eq!(shown.origin, ImageOrigin::Uploaded);
    assert_eq!(shown.label(), "Twoja Legenda");
    let uri = shown.data_uri().unwrap();
    assert_eq!(uri.mime_type(), "image/jpeg");

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(uri.payload())
        .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 450));

    // Stored images are never regenerated.
    let again = gallery.generate(ImageSlot::Szaszlyk).await;
    assert_eq!(again.source, shown.source);
    assert_eq!(transport.call_count(), 0);
    assert_eq!(gallery.avatar().source, shown.source);

    // The other slot is untouched.
    assert_eq!(gallery.current(ImageSlot::Egzamin).origin, ImageOrigin::Default);
}

#[tokio::test]
async fn test_missing_default_image_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::new());
    transport.respond(inline_response("image/png", "R0VO"));
    let gallery = Gallery::new(
        client_with(transport.clone(), Some("test-key")),
        ImagePipeline::new(store).await.unwrap(),
    )
    .with_asset_dir(dir.path());

    let image = gallery.resolve(ImageSlot::Egzamin).await;
    assert_eq!(image.origin, ImageOrigin::Generated);
    assert_eq!(image.source, "data:image/png;base64,R0VO");

    // Cached for the session.
    let again = gallery.resolve(ImageSlot::Egzamin).await;
    assert_eq!(again.source, image.source);
    assert_eq!(transport.call_count(), 1);

    let (_, request) = &transport.calls()[0];
    assert!(request.contents[0].joined_text().contains("exam hall"));
}

#[tokio::test]
async fn test_existing_default_image_is_not_generated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input_file_0.png"), png_bytes(4, 4)).unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let gallery = Gallery::new(
        client_with(transport.clone(), Some("test-key")),
        ImagePipeline::new(Arc::new(MemoryStore::new())).await.unwrap(),
    )
    .with_asset_dir(dir.path());

    let image = gallery.resolve(ImageSlot::Szaszlyk).await;
    assert_eq!(image.origin, ImageOrigin::Default);
    assert_eq!(image.label(), "Wizja Wojtka");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_default_image_paths_have_no_doubled_dot_prefix() {
    let transport = Arc::new(RecordingTransport::new());
    let client = client_with(transport, Some("test-key"));

    let gallery = Gallery::new(
        client.clone(),
        ImagePipeline::new(Arc::new(MemoryStore::new())).await.unwrap(),
    );
    assert_eq!(gallery.current(ImageSlot::Szaszlyk).source, "./input_file_0.png");
    assert_eq!(gallery.current(ImageSlot::Egzamin).source, "./input_file_1.png");

    let dir = tempfile::tempdir().unwrap();
    let gallery = Gallery::new(
        client,
        ImagePipeline::new(Arc::new(MemoryStore::new())).await.unwrap(),
    )
    .with_asset_dir(dir.path());
    let expected = dir.path().join("input_file_1.png");
    assert_eq!(
        gallery.current(ImageSlot::Egzamin).source,
        expected.to_string_lossy()
    );
}

#[tokio::test]
async fn test_generation_failure_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let gallery = Gallery::new(
        client_with(transport.clone(), None),
        ImagePipeline::new(Arc::new(MemoryStore::new())).await.unwrap(),
    )
    .with_asset_dir(dir.path());

    let image = gallery.resolve(ImageSlot::Szaszlyk).await;
    assert_eq!(image.origin, ImageOrigin::Default);
    assert!(image.source.ends_with("input_file_0.png"));
    assert!(!gallery.is_generating(ImageSlot::Szaszlyk));
}

#[tokio::test]
async fn test_concurrent_generation_for_one_slot_runs_once() {
    let gate = Arc::new(Semaphore::new(0));
    let transport = Arc::new(RecordingTransport::gated(gate.clone()));
    transport.respond(inline_response("image/png", "T05F"));
    let gallery = Arc::new(Gallery::new(
        client_with(transport.clone(), Some("test-key")),
        ImagePipeline::new(Arc::new(MemoryStore::new())).await.unwrap(),
    ));

    let first = tokio::spawn({
        let gallery = gallery.clone();
        async move { gallery.generate(ImageSlot::Szaszlyk).await }
    });
    transport.wait_for_calls(1).await;
    assert!(gallery.is_generating(ImageSlot::Szaszlyk));

    let second = gallery.generate(ImageSlot::Szaszlyk).await;
    assert_eq!(second.origin, ImageOrigin::Default);

    gate.add_permits(1);
    assert_eq!(first.await.unwrap().origin, ImageOrigin::Generated);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_watch_storage_refreshes_previews() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let gallery = Gallery::new(
        client_with(transport, Some("test-key")),
        ImagePipeline::new(store.clone()).await.unwrap(),
    );
    let watcher = gallery.watch_storage();
    let mut previews = gallery.pipeline().subscribe_previews();

    store
        .set("user_egzamin", "data:image/jpeg;base64,RVhU")
        .await
        .unwrap();

    tokio::time::timeout(
        Duration::from_secs(2),
        previews.wait_for(|p| p.contains_key(&ImageSlot::Egzamin)),
    )
    .await
    .expect("preview should refresh")
    .unwrap();

    let shown = gallery.current(ImageSlot::Egzamin);
    assert_eq!(shown.origin, ImageOrigin::Uploaded);
    assert_eq!(shown.source, "data:image/jpeg;base64,RVhU");
    watcher.abort();
}

#[tokio::test]
async fn test_upload_from_another_process_reaches_gallery() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    let ours = Arc::new(JsonFileStore::open(&path, None).await.unwrap());
    let theirs = JsonFileStore::open(&path, None).await.unwrap();

    let transport = Arc::new(RecordingTransport::new());
    let gallery = Gallery::new(
        client_with(transport, Some("test-key")),
        ImagePipeline::new(ours.clone()).await.unwrap(),
    );
    let reload = JsonFileStore::watch(&ours, Duration::from_millis(20));
    let watcher = gallery.watch_storage();
    let mut previews = gallery.pipeline().subscribe_previews();
    assert_eq!(gallery.avatar().origin, ImageOrigin::Default);

    theirs
        .set("user_szaszlyk", "data:image/jpeg;base64,T1RIRVI=")
        .await
        .unwrap();

    tokio::time::timeout(
        RELOAD_INTERVAL * 5,
        previews.wait_for(|p| p.contains_key(&ImageSlot::Szaszlyk)),
    )
    .await
    .expect("reload should pick up the other handle's write")
    .unwrap();

    let avatar = gallery.avatar();
    assert_eq!(avatar.origin, ImageOrigin::Uploaded);
    assert_eq!(avatar.source, "data:image/jpeg;base64,T1RIRVI=");
    reload.abort();
    watcher.abort();
}
