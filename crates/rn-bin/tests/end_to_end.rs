//! Both session halves wired exactly as the binary wires them,
//! exercising the full insertion round trip: picker insertion on the
//! host, tree mutation on the view, debounced autosave, storage-form
//! persistence with a recomputed manifest.

use note_doc::NoteDocument;
use note_host::FilePicker;
use note_protocol::session_channels;
use note_view::ViewEvent;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

struct FixedPicker(PathBuf);

impl FilePicker for FixedPicker {
    fn pick_image(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

async fn wait_for_note(path: &std::path::Path) -> NoteDocument {
    for _ in 0..100 {
        if let Ok(text) = fs::read_to_string(path) {
            let doc = NoteDocument::parse(&text);
            if !doc.images.is_empty() {
                return doc;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("note was not persisted with an image in time");
}

#[tokio::test]
async fn inserted_image_survives_the_full_round_trip() {
    let ws = tempfile::tempdir().unwrap();
    let note_path = ws.path().join("demo.note");
    let source = ws.path().join("cat.png");
    fs::write(&source, b"catbytes").unwrap();

    let ((view_tx, view_rx), (host_tx, host_rx)) = session_channels();
    let (_watch_tx, watch_rx) = mpsc::channel(4);
    tokio::spawn(note_host::run(
        note_path.clone(),
        Box::new(FixedPicker(source)),
        host_tx,
        view_rx,
        watch_rx,
    ));

    let (events_tx, events_rx) = mpsc::channel(16);
    tokio::spawn(note_view::run(
        view_tx,
        host_rx,
        events_rx,
        Duration::from_millis(100),
        Duration::from_secs(3),
    ));

    events_tx
        .send(ViewEvent::InsertImageRequested)
        .await
        .unwrap();

    let doc = wait_for_note(&note_path).await;
    let stored = doc
        .images
        .get("image_0")
        .expect("manifest entry for the inserted image");
    assert!(stored.starts_with("images/") && stored.ends_with("-cat.png"));
    // Content is at rest in canonical form, with the empty trailing
    // block the insertion procedure leaves for the cursor.
    assert!(doc.content.contains(&format!(r#"src="./{stored}""#)));
    assert!(doc.content.contains("<p><br></p>"));
    assert!(doc.last_modified.is_some());
    // The copied bytes really are next to the note.
    let file_name = stored.strip_prefix("images/").unwrap();
    assert_eq!(
        fs::read(ws.path().join("images").join(file_name)).unwrap(),
        b"catbytes"
    );
}
