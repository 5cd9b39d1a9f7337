use crafting_gateway::patch_notes::{
    NO_PATCH_NOTES, PATCH_NOTE_QUERY, PatchNote, PatchNoteView, fetch_patch_note,
};
use serde_json::json;

mod support;
use support::StubTransport;

fn note_data() -> serde_json::Value {
    json!({
        "patchNote": {
            "id": "pn-12",
            "htmlContent": "<h1>Crafting</h1><p>Vox jobs can be cancelled.</p>",
            "utcDisplayStart": "2017-06-11T12:02:49Z",
            "patchNumber": "5.2",
            "title": "Vox Jobs"
        }
    })
}

#[tokio::test(flavor = "current_thread")]
async fn sends_id_as_variable() {
    let transport = StubTransport::with_data(note_data());

    fetch_patch_note(&*transport, "pn-12")
        .await
        .expect("note");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, PATCH_NOTE_QUERY);
    assert_eq!(requests[0].variables, json!({ "id": "pn-12" }));
    assert_eq!(requests[0].operation_name.as_deref(), Some("Content"));
}

#[tokio::test(flavor = "current_thread")]
async fn resolved_note_renders_header_and_body() {
    let transport = StubTransport::with_data(note_data());

    let note = fetch_patch_note(&*transport, "pn-12")
        .await
        .expect("note")
        .expect("present");
    let view = PatchNoteView::from(Some(note.clone()));

    assert_eq!(
        view.header,
        "Patch #5.2 | \"Vox Jobs\" | 6/11/2017, 12:02:49 PM"
    );
    assert_eq!(view.body, note.html_content);
}

#[tokio::test(flavor = "current_thread")]
async fn null_note_shows_placeholder() {
    let transport = StubTransport::with_data(json!({ "patchNote": null }));

    let note = fetch_patch_note(&*transport, "missing")
        .await
        .expect("null is not a failure");
    let view = PatchNoteView::from(note);

    assert_eq!(view.body, NO_PATCH_NOTES);
    assert!(view.header.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn failures_use_fixed_message() {
    let down = StubTransport::failing("connection reset");
    let rejection = fetch_patch_note(&*down, "pn-1").await.unwrap_err();
    assert_eq!(rejection.message(), "Could not get patch notes");
    assert_eq!(rejection.cause().category(), "transport");

    let empty = StubTransport::with_data(json!({}));
    let rejection = fetch_patch_note(&*empty, "pn-1").await.unwrap_err();
    assert_eq!(rejection.message(), "Could not get patch notes");
    assert_eq!(rejection.cause().category(), "missing_field");

    let malformed = StubTransport::with_data(json!({ "patchNote": { "title": "no id" } }));
    let rejection = fetch_patch_note(&*malformed, "pn-1").await.unwrap_err();
    assert_eq!(rejection.cause().category(), "malformed");
}

#[test]
fn header_keeps_unparseable_dates() {
    let note = PatchNote {
        id: "pn-3".to_string(),
        html_content: String::new(),
        utc_display_start: "TBD".to_string(),
        patch_number: "3".to_string(),
        title: "Soon".to_string(),
    };
    assert_eq!(note.header(), "Patch #3 | \"Soon\" | TBD");
}
