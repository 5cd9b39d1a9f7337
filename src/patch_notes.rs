//! Patch-note lookup for the launcher's notes pane.

use crate::error::{Rejection, RejectionCause};
use crate::model::null_as_default;
use crate::transport::{GraphQlRequest, GraphQlTransport};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const PATCH_NOTE_QUERY: &str = "query Content($id: String!) { patchNote(id: $id) { id htmlContent utcDisplayStart patchNumber title } }";

pub const NO_PATCH_NOTES: &str = "There are currently no patch notes on this channel.";

const PATCH_NOTE_FAILURE: &str = "Could not get patch notes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNote {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub utc_display_start: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patch_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

impl PatchNote {
    /// `Patch #<number> | "<title>" | <display date>`
    pub fn header(&self) -> String {
        format!(
            "Patch #{} | \"{}\" | {}",
            self.patch_number,
            self.title,
            display_date(&self.utc_display_start)
        )
    }
}

/// Render a UTC timestamp as `M/D/YYYY, h:mm:ss AM`. Text that does not
/// parse is returned unchanged.
pub fn display_date(raw: &str) -> String {
    parse_utc(raw)
        .map(|at| at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// What the notes pane shows for the selected note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchNoteView {
    /// Empty while there is no note.
    pub header: String,
    /// Note HTML, or the "no patch notes" text.
    pub body: String,
    pub note_id: Option<String>,
}

impl From<Option<PatchNote>> for PatchNoteView {
    fn from(note: Option<PatchNote>) -> Self {
        match note {
            Some(note) => Self {
                header: note.header(),
                body: note.html_content,
                note_id: Some(note.id),
            },
            None => Self {
                header: String::new(),
                body: NO_PATCH_NOTES.to_string(),
                note_id: None,
            },
        }
    }
}

impl PatchNoteView {
    /// A different selected id invalidates the loaded note.
    pub fn needs_refetch(current_id: Option<&str>, next_id: &str) -> bool {
        current_id != Some(next_id)
    }
}

/// Fetch one patch note. A `null` note resolves to `None`.
pub async fn fetch_patch_note(
    transport: &dyn GraphQlTransport,
    id: &str,
) -> Result<Option<PatchNote>, Rejection> {
    let request = GraphQlRequest::new(PATCH_NOTE_QUERY)
        .with_variables(json!({ "id": id }))
        .with_operation_name("Content");

    let response = transport.execute(request).await.map_err(|err| {
        let cause = RejectionCause::Transport(err.to_string());
        tracing::warn!(patch_note = %id, cause = %cause, "patch note query failed");
        Rejection::new(PATCH_NOTE_FAILURE, cause)
    })?;

    let Some(note) = response.data.as_ref().and_then(|data| data.get("patchNote")) else {
        let cause = RejectionCause::MissingField("patchNote".to_string());
        tracing::warn!(patch_note = %id, cause = %cause, "patch note query failed");
        return Err(Rejection::new(PATCH_NOTE_FAILURE, cause));
    };
    if note.is_null() {
        tracing::debug!(patch_note = %id, "no patch note for id");
        return Ok(None);
    }

    PatchNote::deserialize(note).map(Some).map_err(|err| {
        let cause = RejectionCause::Malformed(err.to_string());
        tracing::warn!(patch_note = %id, cause = %cause, "patch note query failed");
        Rejection::new(PATCH_NOTE_FAILURE, cause)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> PatchNote {
        PatchNote {
            id: "pn-7".to_string(),
            html_content: "<p>Fixed crafting</p>".to_string(),
            utc_display_start: "2017-06-02T18:21:30Z".to_string(),
            patch_number: "42".to_string(),
            title: "Vox Overhaul".to_string(),
        }
    }

    #[test]
    fn header_formats_number_title_and_date() {
        assert_eq!(
            note().header(),
            "Patch #42 | \"Vox Overhaul\" | 6/2/2017, 6:21:30 PM"
        );
    }

    #[test]
    fn display_date_accepts_offsets_and_naive_times() {
        assert_eq!(display_date("2017-06-02T20:21:30+02:00"), "6/2/2017, 6:21:30 PM");
        assert_eq!(display_date("2017-01-09T08:05:00.000"), "1/9/2017, 8:05:00 AM");
        assert_eq!(display_date("soon"), "soon");
    }

    #[test]
    fn empty_view_shows_placeholder() {
        let view = PatchNoteView::from(None);
        assert!(view.header.is_empty());
        assert_eq!(view.body, NO_PATCH_NOTES);
        assert_eq!(view.note_id, None);
    }

    #[test]
    fn view_carries_note_html() {
        let view = PatchNoteView::from(Some(note()));
        assert_eq!(view.body, "<p>Fixed crafting</p>");
        assert_eq!(view.note_id.as_deref(), Some("pn-7"));
    }

    #[test]
    fn null_display_fields_read_as_empty() {
        let note: PatchNote = serde_json::from_value(json!({
            "id": "pn-8",
            "htmlContent": null,
            "utcDisplayStart": null,
            "patchNumber": "9",
            "title": null
        }))
        .expect("decode");
        assert_eq!(note.header(), "Patch #9 | \"\" | ");
        assert!(note.html_content.is_empty());
    }

    #[test]
    fn refetch_only_on_id_change() {
        assert!(PatchNoteView::needs_refetch(None, "a"));
        assert!(PatchNoteView::needs_refetch(Some("a"), "b"));
        assert!(!PatchNoteView::needs_refetch(Some("a"), "a"));
    }
}
