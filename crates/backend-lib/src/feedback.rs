// ============================
// portfolio-backend-lib/src/feedback.rs
// ============================
//! Visitor feedback: append-only, listed newest first.
use metrics::counter;
use portfolio_common::{FeedbackEntry, FeedbackForm};
use serde_json::Value;
use tracing::info;

use crate::metrics::FEEDBACK_SUBMITTED;
use crate::storage::{Gateway, Record, SqlParam, StoreError};

const COLUMNS: [&str; 3] = ["name", "email", "comment"];

/// Store one comment and return its generated id, if the backend reports one
pub async fn submit(gateway: &dyn Gateway, form: FeedbackForm) -> Result<Option<i64>, StoreError> {
    let columns: Vec<String> = COLUMNS.iter().map(ToString::to_string).collect();
    let row = vec![
        SqlParam::from(form.name),
        SqlParam::from(form.email),
        SqlParam::from(form.comment),
    ];

    let id = gateway
        .insert_rows("feedback", &columns, vec![row])
        .await
        .pop()
        .unwrap_or(Ok(None))?;

    counter!(FEEDBACK_SUBMITTED).increment(1);
    info!(comment_id = ?id, "feedback stored");
    Ok(id)
}

/// Every comment, highest `comment_id` first
pub async fn list(gateway: &dyn Gateway) -> Vec<FeedbackEntry> {
    gateway
        .query("SELECT * FROM feedback ORDER BY comment_id DESC", &[])
        .await
        .iter()
        .filter_map(entry_from)
        .collect()
}

fn entry_from(row: &Record) -> Option<FeedbackEntry> {
    let text = |column: &str| row.get(column).and_then(Value::as_str).map(str::to_string);
    Some(FeedbackEntry {
        comment_id: row.get("comment_id").and_then(Value::as_i64)?,
        name: text("name"),
        email: text("email"),
        comment: text("comment"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_maps_to_entry() {
        let Value::Object(row) = json!({
            "comment_id": 4,
            "name": "Ada",
            "email": null,
            "comment": "Nice site",
        }) else {
            unreachable!()
        };

        let entry = entry_from(&row).unwrap();
        assert_eq!(entry.comment_id, 4);
        assert_eq!(entry.name.as_deref(), Some("Ada"));
        assert_eq!(entry.email, None);
    }

    #[test]
    fn row_without_id_is_skipped() {
        let Value::Object(row) = json!({"name": "Ada"}) else {
            unreachable!()
        };
        assert!(entry_from(&row).is_none());
    }
}
