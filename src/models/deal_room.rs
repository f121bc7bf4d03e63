// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Deal room documents and the audit log of who looked at them.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Document grouping shown in the deal room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DocumentCategory {
    FundOverview,
    Financials,
    Legal,
    Presentations,
    Research,
    Other,
}

/// Icon the front-end renders next to a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IconType {
    Pdf,
    Spreadsheet,
    Presentation,
    Document,
    Video,
    Link,
}

/// Deal room document metadata stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DealRoomDocument {
    /// Document ID (also used as Firestore document ID)
    pub id: String,
    pub title: String,
    pub category: DocumentCategory,
    pub icon_type: IconType,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Locked documents are listed publicly without their links
    #[serde(default)]
    pub is_locked: bool,
    /// Display rank, ascending
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl DealRoomDocument {
    /// Copy suitable for the public listing: locked documents keep their
    /// metadata but lose every link.
    pub fn for_public_listing(mut self) -> Self {
        if self.is_locked {
            self.file_url = None;
            self.external_url = None;
            self.pdf_url = None;
        }
        self
    }
}

/// Order documents for display: `sort_order` ascending, then title.
pub fn sort_for_display(documents: &mut [DealRoomDocument]) {
    documents.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.title.cmp(&b.title))
    });
}

/// What a visitor did with a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DealRoomAction {
    View,
    Download,
    Share,
}

/// Append-only deal room audit event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealRoomActivity {
    /// Event ID (also used as Firestore document ID)
    pub id: String,
    pub email: String,
    pub name: String,
    pub action: DealRoomAction,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    pub timestamp: String,
    pub ip_address: String,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, sort_order: i32) -> DealRoomDocument {
        DealRoomDocument {
            id: title.to_lowercase(),
            title: title.to_string(),
            category: DocumentCategory::Other,
            icon_type: IconType::Pdf,
            file_url: None,
            external_url: None,
            pdf_url: None,
            is_locked: false,
            sort_order,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_sort_for_display() {
        let mut docs = vec![doc("Term Sheet", 2), doc("Deck", 1), doc("Audit", 2)];
        sort_for_display(&mut docs);
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Deck", "Audit", "Term Sheet"]);
    }

    #[test]
    fn test_locked_document_loses_links() {
        let mut locked = doc("LPA", 1);
        locked.is_locked = true;
        locked.file_url = Some("https://files.example.com/lpa.docx".to_string());
        locked.pdf_url = Some("https://files.example.com/lpa.pdf".to_string());

        let public = locked.for_public_listing();
        assert!(public.is_locked);
        assert_eq!(public.title, "LPA");
        assert!(public.file_url.is_none() && public.pdf_url.is_none());

        let mut open = doc("Deck", 2);
        open.file_url = Some("https://files.example.com/deck.pdf".to_string());
        assert_eq!(open.clone().for_public_listing(), open);
    }

    #[test]
    fn test_enums_are_closed() {
        let ok: Result<DocumentCategory, _> = serde_json::from_str("\"fund_overview\"");
        assert_eq!(ok.unwrap(), DocumentCategory::FundOverview);

        let bad: Result<IconType, _> = serde_json::from_str("\"hologram\"");
        assert!(bad.is_err());
    }
}
