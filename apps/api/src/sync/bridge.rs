//! The synchronization bridge as a pure reducer.
//!
//! Each validated draft replaces exactly one section of the canonical
//! document. Per-section generations reject results that arrive after a newer
//! draft of the same section has already been merged.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Photo, ResumeDocument};
use crate::editor::{Generation, SectionDraft, SectionKind};

pub type Revision = u64;

/// A section draft that passed validation, tagged with the editor generation
/// it was taken at.
#[derive(Debug, Clone)]
pub struct ValidatedDraft {
    pub generation: Generation,
    pub draft: SectionDraft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    Merged {
        revision: Revision,
    },
    /// Accepted, but the document came out identical; nothing is published.
    Unchanged {
        revision: Revision,
    },
    Stale {
        section: SectionKind,
        generation: Generation,
        latest: Generation,
    },
}

impl MergeOutcome {
    pub fn revision(&self) -> Option<Revision> {
        match self {
            MergeOutcome::Merged { revision } | MergeOutcome::Unchanged { revision } => {
                Some(*revision)
            }
            MergeOutcome::Stale { .. } => None,
        }
    }
}

/// What readers see: a whole document at a revision, never a partial merge.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub revision: Revision,
    pub document: Arc<ResumeDocument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPhoto {
    pub token: Uuid,
    pub url: String,
}

/// Sent back by the save path once the persistence collaborator answered.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveConfirmation {
    pub id: Uuid,
    pub stored_photo: Option<StoredPhoto>,
}

#[derive(Debug)]
pub struct SyncBridge {
    document: Arc<ResumeDocument>,
    revision: Revision,
    applied: HashMap<SectionKind, Generation>,
    /// Only the latest upload matters: a draft still carrying an older
    /// pending photo was taken before a newer personal-info draft and is stale.
    stored_photo: Option<StoredPhoto>,
}

impl SyncBridge {
    pub fn new(document: ResumeDocument) -> Self {
        Self {
            document: Arc::new(document),
            revision: 0,
            applied: HashMap::new(),
            stored_photo: None,
        }
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            revision: self.revision,
            document: Arc::clone(&self.document),
        }
    }

    pub fn merge(&mut self, validated: ValidatedDraft) -> MergeOutcome {
        let section = validated.draft.kind();
        let latest = self.applied.get(&section).copied().unwrap_or(0);
        if validated.generation <= latest {
            debug!(
                "Discarding stale {section} draft (generation {} <= {latest})",
                validated.generation
            );
            return MergeOutcome::Stale {
                section,
                generation: validated.generation,
                latest,
            };
        }
        self.applied.insert(section, validated.generation);

        let mut next = validated.draft.apply_to(&self.document);
        self.substitute_stored_photo(&mut next);
        self.replace(next, section.as_str())
    }

    /// Applies the persistence collaborator's answer: the real id, and the
    /// stored URL for the photo payload that was uploaded.
    pub fn confirm_saved(&mut self, confirmation: SaveConfirmation) -> MergeOutcome {
        if let Some(stored) = confirmation.stored_photo {
            self.stored_photo = Some(stored);
        }
        let mut next = ResumeDocument::clone(&self.document);
        next.id = Some(confirmation.id);
        self.substitute_stored_photo(&mut next);
        self.replace(next, "save confirmation")
    }

    /// A draft taken before the upload finished still carries the pending
    /// payload; once its token is known to be stored, the URL wins.
    fn substitute_stored_photo(&self, document: &mut ResumeDocument) {
        let stored = match (&document.personal.photo, &self.stored_photo) {
            (Some(Photo::Pending(pending)), Some(stored)) if pending.token == stored.token => stored,
            _ => return,
        };
        document.personal.photo = Some(Photo::Url {
            url: stored.url.clone(),
        });
    }

    fn replace(&mut self, next: ResumeDocument, source: &str) -> MergeOutcome {
        if next == *self.document {
            return MergeOutcome::Unchanged {
                revision: self.revision,
            };
        }
        self.document = Arc::new(next);
        self.revision += 1;
        debug!("Merged {source} into revision {}", self.revision);
        MergeOutcome::Merged {
            revision: self.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::document::{IdMinter, KeyedList, PendingPhoto, PersonalInfo, Project};

    fn validated(generation: Generation, draft: SectionDraft) -> ValidatedDraft {
        ValidatedDraft { generation, draft }
    }

    fn projects(names: &[&str]) -> SectionDraft {
        let ids = IdMinter::new();
        SectionDraft::Projects(KeyedList::from_values(
            names.iter().map(|name| Project {
                name: Some(name.to_string()),
                ..Default::default()
            }),
            &ids,
        ))
    }

    fn skills(values: &[&str]) -> SectionDraft {
        SectionDraft::Skills(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_merge_order_across_sections_does_not_matter() {
        let mut a = SyncBridge::new(ResumeDocument::default());
        a.merge(validated(1, skills(&["Rust"])));
        a.merge(validated(1, projects(&["vitae"])));

        let mut b = SyncBridge::new(ResumeDocument::default());
        b.merge(validated(1, projects(&["vitae"])));
        b.merge(validated(1, skills(&["Rust"])));

        assert_eq!(a.snapshot().document, b.snapshot().document);
        assert_eq!(a.snapshot().revision, 2);
    }

    #[test]
    fn test_merge_carries_sibling_sections_over() {
        let mut bridge = SyncBridge::new(ResumeDocument {
            summary: Some("Keep me".to_string()),
            ..Default::default()
        });
        bridge.merge(validated(1, skills(&["Rust"])));
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.document.summary.as_deref(), Some("Keep me"));
        assert_eq!(snapshot.document.skills, vec!["Rust"]);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut bridge = SyncBridge::new(ResumeDocument::default());
        // The newer validation resolves first.
        let newer = bridge.merge(validated(2, skills(&["Rust", "Go"])));
        let older = bridge.merge(validated(1, skills(&["Rust"])));

        assert_eq!(newer, MergeOutcome::Merged { revision: 1 });
        assert_eq!(
            older,
            MergeOutcome::Stale {
                section: SectionKind::Skills,
                generation: 1,
                latest: 2,
            }
        );
        assert_eq!(bridge.snapshot().document.skills, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_identical_merge_is_not_published() {
        let mut bridge = SyncBridge::new(ResumeDocument::default());
        bridge.merge(validated(1, projects(&["a", "b"])));
        let outcome = bridge.merge(validated(2, projects(&["a", "b"])));
        assert_eq!(outcome, MergeOutcome::Unchanged { revision: 1 });
    }

    #[test]
    fn test_snapshots_are_not_affected_by_later_merges() {
        let mut bridge = SyncBridge::new(ResumeDocument::default());
        let before = bridge.snapshot();
        bridge.merge(validated(1, skills(&["Rust"])));
        assert!(before.document.skills.is_empty());
    }

    #[test]
    fn test_confirmed_photo_replaces_pending_payload() {
        let photo = PendingPhoto::new("me.png", "image/png", Bytes::from_static(b"png"));
        let personal = |first_name: &str| {
            SectionDraft::PersonalInfo(PersonalInfo {
                photo: Some(Photo::Pending(photo.clone())),
                first_name: Some(first_name.to_string()),
                ..Default::default()
            })
        };

        let mut bridge = SyncBridge::new(ResumeDocument::default());
        bridge.merge(validated(1, personal("Ada")));

        let id = Uuid::new_v4();
        let url = "https://cdn.example.com/me.png".to_string();
        bridge.confirm_saved(SaveConfirmation {
            id,
            stored_photo: Some(StoredPhoto {
                token: photo.token,
                url: url.clone(),
            }),
        });
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.document.id, Some(id));
        assert_eq!(snapshot.document.personal.photo, Some(Photo::Url { url: url.clone() }));

        // An edit drafted before the upload finished still holds the payload.
        bridge.merge(validated(2, personal("Ada Lovelace")));
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.document.personal.photo, Some(Photo::Url { url }));
        assert_eq!(snapshot.document.personal.first_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(snapshot.document.id, Some(id));
    }

    #[test]
    fn test_only_latest_stored_photo_is_remembered() {
        let first = PendingPhoto::new("a.png", "image/png", Bytes::from_static(b"a"));
        let second = PendingPhoto::new("b.png", "image/png", Bytes::from_static(b"b"));
        let personal = |photo: &PendingPhoto| {
            SectionDraft::PersonalInfo(PersonalInfo {
                photo: Some(Photo::Pending(photo.clone())),
                ..Default::default()
            })
        };
        let confirm = |bridge: &mut SyncBridge, photo: &PendingPhoto| {
            bridge.confirm_saved(SaveConfirmation {
                id: Uuid::nil(),
                stored_photo: Some(StoredPhoto {
                    token: photo.token,
                    url: format!("https://cdn.example.com/{}", photo.token),
                }),
            });
        };

        let mut bridge = SyncBridge::new(ResumeDocument::default());
        bridge.merge(validated(1, personal(&first)));
        confirm(&mut bridge, &first);
        bridge.merge(validated(2, personal(&second)));
        confirm(&mut bridge, &second);

        assert_eq!(
            bridge.stored_photo.as_ref().map(|stored| stored.token),
            Some(second.token)
        );
        bridge.merge(validated(3, personal(&first)));
        assert!(matches!(
            bridge.snapshot().document.personal.photo,
            Some(Photo::Pending(ref pending)) if pending.token == first.token
        ));
    }
}
