use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::document::{IdMinter, Photo, ResumeDocument};
use crate::editor::photo::{PhotoPreview, PhotoPreviews};
use crate::editor::section::{SectionDraft, SectionKind};
use crate::editor::validation::{FieldError, SectionReport};
use crate::editor::EditError;

/// Per-section edit counter. Survives unmount/remount, so it only ever grows.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    Changed,
    /// The edit targeted something that no longer exists, or changed nothing.
    Ignored,
}

/// A snapshot of a draft taken right after an edit, ready for validation.
#[derive(Debug, Clone)]
pub struct DraftSubmission {
    pub generation: Generation,
    pub draft: SectionDraft,
}

impl DraftSubmission {
    pub fn kind(&self) -> SectionKind {
        self.draft.kind()
    }
}

/// The result of one edit: the caller's value plus a submission when the
/// draft actually changed.
#[derive(Debug)]
pub struct Edited<T> {
    pub value: T,
    pub outcome: EditOutcome,
    pub submission: Option<DraftSubmission>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub section: SectionKind,
    pub generation: Generation,
    /// True while the latest draft has not been validated yet.
    pub pending: bool,
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub draft: SectionDraft,
}

#[derive(Debug)]
pub struct SectionEditor {
    draft: SectionDraft,
    generation: Generation,
    report: SectionReport,
    reported: Option<Generation>,
    photo_preview: Option<PhotoPreview>,
}

impl SectionEditor {
    fn mount(
        kind: SectionKind,
        document: &ResumeDocument,
        generation: Generation,
        ids: &IdMinter,
        previews: &PhotoPreviews,
    ) -> Self {
        let mut editor = Self {
            draft: SectionDraft::from_document(kind, document, ids),
            generation,
            report: SectionReport::default(),
            // The canonical slice has already been through validation.
            reported: Some(generation),
            photo_preview: None,
        };
        editor.sync_preview(previews);
        editor
    }

    pub fn kind(&self) -> SectionKind {
        self.draft.kind()
    }

    pub fn draft(&self) -> &SectionDraft {
        &self.draft
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn report(&self) -> &SectionReport {
        &self.report
    }

    pub fn is_pending(&self) -> bool {
        self.reported != Some(self.generation)
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            section: self.kind(),
            generation: self.generation,
            pending: self.is_pending(),
            valid: self.report.is_valid(),
            errors: self.report.errors.clone(),
            draft: self.draft.clone(),
        }
    }

    /// Remounts over a draft whose merge has not landed yet.
    fn restore(submitted: &Unsettled, previews: &PhotoPreviews) -> Self {
        let mut editor = Self {
            draft: submitted.draft.clone(),
            generation: submitted.generation,
            report: submitted.report.clone().unwrap_or_default(),
            reported: submitted.report.as_ref().map(|_| submitted.generation),
            photo_preview: None,
        };
        editor.sync_preview(previews);
        editor
    }

    fn submission(&self) -> DraftSubmission {
        DraftSubmission {
            generation: self.generation,
            draft: self.draft.clone(),
        }
    }

    fn record_report(&mut self, generation: Generation, report: SectionReport) {
        self.report = report;
        self.reported = Some(generation);
    }

    /// Keeps the preview registration in step with the draft's pending photo.
    fn sync_preview(&mut self, previews: &PhotoPreviews) {
        let pending = match self.draft.personal().and_then(|p| p.photo.as_ref()) {
            Some(Photo::Pending(photo)) => Some(photo),
            _ => None,
        };
        let current = self.photo_preview.as_ref().map(PhotoPreview::token);
        match pending {
            Some(photo) if current == Some(photo.token) => {}
            Some(photo) => self.photo_preview = Some(previews.register(photo)),
            None => self.photo_preview = None,
        }
    }
}

/// The latest submitted draft of a section, kept until its validation and
/// merge have run their course.
#[derive(Debug, Clone)]
struct Unsettled {
    generation: Generation,
    draft: SectionDraft,
    report: Option<SectionReport>,
}

/// The mounted section editors of one session.
#[derive(Debug)]
pub struct EditorSet {
    ids: IdMinter,
    previews: PhotoPreviews,
    mounted: HashMap<SectionKind, SectionEditor>,
    generations: HashMap<SectionKind, Generation>,
    unsettled: HashMap<SectionKind, Unsettled>,
}

impl EditorSet {
    pub fn new(previews: PhotoPreviews) -> Self {
        Self {
            ids: IdMinter::new(),
            previews,
            mounted: HashMap::new(),
            generations: HashMap::new(),
            unsettled: HashMap::new(),
        }
    }

    pub fn previews(&self) -> &PhotoPreviews {
        &self.previews
    }

    /// Mounts `kind` unless it is already mounted. The draft comes from the
    /// canonical document, or from the latest submission while that one is
    /// still on its way to the document.
    pub fn mount(&mut self, kind: SectionKind, document: &ResumeDocument) -> &SectionEditor {
        let generation = self.generations.get(&kind).copied().unwrap_or(0);
        let submitted = self
            .unsettled
            .get(&kind)
            .filter(|submitted| submitted.generation == generation);
        let ids = &self.ids;
        let previews = &self.previews;
        self.mounted.entry(kind).or_insert_with(|| match submitted {
            Some(submitted) => {
                debug!("Remounting {kind} editor over unsettled generation {generation}");
                SectionEditor::restore(submitted, previews)
            }
            None => {
                debug!("Mounting {kind} editor at generation {generation}");
                SectionEditor::mount(kind, document, generation, ids, previews)
            }
        })
    }

    pub fn unmount(&mut self, kind: SectionKind) -> bool {
        let removed = self.mounted.remove(&kind).is_some();
        if removed {
            debug!("Unmounted {kind} editor");
        }
        removed
    }

    pub fn unmount_all(&mut self) {
        self.mounted.clear();
        self.unsettled.clear();
    }

    pub fn get(&self, kind: SectionKind) -> Option<&SectionEditor> {
        self.mounted.get(&kind)
    }

    pub fn mounted(&self) -> Vec<SectionKind> {
        let mut kinds: Vec<_> = self.mounted.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Runs one edit against the `kind` editor, mounting it first if needed.
    /// The generation advances only when the draft changed.
    pub fn edit<T>(
        &mut self,
        kind: SectionKind,
        document: &ResumeDocument,
        f: impl FnOnce(&mut SectionDraft, &IdMinter) -> Result<(T, EditOutcome), EditError>,
    ) -> Result<Edited<T>, EditError> {
        self.mount(kind, document);
        let Some(editor) = self.mounted.get_mut(&kind) else {
            return Err(EditError::UnknownSection(kind.to_string()));
        };

        let mut draft = editor.draft.clone();
        let (value, mut outcome) = f(&mut draft, &self.ids)?;
        if outcome == EditOutcome::Changed && draft == editor.draft {
            outcome = EditOutcome::Ignored;
        }

        let submission = match outcome {
            EditOutcome::Ignored => None,
            EditOutcome::Changed => {
                let generation = self.generations.entry(kind).or_insert(0);
                *generation += 1;
                editor.draft = draft;
                editor.generation = *generation;
                editor.sync_preview(&self.previews);
                let submission = editor.submission();
                self.unsettled.insert(
                    kind,
                    Unsettled {
                        generation: submission.generation,
                        draft: submission.draft.clone(),
                        report: None,
                    },
                );
                Some(submission)
            }
        };

        Ok(Edited {
            value,
            outcome,
            submission,
        })
    }

    /// Accepts a validation result if it still reflects the latest draft of
    /// its section. Returns false for superseded results.
    pub fn accept_report(
        &mut self,
        kind: SectionKind,
        generation: Generation,
        report: SectionReport,
    ) -> bool {
        if self.generations.get(&kind).copied().unwrap_or(0) != generation {
            debug!("Discarding stale {kind} validation for generation {generation}");
            return false;
        }
        if let Some(submitted) = self.unsettled.get_mut(&kind) {
            if submitted.generation == generation {
                submitted.report = Some(report.clone());
            }
        }
        if let Some(editor) = self.mounted.get_mut(&kind) {
            editor.record_report(generation, report);
        }
        true
    }

    /// Forgets the submission at `generation` once its merge attempt is over.
    /// From then on a remount reads the canonical document again.
    pub fn settle(&mut self, kind: SectionKind, generation: Generation) {
        if self
            .unsettled
            .get(&kind)
            .is_some_and(|submitted| submitted.generation == generation)
        {
            self.unsettled.remove(&kind);
        }
    }

    /// Swaps a pending photo for its stored URL once a save has uploaded it.
    pub fn resolve_photo(&mut self, token: uuid::Uuid, url: &str) {
        if let Some(submitted) = self.unsettled.get_mut(&SectionKind::PersonalInfo) {
            resolve_pending(&mut submitted.draft, token, url);
        }
        let Some(editor) = self.mounted.get_mut(&SectionKind::PersonalInfo) else {
            return;
        };
        resolve_pending(&mut editor.draft, token, url);
        editor.sync_preview(&self.previews);
    }
}

fn resolve_pending(draft: &mut SectionDraft, token: uuid::Uuid, url: &str) {
    if let Some(info) = draft.personal_mut() {
        if matches!(&info.photo, Some(Photo::Pending(p)) if p.token == token) {
            info.photo = Some(Photo::Url {
                url: url.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::document::{Language, PendingPhoto};

    fn set_field(
        editors: &mut EditorSet,
        kind: SectionKind,
        field: &'static str,
        value: &str,
    ) -> Edited<()> {
        let value = Some(value.to_string());
        editors
            .edit(kind, &ResumeDocument::default(), |draft, _| {
                draft.set_field(field, value)?;
                Ok(((), EditOutcome::Changed))
            })
            .unwrap()
    }

    fn set_photo(editors: &mut EditorSet, photo: Option<Photo>) {
        editors
            .edit(SectionKind::PersonalInfo, &ResumeDocument::default(), |draft, _| {
                if let Some(info) = draft.personal_mut() {
                    info.photo = photo;
                }
                Ok(((), EditOutcome::Changed))
            })
            .unwrap();
    }

    #[test]
    fn test_mount_initializes_from_document() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        let document = ResumeDocument {
            summary: Some("Builder".to_string()),
            ..Default::default()
        };
        let editor = editors.mount(SectionKind::Summary, &document);
        assert_eq!(editor.draft(), &SectionDraft::Summary(Some("Builder".to_string())));
        assert!(!editor.is_pending());
    }

    #[test]
    fn test_generation_advances_only_on_change() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        let first = set_field(&mut editors, SectionKind::GeneralInfo, "title", "Backend");
        assert_eq!(first.submission.map(|s| s.generation), Some(1));

        let repeat = set_field(&mut editors, SectionKind::GeneralInfo, "title", "Backend");
        assert_eq!(repeat.outcome, EditOutcome::Ignored);
        assert!(repeat.submission.is_none());
        assert_eq!(editors.get(SectionKind::GeneralInfo).map(|e| e.generation()), Some(1));
    }

    #[test]
    fn test_generation_survives_remount() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        set_field(&mut editors, SectionKind::Summary, "summary", "a");
        editors.unmount(SectionKind::Summary);
        let edited = set_field(&mut editors, SectionKind::Summary, "summary", "b");
        assert_eq!(edited.submission.map(|s| s.generation), Some(2));
    }

    #[test]
    fn test_stale_report_is_discarded() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        set_field(&mut editors, SectionKind::Summary, "summary", "a");
        set_field(&mut editors, SectionKind::Summary, "summary", "ab");

        assert!(!editors.accept_report(SectionKind::Summary, 1, SectionReport::default()));
        assert!(editors.get(SectionKind::Summary).is_some_and(|e| e.is_pending()));
        assert!(editors.accept_report(SectionKind::Summary, 2, SectionReport::default()));
        assert!(editors.get(SectionKind::Summary).is_some_and(|e| !e.is_pending()));
    }

    #[test]
    fn test_remount_restores_unsettled_draft() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        set_field(&mut editors, SectionKind::Summary, "summary", "Builder");
        editors.unmount(SectionKind::Summary);

        let editor = editors.mount(SectionKind::Summary, &ResumeDocument::default());
        assert_eq!(editor.draft(), &SectionDraft::Summary(Some("Builder".to_string())));
        assert!(editor.is_pending());

        // The report lands after the remount; the merge is still ahead.
        assert!(editors.accept_report(SectionKind::Summary, 1, SectionReport::default()));
        editors.unmount(SectionKind::Summary);
        let editor = editors.mount(SectionKind::Summary, &ResumeDocument::default());
        assert_eq!(editor.draft(), &SectionDraft::Summary(Some("Builder".to_string())));
        assert!(!editor.is_pending());
    }

    #[test]
    fn test_settled_remount_reads_document() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        set_field(&mut editors, SectionKind::Summary, "summary", "a");
        set_field(&mut editors, SectionKind::Summary, "summary", "ab");

        // Settling an older generation keeps the newer submission.
        editors.settle(SectionKind::Summary, 1);
        editors.unmount(SectionKind::Summary);
        let editor = editors.mount(SectionKind::Summary, &ResumeDocument::default());
        assert_eq!(editor.draft(), &SectionDraft::Summary(Some("ab".to_string())));

        editors.settle(SectionKind::Summary, 2);
        editors.unmount(SectionKind::Summary);
        let document = ResumeDocument {
            summary: Some("ab".to_string()),
            ..Default::default()
        };
        let editor = editors.mount(SectionKind::Summary, &document);
        assert_eq!(editor.draft(), &SectionDraft::Summary(Some("ab".to_string())));
        assert_eq!(editor.generation(), 2);
        assert!(!editor.is_pending());
    }

    #[test]
    fn test_failed_edit_leaves_draft_untouched() {
        let mut editors = EditorSet::new(PhotoPreviews::new());
        let document = ResumeDocument {
            languages: vec![Language::default()],
            ..Default::default()
        };
        let before = editors.mount(SectionKind::Languages, &document).draft().clone();
        let err = editors
            .edit(SectionKind::Languages, &document, |draft, ids| {
                let id = draft.append_blank(ids)?;
                draft.set_item_field(id, "level", Some("fluent".to_string()))?;
                Ok(((), EditOutcome::Changed))
            })
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidValue { .. }));
        assert_eq!(editors.get(SectionKind::Languages).map(|e| e.draft()), Some(&before));
    }

    #[test]
    fn test_photo_preview_follows_draft() {
        let previews = PhotoPreviews::new();
        let mut editors = EditorSet::new(previews.clone());
        let first = PendingPhoto::new("a.png", "image/png", Bytes::from_static(b"a"));
        let second = PendingPhoto::new("b.png", "image/png", Bytes::from_static(b"b"));

        set_photo(&mut editors, Some(Photo::Pending(first.clone())));
        assert!(previews.get(first.token).is_some());

        set_photo(&mut editors, Some(Photo::Pending(second.clone())));
        assert!(previews.get(first.token).is_none());
        assert!(previews.get(second.token).is_some());

        editors.resolve_photo(second.token, "https://cdn.example.com/b.png");
        assert_eq!(previews.len(), 0);
        assert_eq!(
            editors
                .get(SectionKind::PersonalInfo)
                .and_then(|e| e.draft().personal())
                .and_then(|p| p.photo.clone()),
            Some(Photo::Url {
                url: "https://cdn.example.com/b.png".to_string()
            })
        );
    }

    #[test]
    fn test_unmount_releases_photo_preview() {
        let previews = PhotoPreviews::new();
        let mut editors = EditorSet::new(previews.clone());
        let photo = PendingPhoto::new("a.png", "image/png", Bytes::from_static(b"a"));
        set_photo(&mut editors, Some(Photo::Pending(photo)));
        assert_eq!(previews.len(), 1);
        editors.unmount_all();
        assert_eq!(previews.len(), 0);
    }
}
