//! The "Add New Site" dialog.
//!
//! `SiteForm` owns the draft, its field errors and the submission state. It
//! is generic over the persistence and notification collaborators so the same
//! flow backs the HTML dialog, the JSON API and the tests.
//!
//! ```text
//! Idle --submit(valid)--> Submitting --ok--> closed, reset   (success toast)
//!                                    --err-> Idle, values kept (error toast)
//! ```

use super::validation::{validate, FieldErrors, SiteDraft};
use super::{PersistenceError, SitesService};
use crate::db::NewSite;
use crate::notify::Notifier;

pub const ADDED_MESSAGE: &str = "Site added successfully";
pub const FAILED_MESSAGE: &str = "Failed to add site";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

/// How a submit attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Persisted; the dialog reset and closed.
    Added,
    /// Blocked by field errors; nothing was sent.
    Invalid,
    /// The sites service rejected the record; the dialog stays open.
    Failed,
    /// A submission is already in flight.
    Busy,
    /// The dialog is not open.
    Closed,
}

pub struct SiteForm<S, N> {
    sites: S,
    notifier: N,
    open: bool,
    draft: SiteDraft,
    errors: FieldErrors,
    state: SubmitState,
}

impl<S: SitesService, N: Notifier> SiteForm<S, N> {
    /// A closed dialog with default field values.
    pub fn new(sites: S, notifier: N) -> Self {
        Self {
            sites,
            notifier,
            open: false,
            draft: SiteDraft::default(),
            errors: FieldErrors::default(),
            state: SubmitState::Idle,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &SiteDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SiteDraft {
        &mut self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The confirm button is disabled while a submission is in flight.
    pub fn confirm_disabled(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    /// Discard the draft and close. Ignored while submitting.
    pub fn cancel(&mut self) -> bool {
        if self.state == SubmitState::Submitting {
            return false;
        }
        self.reset();
        self.open = false;
        true
    }

    /// Validate and enter `Submitting`, handing back the record to persist.
    pub fn begin_submit(&mut self) -> Result<NewSite, SubmitOutcome> {
        if !self.open {
            return Err(SubmitOutcome::Closed);
        }
        if self.state == SubmitState::Submitting {
            return Err(SubmitOutcome::Busy);
        }

        match validate(&self.draft) {
            Ok(site) => {
                self.errors = FieldErrors::default();
                self.state = SubmitState::Submitting;
                Ok(site)
            }
            Err(errors) => {
                let fields: Vec<String> = errors.iter().map(|e| e.field.to_string()).collect();
                tracing::debug!(count = errors.len(), fields = %fields.join(","), "Site draft rejected");
                self.errors = errors;
                Err(SubmitOutcome::Invalid)
            }
        }
    }

    /// Settle an in-flight submission with the service's result.
    pub fn finish_submit(&mut self, result: Result<(), PersistenceError>) -> SubmitOutcome {
        if self.state != SubmitState::Submitting {
            return SubmitOutcome::Closed;
        }
        self.state = SubmitState::Idle;

        match result {
            Ok(()) => {
                self.notifier.success(ADDED_MESSAGE);
                self.reset();
                self.open = false;
                SubmitOutcome::Added
            }
            Err(e) => {
                tracing::error!("Error adding site: {}", e);
                self.notifier.error(FAILED_MESSAGE);
                SubmitOutcome::Failed
            }
        }
    }

    /// Run the whole flow: validate, call `add_site` once, settle.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let site = match self.begin_submit() {
            Ok(site) => site,
            Err(outcome) => return outcome,
        };

        let result = self.sites.add_site(&site).await;
        self.finish_submit(result)
    }

    fn reset(&mut self) {
        self.draft = SiteDraft::default();
        self.errors = FieldErrors::default();
    }
}
