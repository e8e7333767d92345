//! Space use-case service: create, rename, bulk delete and merge.
//!
//! # Responsibility
//! - Validate space names above the repository layer.
//! - Reassign reminders between spaces without breaking references.
//!
//! # Invariants
//! - No reminder ever references a space id that no longer exists.
//! - Merge validation happens before any write.
//! - Merge reassignment is a single batch write; if it fails, no source
//!   space is deleted.
//! - Source spaces removed by a merge never take reminders with them.

use crate::clock::EpochMs;
use crate::model::reminder::normalize_label;
use crate::model::space::{Space, SpaceId};
use crate::repo::reminder_repo::ReminderStore;
use crate::repo::space_repo::{SpaceDeleteMode, SpaceStore};
use crate::repo::store::RepoError;
use crate::service::selection::SelectionSet;
use log::{error, info};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Minimum number of selected spaces a merge needs.
pub const MIN_MERGE_SOURCES: usize = 2;

/// Errors from space use-cases.
#[derive(Debug)]
pub enum SpaceServiceError {
    /// Name is blank after normalization.
    InvalidName,
    SpaceNotFound(SpaceId),
    /// Merge selection is smaller than `MIN_MERGE_SOURCES`.
    TooFewSources(usize),
    Repo(RepoError),
}

impl Display for SpaceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "space name must not be blank"),
            Self::SpaceNotFound(id) => write!(f, "space not found: {id}"),
            Self::TooFewSources(count) => write!(
                f,
                "merge needs at least {MIN_MERGE_SOURCES} selected spaces, got {count}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SpaceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SpaceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SpaceNotFound(id) => Self::SpaceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Attributes for a space created by the caller or by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpace {
    pub name: String,
    pub color: u32,
    pub icon: String,
}

/// Where merged reminders end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeTarget {
    Existing(SpaceId),
    /// Create this space first, then merge into it.
    New(NewSpace),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// Selected spaces; may include an existing target.
    pub selected: BTreeSet<SpaceId>,
    pub target: MergeTarget,
    pub delete_source_spaces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub target_id: SpaceId,
    /// Set when the target was created by this merge.
    pub created_target: Option<Space>,
    /// Number of reminders whose space changed.
    pub moved: usize,
    pub deleted_sources: Vec<SpaceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceDeleteReport {
    pub deleted: Vec<SpaceId>,
    /// Reminders unassigned or deleted with the spaces.
    pub reminders_affected: usize,
}

/// Space use-case service.
pub struct SpaceService<S: ReminderStore + SpaceStore> {
    store: S,
}

impl<S: ReminderStore + SpaceStore> SpaceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create_space(&self, space: NewSpace, now: EpochMs) -> Result<Space, SpaceServiceError> {
        let name = normalize_name(&space.name)?;
        let space = Space::new(name, space.color, space.icon, now);
        self.store.create_space(&space)?;
        info!(
            "event=space_create module=service status=ok space_id={}",
            space.id
        );
        Ok(space)
    }

    pub fn rename_space(
        &self,
        id: SpaceId,
        name: impl AsRef<str>,
    ) -> Result<Space, SpaceServiceError> {
        let name = normalize_name(name.as_ref())?;
        let mut space = self
            .store
            .get_space(id)?
            .ok_or(SpaceServiceError::SpaceNotFound(id))?;
        space.name = name;
        self.store.update_space(&space)?;
        Ok(space)
    }

    /// Deletes every selected space, then leaves selection mode.
    ///
    /// Stops at the first failure; spaces deleted before it stay deleted and
    /// the selection stays active.
    pub fn delete_spaces(
        &self,
        selection: &mut SelectionSet<SpaceId>,
        mode: SpaceDeleteMode,
    ) -> Result<SpaceDeleteReport, SpaceServiceError> {
        let mut report = SpaceDeleteReport::default();
        for id in selection.ids() {
            report.reminders_affected += self.store.delete_space(id, mode)?;
            report.deleted.push(id);
        }
        selection.exit();
        info!(
            "event=space_bulk_delete module=service status=ok deleted={} reminders_affected={} mode={mode:?}",
            report.deleted.len(),
            report.reminders_affected
        );
        Ok(report)
    }

    /// Merges the selected spaces into one target.
    ///
    /// # Contract
    /// 1. Validate selection size, target and source existence.
    /// 2. Create the target space when requested.
    /// 3. Rewrite every reminder in a source space to the target and persist
    ///    the collection in one batch.
    /// 4. Optionally delete the sources, never cascading to reminders.
    pub fn merge_spaces(
        &self,
        request: &MergeRequest,
        now: EpochMs,
    ) -> Result<MergeOutcome, SpaceServiceError> {
        let started_at = Instant::now();
        if request.selected.len() < MIN_MERGE_SOURCES {
            return Err(SpaceServiceError::TooFewSources(request.selected.len()));
        }

        let known = self
            .store
            .list_spaces()?
            .into_iter()
            .map(|space| space.id)
            .collect::<BTreeSet<_>>();
        if let Some(missing) = request.selected.iter().find(|id| !known.contains(id)) {
            return Err(SpaceServiceError::SpaceNotFound(*missing));
        }

        let (target_id, created_target) = match &request.target {
            MergeTarget::Existing(id) => {
                if !known.contains(id) {
                    return Err(SpaceServiceError::SpaceNotFound(*id));
                }
                (*id, None)
            }
            MergeTarget::New(new_space) => {
                let created = self.create_space(new_space.clone(), now)?;
                (created.id, Some(created))
            }
        };

        let sources = request
            .selected
            .iter()
            .copied()
            .filter(|id| *id != target_id)
            .collect::<BTreeSet<_>>();

        let moved = match self.store.move_space_reminders(&sources, target_id) {
            Ok(moved) => moved,
            Err(err) => {
                error!(
                    "event=space_merge module=service status=error target_id={target_id} sources={} error={err}",
                    sources.len()
                );
                return Err(err.into());
            }
        };

        let mut deleted_sources = Vec::new();
        if request.delete_source_spaces {
            for source in &sources {
                self.store.delete_space(*source, SpaceDeleteMode::Unassign)?;
                deleted_sources.push(*source);
            }
        }

        info!(
            "event=space_merge module=service status=ok target_id={target_id} sources={} moved={moved} deleted_sources={} duration_ms={}",
            sources.len(),
            deleted_sources.len(),
            started_at.elapsed().as_millis()
        );
        Ok(MergeOutcome {
            target_id,
            created_target,
            moved,
            deleted_sources,
        })
    }

    /// `merge_spaces` over the current selection; leaves selection mode on
    /// success.
    pub fn merge_selection(
        &self,
        selection: &mut SelectionSet<SpaceId>,
        target: MergeTarget,
        delete_source_spaces: bool,
        now: EpochMs,
    ) -> Result<MergeOutcome, SpaceServiceError> {
        let request = MergeRequest {
            selected: selection.ids().into_iter().collect(),
            target,
            delete_source_spaces,
        };
        let outcome = self.merge_spaces(&request, now)?;
        selection.exit();
        Ok(outcome)
    }
}

fn normalize_name(value: &str) -> Result<String, SpaceServiceError> {
    let normalized = normalize_label(value);
    if normalized.is_empty() {
        return Err(SpaceServiceError::InvalidName);
    }
    Ok(normalized)
}
