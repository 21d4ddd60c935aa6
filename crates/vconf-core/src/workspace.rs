//! Workspace: the registry, locator, namer and session wired together.
//!
//! Frontends create one workspace per editing session and drive it through
//! `reload`, `save`, `create` and `export`. Every save or create ends with a
//! full reload, written or cancelled, so the session mirrors what is on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::category::{CategoryNamer, CategoryPath};
use crate::error::{RegistryError, Result};
use crate::hierarchy::{CategoryTree, HierarchyBuilder, InstanceHandle};
use crate::instance::ConfigInstance;
use crate::kind::{ConfigKind, KindId, KindRegistry};
use crate::locator::InstanceLocator;
use crate::persistence::paths::{
    backing_dir, id_from_destination, normalize_destination, sanitize_file_stem, unique_file_name,
};
use crate::persistence::writer::write_atomic;
use crate::persistence::{
    ClipboardSink, Clock, DestinationPicker, DestinationRequest, SaveOutcome, StorageRefresher,
    SystemClock, WorkflowState, format_version, next_version,
};
use crate::session::SessionState;

const SAVE_TITLE: &str = "Save Config";
const CREATE_TITLE: &str = "New Config";

/// Display header of a selected instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    /// `Id` for node kinds, display name of the kind for global kinds.
    pub title: String,
    pub kind_name: String,
    pub category: CategoryPath,
    pub version: i64,
    pub version_label: String,
    pub path: PathBuf,
}

pub struct Workspace {
    registry: KindRegistry,
    locator: InstanceLocator,
    namer: CategoryNamer,
    show_empty_kinds: bool,
    session: SessionState,
    clock: Box<dyn Clock>,
    state: WorkflowState,
}

impl Workspace {
    pub fn new(registry: KindRegistry, locator: InstanceLocator, namer: CategoryNamer) -> Self {
        Self {
            registry,
            locator,
            namer,
            show_empty_kinds: false,
            session: SessionState::new(),
            clock: Box::new(SystemClock),
            state: WorkflowState::Idle,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_empty_kinds(mut self, show: bool) -> Self {
        self.show_empty_kinds = show;
        self
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn locator(&self) -> &InstanceLocator {
        &self.locator
    }

    pub fn namer(&self) -> &CategoryNamer {
        &self.namer
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// State reached by the last save or create.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Current tree; `None` until the first reload or after `invalidate`.
    pub fn tree(&self) -> Option<&CategoryTree> {
        self.session.tree()
    }

    /// Rescan storage and rebuild the hierarchy for every registered kind.
    ///
    /// The previous selection is restored when its file is still present.
    pub fn reload(&mut self) {
        let previous = self
            .session
            .selected()
            .and_then(|h| self.session.current_path(h))
            .map(Path::to_path_buf);
        self.rebuild(previous.as_deref());
    }

    /// Rebuild for an explicit set of kinds.
    pub fn build(&mut self, kinds: &[KindId]) {
        let kinds: Vec<&ConfigKind> = kinds.iter().filter_map(|id| self.registry.get(*id)).collect();
        let hierarchy = HierarchyBuilder::new(&self.registry, &self.locator, &self.namer)
            .show_empty_kinds(self.show_empty_kinds)
            .build(&kinds, self.session.next_generation());
        self.session.install(hierarchy);
    }

    fn rebuild(&mut self, reselect: Option<&Path>) {
        let all: Vec<KindId> = self.registry.all_kinds(None).iter().map(|k| k.id()).collect();
        self.build(&all);

        if let Some(handle) = reselect.and_then(|p| self.session.handle_for_path(p)) {
            // Handle comes from the hierarchy just installed
            let _ = self.session.select(handle);
        }
    }

    /// Drop the current mapping; lookups fail until the next reload.
    pub fn invalidate(&mut self) {
        self.session.invalidate();
    }

    pub fn select(&mut self, handle: InstanceHandle) -> Result<()> {
        self.session.select(handle)
    }

    pub fn selected(&self) -> Option<InstanceHandle> {
        self.session.selected()
    }

    /// First instance at a `/`-separated category path.
    pub fn find(&self, category: &str) -> Option<InstanceHandle> {
        self.session
            .handle_for_category(&CategoryPath::parse(category))
    }

    pub fn instance(&self, handle: InstanceHandle) -> Option<&ConfigInstance> {
        self.session.instance(handle)
    }

    /// Edit a discovered instance in place. Changes persist on the next save.
    pub fn edit(&mut self, handle: InstanceHandle) -> Result<&mut ConfigInstance> {
        self.session
            .instance_mut(handle)
            .ok_or(RegistryError::StaleHandle)
    }

    pub fn current_path(&self, handle: InstanceHandle) -> Option<&Path> {
        self.session.current_path(handle)
    }

    pub fn describe(&self, handle: InstanceHandle) -> Result<InstanceSummary> {
        let instance = self.session.instance(handle).ok_or(RegistryError::StaleHandle)?;
        let kind = self.kind_of(instance)?;
        let title = match instance.id() {
            Some(id) if kind.is_node() => id.to_string(),
            _ => self.namer.display_name(kind.name()),
        };

        Ok(InstanceSummary {
            title,
            kind_name: kind.name().to_string(),
            category: self
                .session
                .category(handle)
                .cloned()
                .unwrap_or_default(),
            version: instance.version(),
            version_label: format!("Version: {}", format_version(instance.version())),
            path: self
                .session
                .current_path(handle)
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        })
    }

    /// Serialize an instance and hand the text to `sink`. Never writes.
    pub fn export<S: ClipboardSink>(&self, handle: InstanceHandle, sink: &mut S) -> Result<String> {
        let instance = self.session.instance(handle).ok_or(RegistryError::StaleHandle)?;
        let text = instance.encode(self.kind_of(instance)?)?;
        sink.copy_text(&text)?;
        Ok(text)
    }

    /// Save a discovered instance, including any in-place edits.
    pub fn save<H>(&mut self, handle: InstanceHandle, host: &mut H) -> Result<SaveOutcome>
    where
        H: DestinationPicker + StorageRefresher,
    {
        self.state = WorkflowState::Idle;
        let result = match self.session.instance(handle).cloned() {
            Some(instance) => {
                let known_path = self.session.current_path(handle).map(Path::to_path_buf);
                let keep_file_name = instance.id() == self.session.loaded_id(handle);
                self.run_save(instance, known_path, keep_file_name, host)
            }
            None => Err(RegistryError::StaleHandle),
        };
        self.finish(result)
    }

    /// Save an instance that has no backing file yet.
    pub fn save_new<H>(&mut self, instance: ConfigInstance, host: &mut H) -> Result<SaveOutcome>
    where
        H: DestinationPicker + StorageRefresher,
    {
        self.state = WorkflowState::Idle;
        let result = self.run_save(instance, None, false, host);
        self.finish(result)
    }

    /// Create and write a new instance of a node kind.
    pub fn create<H>(&mut self, kind: KindId, host: &mut H) -> Result<SaveOutcome>
    where
        H: DestinationPicker + StorageRefresher,
    {
        self.state = WorkflowState::Idle;
        let result = self.run_create(kind, host);
        self.finish(result)
    }

    fn run_save<H>(
        &mut self,
        mut instance: ConfigInstance,
        known_path: Option<PathBuf>,
        keep_file_name: bool,
        host: &mut H,
    ) -> Result<SaveOutcome>
    where
        H: DestinationPicker + StorageRefresher,
    {
        let kind = self.kind_of(&instance)?.clone();
        let extension = self.locator.extension().to_string();

        let (directory, file_name) = match &known_path {
            Some(path) => {
                let directory = backing_dir(path)?;
                let file_name = match path.file_name() {
                    Some(name) if keep_file_name || !kind.is_node() => {
                        name.to_string_lossy().to_string()
                    }
                    _ => derived_file_name(&kind, &instance, &extension),
                };
                (directory, file_name)
            }
            None => (
                self.conventional_dir(&kind)?,
                derived_file_name(&kind, &instance, &extension),
            ),
        };

        let version = next_version(instance.version(), self.clock.now_unix());
        instance.set_version(version);
        let text = instance.encode(&kind)?;

        let request = DestinationRequest {
            title: SAVE_TITLE.to_string(),
            directory,
            file_name,
            extension,
        };
        let Some(destination) = self.confirm_destination(&request, host)? else {
            return Ok(self.cancelled(known_path.as_deref()));
        };

        self.commit(&destination, &text, host)?;
        info!(
            kind = %kind.name(),
            path = %destination.display(),
            version,
            "Saved config"
        );
        Ok(self.done(destination, version))
    }

    fn run_create<H>(&mut self, kind_id: KindId, host: &mut H) -> Result<SaveOutcome>
    where
        H: DestinationPicker + StorageRefresher,
    {
        let kind = self
            .registry
            .get(kind_id)
            .ok_or_else(|| RegistryError::UnknownKind(format!("{kind_id:?}")))?
            .clone();
        if !kind.is_node() {
            return Err(RegistryError::NotNodeKind(kind.name().to_string()));
        }

        let fields = kind.instantiate()?;
        let extension = self.locator.extension().to_string();
        let directory = self.create_dir(&kind)?;
        let display = self.namer.display_name(kind.name());
        let stem = sanitize_file_stem(&display.to_lowercase().replace(' ', "-"))
            .unwrap_or_else(|| "config".to_string());

        let request = DestinationRequest {
            title: CREATE_TITLE.to_string(),
            file_name: unique_file_name(&directory, &stem, &extension),
            directory,
            extension,
        };
        let previous = self
            .session
            .selected()
            .and_then(|h| self.session.current_path(h))
            .map(Path::to_path_buf);
        let Some(destination) = self.confirm_destination(&request, host)? else {
            return Ok(self.cancelled(previous.as_deref()));
        };

        let id = id_from_destination(&destination)?;
        let version = next_version(0, self.clock.now_unix());
        // Template header keys are dropped; the kind tag comes from `kind`
        let instance = ConfigInstance::new(&kind, Some(id.clone()), version, fields);
        let text = instance.encode(&kind)?;

        self.commit(&destination, &text, host)?;
        info!(
            kind = %kind.name(),
            id = %id,
            path = %destination.display(),
            "Created config"
        );
        Ok(self.done(destination, version))
    }

    fn confirm_destination<H>(
        &mut self,
        request: &DestinationRequest,
        host: &mut H,
    ) -> Result<Option<PathBuf>>
    where
        H: DestinationPicker,
    {
        self.transition(WorkflowState::ConfirmingDestination);
        let chosen = host.pick_destination(request)?;
        match chosen.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => normalize_destination(&path, &request.directory, &request.extension).map(Some),
            None => Ok(None),
        }
    }

    fn commit<H>(&mut self, destination: &Path, text: &str, host: &mut H) -> Result<()>
    where
        H: StorageRefresher,
    {
        self.transition(WorkflowState::Writing);
        write_atomic(destination, text)?;
        host.refresh_storage();
        Ok(())
    }

    fn done(&mut self, destination: PathBuf, version: i64) -> SaveOutcome {
        self.rebuild(Some(destination.as_path()));
        self.transition(WorkflowState::Done);
        SaveOutcome {
            state: WorkflowState::Done,
            destination: Some(destination),
            version: Some(version),
            selected: self.session.selected(),
        }
    }

    fn cancelled(&mut self, reselect: Option<&Path>) -> SaveOutcome {
        self.rebuild(reselect);
        self.transition(WorkflowState::Cancelled);
        SaveOutcome {
            state: WorkflowState::Cancelled,
            destination: None,
            version: None,
            selected: self.session.selected(),
        }
    }

    fn finish(&mut self, result: Result<SaveOutcome>) -> Result<SaveOutcome> {
        if result.is_err() {
            self.transition(WorkflowState::Failed);
        }
        result
    }

    fn transition(&mut self, next: WorkflowState) {
        debug!(from = %self.state, to = %next, "Workflow transition");
        self.state = next;
    }

    fn kind_of(&self, instance: &ConfigInstance) -> Result<&ConfigKind> {
        self.registry
            .get(instance.kind())
            .ok_or_else(|| RegistryError::UnknownKind(format!("{:?}", instance.kind())))
    }

    fn conventional_dir(&self, kind: &ConfigKind) -> Result<PathBuf> {
        self.locator.conventional_dir(kind).ok_or_else(|| {
            RegistryError::path_resolution(
                kind.storage_dir().unwrap_or(Path::new("")),
                "no storage root configured",
            )
        })
    }

    /// Directory for new instances: next to the selected instance when it is
    /// of the same kind, else next to any existing one, else the convention.
    fn create_dir(&self, kind: &ConfigKind) -> Result<PathBuf> {
        let same_kind = |h: &InstanceHandle| {
            self.session
                .instance(*h)
                .is_some_and(|i| i.kind() == kind.id())
        };
        let existing = self.session.selected().filter(same_kind).or_else(|| {
            self.session
                .tree()?
                .leaves()
                .into_iter()
                .map(|(_, h)| h)
                .find(same_kind)
        });

        match existing.and_then(|h| self.session.current_path(h)) {
            Some(path) => backing_dir(path),
            None => self.conventional_dir(kind),
        }
    }
}

fn derived_file_name(kind: &ConfigKind, instance: &ConfigInstance, extension: &str) -> String {
    let stem = instance
        .id()
        .filter(|_| kind.is_node())
        .and_then(sanitize_file_stem)
        .or_else(|| sanitize_file_stem(kind.name()))
        .unwrap_or_else(|| "config".to_string());
    format!("{stem}.{extension}")
}
