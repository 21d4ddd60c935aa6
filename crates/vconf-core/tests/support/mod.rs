#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use vconf_core::category::CategoryNamer;
use vconf_core::kind::{KindDefinition, KindRegistry};
use vconf_core::locator::InstanceLocator;
use vconf_core::persistence::{
    ClipboardSink, Clock, DestinationPicker, DestinationRequest, StorageRefresher,
};
use vconf_core::workspace::Workspace;

pub const PLAYER_STATS: &str = "SFPlayerStatsConfig";
pub const LEVEL: &str = "SFLevelConfig";
pub const AUDIO: &str = "SFAudioGlobalConfig";

/// Player stats and levels (node kinds) plus audio (global kind).
pub fn game_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry
        .register(
            KindDefinition::node(PLAYER_STATS)
                .with_storage_dir("PlayerStats")
                .with_defaults(fields(serde_json::json!({ "health": 100 }))),
        )
        .unwrap();
    registry
        .register(KindDefinition::node(LEVEL).with_storage_dir("Levels"))
        .unwrap();
    registry
        .register(KindDefinition::global(AUDIO).with_storage_dir("Audio"))
        .unwrap();
    registry
}

pub fn fields(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn workspace(root: &Path, registry: KindRegistry, now: i64) -> Workspace {
    Workspace::new(
        registry,
        InstanceLocator::new(vec![root.to_path_buf()]),
        CategoryNamer::default(),
    )
    .with_clock(FixedClock(now))
}

/// Write a stored config under `root`, creating directories.
pub fn write_config(root: &Path, relative: &str, body: Value) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Scripted reply to a destination prompt.
#[derive(Debug, Clone)]
pub enum Answer {
    Suggested,
    Path(PathBuf),
    Cancel,
    Fail,
}

/// Host double that answers prompts from a script and records every call.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    answers: VecDeque<Answer>,
    pub requests: Vec<DestinationRequest>,
    pub refreshes: usize,
    pub clipboard: Vec<String>,
}

impl ScriptedHost {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn accepting() -> Self {
        Self::new([Answer::Suggested])
    }
}

impl DestinationPicker for ScriptedHost {
    fn pick_destination(
        &mut self,
        request: &DestinationRequest,
    ) -> anyhow::Result<Option<PathBuf>> {
        self.requests.push(request.clone());
        match self.answers.pop_front().unwrap_or(Answer::Cancel) {
            Answer::Suggested => Ok(Some(request.suggested_path())),
            Answer::Path(path) => Ok(Some(path)),
            Answer::Cancel => Ok(None),
            Answer::Fail => anyhow::bail!("dialog closed unexpectedly"),
        }
    }
}

impl StorageRefresher for ScriptedHost {
    fn refresh_storage(&mut self) {
        self.refreshes += 1;
    }
}

impl ClipboardSink for ScriptedHost {
    fn copy_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.clipboard.push(text.to_string());
        Ok(())
    }
}
