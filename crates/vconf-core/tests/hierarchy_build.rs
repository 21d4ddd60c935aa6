mod support;

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use vconf_core::category::{BucketPolicy, CategoryNamer, CategoryPath};
use vconf_core::hierarchy::HierarchyBuilder;
use vconf_core::kind::{KindDefinition, KindRegistry};
use vconf_core::locator::InstanceLocator;

use support::{AUDIO, LEVEL, PLAYER_STATS, game_registry, workspace, write_config};

fn leaf_paths(ws: &vconf_core::workspace::Workspace) -> Vec<String> {
    ws.tree()
        .expect("workspace reloaded")
        .leaves()
        .into_iter()
        .map(|(path, _)| path.to_string())
        .collect()
}

#[test]
fn global_kind_without_instances_is_hidden() {
    let temp = TempDir::new().unwrap();
    let mut registry = KindRegistry::new();
    registry.register(KindDefinition::global(AUDIO)).unwrap();

    let mut ws = workspace(temp.path(), registry, 0);
    ws.reload();

    assert!(ws.tree().unwrap().is_empty());
}

#[test]
fn empty_kinds_kept_when_requested() {
    let temp = TempDir::new().unwrap();
    let mut registry = KindRegistry::new();
    registry.register(KindDefinition::global(AUDIO)).unwrap();

    let mut ws = workspace(temp.path(), registry, 0).with_empty_kinds(true);
    ws.reload();

    let tree = ws.tree().unwrap();
    let audio = tree
        .find(&CategoryPath::parse("Global Configs/Audio"))
        .expect("empty kind node");
    assert!(audio.children().is_empty());
    assert!(audio.instance().is_none());
    assert!(tree.leaves().is_empty());
}

#[test]
fn node_instances_sorted_under_kind() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "PlayerStats/hero-02.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero-02", "Version": 10, "health": 80 }),
    );
    write_config(
        temp.path(),
        "PlayerStats/hero-01.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero-01", "Version": 10, "health": 90 }),
    );

    let mut ws = workspace(temp.path(), game_registry(), 0);
    ws.reload();

    assert_eq!(
        leaf_paths(&ws),
        vec![
            "Node Configs/Player Stats/hero-01",
            "Node Configs/Player Stats/hero-02",
        ]
    );
}

#[test]
fn global_and_node_kinds_share_one_tree() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "Audio/audio.json",
        json!({ "Type": AUDIO, "Version": 3, "volume": 0.8 }),
    );
    write_config(
        temp.path(),
        "Levels/level-01.json",
        json!({ "Type": LEVEL, "Id": "level-01", "Version": 3 }),
    );

    let mut ws = workspace(temp.path(), game_registry(), 0);
    ws.reload();

    assert_eq!(
        leaf_paths(&ws),
        vec!["Global Configs/Audio", "Node Configs/Level/level-01"]
    );
    assert_eq!(
        ws.tree().unwrap().outline(),
        vec![
            "Global Configs",
            "  Audio",
            "Node Configs",
            "  Level",
            "    level-01",
        ]
    );
}

#[test]
fn malformed_and_foreign_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "Levels/level-01.json",
        json!({ "Type": LEVEL, "Id": "level-01", "Version": 1 }),
    );
    fs::write(temp.path().join("Levels/broken.json"), "{ not json").unwrap();
    write_config(
        temp.path(),
        "Levels/missing-id.json",
        json!({ "Type": LEVEL, "Version": 1 }),
    );
    write_config(
        temp.path(),
        "Other/weapon.json",
        json!({ "Type": "SFWeaponConfig", "Id": "sword", "Version": 1 }),
    );
    fs::write(temp.path().join("Levels/notes.txt"), "not a config").unwrap();

    let mut ws = workspace(temp.path(), game_registry(), 0);
    ws.reload();

    assert_eq!(leaf_paths(&ws), vec!["Node Configs/Level/level-01"]);
    let hierarchy = ws.session().hierarchy().unwrap();
    assert_eq!(hierarchy.skipped, 2);
}

#[test]
fn duplicate_ids_keep_both_instances() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "PlayerStats/a/hero.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero", "Version": 1, "health": 1 }),
    );
    write_config(
        temp.path(),
        "PlayerStats/b/hero.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero", "Version": 1, "health": 2 }),
    );

    let mut ws = workspace(temp.path(), game_registry(), 0);
    ws.reload();

    let hierarchy = ws.session().hierarchy().unwrap();
    assert_eq!(hierarchy.entries.len(), 2);
    assert_eq!(
        hierarchy.collisions,
        vec![CategoryPath::parse("Node Configs/Player Stats/hero")]
    );
    assert_eq!(ws.tree().unwrap().leaves().len(), 2);
}

#[test]
fn build_is_idempotent() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "PlayerStats/hero-01.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero-01", "Version": 1 }),
    );
    write_config(
        temp.path(),
        "Audio/audio.json",
        json!({ "Type": AUDIO, "Version": 1 }),
    );

    let registry = game_registry();
    let locator = InstanceLocator::new(vec![temp.path().to_path_buf()]);
    let namer = CategoryNamer::default();
    let kinds = registry.all_kinds(None);
    let builder = HierarchyBuilder::new(&registry, &locator, &namer);

    let first = builder.build(&kinds, 1);
    let second = builder.build(&kinds, 2);

    assert_eq!(first.tree.outline(), second.tree.outline());
    assert_eq!(first.entries.len(), second.entries.len());
}

#[test]
fn build_limited_to_requested_kinds() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "PlayerStats/hero-01.json",
        json!({ "Type": PLAYER_STATS, "Id": "hero-01", "Version": 1 }),
    );
    write_config(
        temp.path(),
        "Levels/level-01.json",
        json!({ "Type": LEVEL, "Id": "level-01", "Version": 1 }),
    );

    let registry = game_registry();
    let level = registry.by_name(LEVEL).unwrap().id();
    let mut ws = workspace(temp.path(), registry, 0);
    ws.build(&[level, level]);

    assert_eq!(leaf_paths(&ws), vec!["Node Configs/Level/level-01"]);
}

#[test]
fn flat_bucket_policy_groups_everything() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "Audio/audio.json",
        json!({ "Type": AUDIO, "Version": 1 }),
    );
    write_config(
        temp.path(),
        "Levels/level-01.json",
        json!({ "Type": LEVEL, "Id": "level-01", "Version": 1 }),
    );

    let mut ws = vconf_core::workspace::Workspace::new(
        game_registry(),
        InstanceLocator::new(vec![temp.path().to_path_buf()]),
        CategoryNamer::new("SF", BucketPolicy::Flat("Repositories".into())),
    );
    ws.reload();

    assert_eq!(
        leaf_paths(&ws),
        vec!["Repositories/Audio", "Repositories/Level/level-01"]
    );
}

#[test]
fn instances_found_across_roots() {
    let temp = TempDir::new().unwrap();
    let main = temp.path().join("Main");
    let shared = temp.path().join("Shared");
    write_config(
        &main,
        "level-01.json",
        json!({ "Type": LEVEL, "Id": "level-01", "Version": 1 }),
    );
    write_config(
        &shared,
        "deep/nested/level-02.json",
        json!({ "Type": LEVEL, "Id": "level-02", "Version": 1 }),
    );

    let mut ws = vconf_core::workspace::Workspace::new(
        game_registry(),
        InstanceLocator::new(vec![main, shared]),
        CategoryNamer::default(),
    );
    ws.reload();

    assert_eq!(
        leaf_paths(&ws),
        vec!["Node Configs/Level/level-01", "Node Configs/Level/level-02"]
    );
    assert_eq!(ws.tree().unwrap().search("LEVEL-02").len(), 1);
}
