//! End-to-end index semantics over a real directory.

mod common;

use common::TestEnv;
use nook::domain::{TagKind, TagName, TreeError};
use nook::index::{engine, GroupRenameOutcome, NoteStore, StoreError};
use pretty_assertions::assert_eq;

fn tag(s: &str) -> TagName {
    TagName::new(s).unwrap()
}

fn note(s: &str) -> nook::domain::NoteName {
    nook::domain::NoteName::new(s).unwrap()
}

// ===========================================
// Scan
// ===========================================

#[test]
fn scan_twice_yields_identical_index() {
    let env = TestEnv::new();
    env.add_note("[work] plan.htm", "a");
    env.add_note("[work/sub] detail.htm", "b");
    env.add_note("loose.htm", "c");

    let mut store = env.open();
    let mut first: Vec<String> = store.notes().map(|(k, _)| k.to_string()).collect();
    first.sort();
    let work = store.tree().group_at_path("work").unwrap();
    let first_count = store.tree().node(work).unwrap().note_count();

    store.scan().unwrap();

    let mut second: Vec<String> = store.notes().map(|(k, _)| k.to_string()).collect();
    second.sort();
    assert_eq!(first, second);
    let work = store.tree().group_at_path("work").unwrap();
    assert_eq!(store.tree().node(work).unwrap().note_count(), first_count);
}

#[test]
fn scan_discovers_unseen_groups_implicitly() {
    let env = TestEnv::new();
    env.add_note("[fresh/idea] one.htm", "x");

    let store = env.open();

    let idea = store.tree().group_at_path("fresh/idea").unwrap();
    assert!(store.tree().node(idea).unwrap().has_note("[fresh/idea] one.htm"));
    assert!(store.tree().validate().is_empty());
}

// ===========================================
// Group rename: collision, merge, case
// ===========================================

#[test]
fn group_rename_collision_loses_no_data() {
    let env = TestEnv::new();
    env.add_note("[A] a1.htm", "first");
    env.add_note("[A] a2.htm", "second");
    env.add_note("[B] a1.htm", "blocker");
    let before = env.files();

    let mut store = env.open();
    let a = store.tree().group_at_path("A").unwrap();

    let result = store.rename_group(a, &tag("B"));

    assert!(matches!(result, Err(StoreError::NameCollision { .. })));
    assert_eq!(env.files(), before);
    // Both groups still intact in the tree.
    let a = store.tree().group_at_path("A").unwrap();
    let b = store.tree().group_at_path("B").unwrap();
    assert_eq!(store.tree().node(a).unwrap().note_count(), 2);
    assert_eq!(store.tree().node(b).unwrap().note_count(), 1);
}

#[test]
fn group_rename_merges_into_existing_group() {
    let env = TestEnv::new();
    env.add_note("[A] a1.htm", "x");
    env.add_note("[B] b1.htm", "y");

    let mut store = env.open();
    let a = store.tree().group_at_path("A").unwrap();
    let b = store.tree().group_at_path("B").unwrap();

    let outcome = store.rename_group(a, &tag("B")).unwrap();

    assert_eq!(outcome, GroupRenameOutcome::Merged { into: b, files: 1 });
    assert_eq!(
        env.files(),
        vec!["[B] a1.htm".to_string(), "[B] b1.htm".to_string()]
    );
    assert!(store.tree().group_at_path("A").is_none());
    let b_node = store.tree().node(b).unwrap();
    assert_eq!(b_node.note_count(), 2);
    assert!(b_node.has_note("[B] a1.htm"));
    assert!(b_node.has_note("[B] b1.htm"));
    assert!(store.tree().validate().is_empty());
}

#[test]
fn case_only_group_rename_is_always_legal() {
    let env = TestEnv::new();
    env.add_note("[projects] a.htm", "x");
    env.add_note("[projects] b.htm", "y");

    let mut store = env.open();
    let projects = store.tree().group_at_path("projects").unwrap();

    let outcome = store.rename_group(projects, &tag("Projects")).unwrap();

    assert_eq!(outcome, GroupRenameOutcome::Renamed { files: 2 });
    assert_eq!(
        env.files(),
        vec!["[Projects] a.htm".to_string(), "[Projects] b.htm".to_string()]
    );
}

// ===========================================
// Group delete
// ===========================================

#[test]
fn deleting_a_group_never_deletes_notes() {
    let env = TestEnv::new();
    env.add_note("[A] a1.htm", "keep me");

    let mut store = env.open();
    let a = store.tree().group_at_path("A").unwrap();

    store.delete_group(a).unwrap();

    assert_eq!(env.files(), vec!["a1.htm".to_string()]);
    let note = store.get("a1.htm").expect("note survives under new key");
    assert_eq!(note.group(), store.tree().not_grouped());
    assert!(
        store
            .tree()
            .node(store.tree().not_grouped())
            .unwrap()
            .has_note("a1.htm")
    );
    // The body is untouched.
    assert_eq!(store.read_note("a1.htm").unwrap(), "keep me");
}

#[test]
fn delete_tag_on_group_goes_through_group_delete() {
    let env = TestEnv::new();
    env.add_note("[A] a1.htm", "x");

    let mut store = env.open();
    let a = store.tree().group_at_path("A").unwrap();

    engine::delete_tag(&mut store, a).unwrap();

    assert_eq!(env.files(), vec!["a1.htm".to_string()]);
}

// ===========================================
// Reserved tags
// ===========================================

#[test]
fn reserved_tags_resist_rename_and_delete() {
    let env = TestEnv::new();
    env.add_note("a.htm", "x");
    let mut store = env.open();

    for fixed in [store.tree().all(), store.tree().not_grouped(), store.tree().archive()] {
        let rename = engine::rename_tag(&mut store, fixed, tag("other"));
        assert!(matches!(
            rename,
            Err(engine::EngineError::Tree(TreeError::FixedTag { .. }))
        ));
        let delete = engine::delete_tag(&mut store, fixed);
        assert!(matches!(
            delete,
            Err(engine::EngineError::Tree(TreeError::FixedTag { .. }))
        ));
    }
    assert!(store.tree().validate().is_empty());
    assert_eq!(env.files(), vec!["a.htm".to_string()]);
}

// ===========================================
// Case-only note rename
// ===========================================

#[test]
fn case_only_note_rename_is_not_a_collision() {
    let env = TestEnv::new();
    env.add_note("[work] foo.htm", "x");

    let mut store = env.open();
    let new_key = store.rename_note("[work] foo.htm", note("FOO")).unwrap();

    assert_eq!(new_key, "[work] FOO.htm");
    assert_eq!(env.files(), vec!["[work] FOO.htm".to_string()]);
}

// ===========================================
// Content lifecycle across operations
// ===========================================

#[test]
fn rename_preserves_loaded_content_and_metadata() {
    let env = TestEnv::new();
    env.add_note("[work] notes.htm", "original body");

    let mut store = env.open();
    store.read_note("[work] notes.htm").unwrap();
    let new_key = store.rename_note("[work] notes.htm", note("renamed")).unwrap();

    assert_eq!(store.read_note(&new_key).unwrap(), "original body");
}

#[test]
fn save_then_rescan_roundtrips_metadata() {
    let env = TestEnv::new();
    env.add_note("a.htm", "body");

    let mut store = env.open();
    store.set_author("carol");
    store.tag_note("a.htm", tag("draft")).unwrap();

    // A brand-new store sees what was persisted.
    let mut fresh = NoteStore::new(env.notes_dir());
    fresh.scan().unwrap();

    let meta = fresh.get("a.htm").unwrap().meta();
    assert_eq!(meta.tags, vec![tag("draft")]);
    assert_eq!(meta.authors, vec!["carol".to_string()]);
    assert_eq!(meta.versions.len(), 1);

    let labels = fresh.tree().labels();
    assert_eq!(labels.len(), 1);
    assert!(fresh.tree().node(labels[0]).unwrap().has_note("a.htm"));
}

// ===========================================
// Engine: bulk delete and label lifecycle
// ===========================================

#[test]
fn bulk_delete_attempts_every_tag() {
    let env = TestEnv::new();
    env.add_note("[A] a.htm", "x");
    env.add_note("[B] b.htm", "y");
    let mut store = env.open();

    let a = store.tree().group_at_path("A").unwrap();
    let all = store.tree().all();
    let b = store.tree().group_at_path("B").unwrap();

    let results = engine::delete_tags(&mut store, &[a, all, b]);

    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());
    assert!(results[2].1.is_ok());
    assert_eq!(env.files(), vec!["a.htm".to_string(), "b.htm".to_string()]);
}

#[test]
fn created_label_survives_rescan_only_if_carried_by_a_note() {
    let env = TestEnv::new();
    env.add_note("a.htm", "x");
    let mut store = env.open();

    let root = store.tree().root();
    engine::create_tag(&mut store, root, tag("loose"), TagKind::Label).unwrap();
    store.tag_note("a.htm", tag("kept")).unwrap();

    store.scan().unwrap();

    // Explicitly created tags persist as tree nodes; note-carried tags are
    // relinked from metadata.
    let names: Vec<String> = store
        .tree()
        .labels()
        .into_iter()
        .map(|id| store.tree().name(id).unwrap().as_str().to_string())
        .collect();
    assert!(names.contains(&"loose".to_string()));
    assert!(names.contains(&"kept".to_string()));
}

// ===========================================
// Hierarchy-sensitive filtering
// ===========================================

#[test]
fn sub_group_notes_match_parent_filter_with_descendants() {
    let env = TestEnv::new();
    env.add_note("[work] top.htm", "x");
    env.add_note("[work/sub] nested.htm", "y");
    let store = env.open();

    let work = store.tree().group_at_path("work").unwrap();
    let sub = store.tree().group_at_path("work/sub").unwrap();

    use nook::domain::TagMatch;
    assert!(store.tree().matches_filter(sub, work, TagMatch::Identity, true));
    assert!(!store.tree().matches_filter(sub, work, TagMatch::Identity, false));
}
