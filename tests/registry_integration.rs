//! Integration tests for the registry tree

mod common;

use common::builders::StatusGroupBuilder;
use libera_dummy::registry::{KindTag, NodeBuilder, Registry, RegistryError, SharedWord, Value};
use std::sync::Arc;
use std::thread;

fn status_registry(word: &SharedWord) -> Registry {
    let registry = Registry::new();
    let node = StatusGroupBuilder::new("il_status", word)
        .bit("x", 0)
        .bit("y", 1)
        .bit("attenuator", 2)
        .field("gain", 8, 4)
        .build()
        .build()
        .unwrap();
    registry.ensure_group("boards/raf5").unwrap();
    registry.attach_at("boards/raf5", node).unwrap();
    registry
}

#[test]
fn test_bit_views_alias_shared_word() {
    let word = SharedWord::new(0);
    let registry = status_registry(&word);

    registry.write("boards/raf5/il_status/x", true).unwrap();
    registry.write("boards/raf5/il_status/attenuator", true).unwrap();
    assert_eq!(word.load(), 5);
    assert_eq!(
        registry.read("boards/raf5/il_status/y").unwrap(),
        Value::Bool(false)
    );

    registry.write("boards/raf5/il_status/gain", 0xAu64).unwrap();
    assert_eq!(word.load(), 0xA05);
    assert_eq!(
        registry.read("boards/raf5/il_status/gain").unwrap(),
        Value::UInt64(0xA)
    );
}

#[test]
fn test_oversized_field_write_rejected() {
    let word = SharedWord::new(0);
    let registry = status_registry(&word);

    let err = registry.write("boards/raf5/il_status/gain", 16u64).unwrap_err();
    assert!(matches!(err, RegistryError::ValueOutOfRange { width: 4, .. }));
    assert_eq!(word.load(), 0);
}

#[test]
fn test_reset_through_exec_node() {
    let word = SharedWord::new(0);
    let registry = status_registry(&word);
    word.store(0xFFF);

    registry.invoke("boards/raf5/il_status/reset").unwrap();
    assert_eq!(word.load(), 0);
    for bit in ["x", "y", "attenuator"] {
        let path = format!("boards/raf5/il_status/{}", bit);
        assert_eq!(registry.read(&path).unwrap(), Value::Bool(false));
    }
}

#[test]
fn test_name_conflict_leaves_tree_unchanged() {
    let registry = Registry::new();
    registry
        .attach_at("", NodeBuilder::uint32("trigger_delay", 7).build().unwrap())
        .unwrap();
    let before = registry.dump_text();

    let err = registry
        .attach_at("", NodeBuilder::group("trigger_delay").build().unwrap())
        .unwrap_err();
    assert!(matches!(err, RegistryError::NameConflict { .. }));
    assert_eq!(registry.dump_text(), before);
    assert_eq!(registry.read("trigger_delay").unwrap(), Value::UInt32(7));
}

#[test]
fn test_failing_action_does_not_poison_registry() {
    let registry = Registry::new();
    let node = NodeBuilder::group("actions")
        .child(NodeBuilder::exec("broken", || -> anyhow::Result<bool> {
            anyhow::bail!("hardware not present")
        }))
        .child(NodeBuilder::exec("refuses", || -> anyhow::Result<bool> { Ok(false) }))
        .child(NodeBuilder::uint32("counter", 1))
        .build()
        .unwrap();
    registry.attach_at("", node).unwrap();

    assert!(matches!(
        registry.invoke("actions/broken"),
        Err(RegistryError::ActionFailed { .. })
    ));
    assert!(matches!(
        registry.invoke("actions/refuses"),
        Err(RegistryError::ActionFailed { .. })
    ));

    registry.write("actions/counter", 2u32).unwrap();
    assert_eq!(registry.read("actions/counter").unwrap(), Value::UInt32(2));
}

#[test]
fn test_type_mismatch_and_missing_paths() {
    let word = SharedWord::new(0);
    let registry = status_registry(&word);

    assert!(matches!(
        registry.read("boards/raf6/il_status/x"),
        Err(RegistryError::PathNotFound { .. })
    ));
    assert!(matches!(
        registry.write("boards/raf5/il_status/x", Value::Text("on".to_string())),
        Err(RegistryError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.write("boards/raf5", true),
        Err(RegistryError::Unsupported { .. })
    ));
}

#[test]
fn test_dump_is_preorder_with_kinds() {
    let word = SharedWord::new(0);
    let registry = status_registry(&word);

    let entries = registry.dump();
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "boards",
            "boards/raf5",
            "boards/raf5/il_status",
            "boards/raf5/il_status/reset",
            "boards/raf5/il_status/x",
            "boards/raf5/il_status/y",
            "boards/raf5/il_status/attenuator",
            "boards/raf5/il_status/gain",
        ]
    );
    assert_eq!(entries[3].kind, KindTag::Exec);
    assert!(entries[3].value.is_none());
    assert_eq!(entries[4].kind, KindTag::BitView);

    let json: serde_json::Value = serde_json::from_str(&registry.dump_json().unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), entries.len());
}

#[test]
fn test_concurrent_clients_and_sampler() {
    let word = SharedWord::new(0);
    let registry = Arc::new(status_registry(&word));

    let sampler = {
        let word = word.clone();
        thread::spawn(move || {
            for _ in 0..1000 {
                word.set_bits(1 << 2);
            }
        })
    };
    let clients: Vec<_> = ["x", "y"]
        .into_iter()
        .map(|bit| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let path = format!("boards/raf5/il_status/{}", bit);
                for i in 0..1000 {
                    registry.write(&path, i % 2 == 0).unwrap();
                }
                registry.write(&path, true).unwrap();
            })
        })
        .collect();

    sampler.join().unwrap();
    for client in clients {
        client.join().unwrap();
    }
    assert_eq!(word.load(), 0b111);
}
