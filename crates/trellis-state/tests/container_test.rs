//! Integration tests for trellis-state: threads, persistence and presets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use trellis_config::testing::TestEnvironment;
use trellis_state::presets::{available_presets, load_preset, save_preset};
use trellis_state::{Record, StateContainer, Value};

fn training_config() -> Value {
    Record::new()
        .with("workspace_dir", "workspace/run")
        .with("learning_rate", 0.0001)
        .with("batch_size", 4)
        .with("tensorboard_port", 6006)
        .with(
            "optimizer",
            Record::new().with("beta1", 0.9).with("weight_decay", 0.01),
        )
        .with("additional_embeddings", Value::List(vec![]))
        .with("scheduler_params", Value::List(vec![]))
        .into()
}

#[test]
fn test_bulk_read_sees_consistent_snapshot() {
    let state = Arc::new(StateContainer::new(Value::map([
        ("left", Value::from(0)),
        ("right", Value::from(0)),
    ])));
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let state = Arc::clone(&state);
        let stop = Arc::clone(&stop);
        thread::spawn(move || loop {
            let values = state.bulk_read(["left", "right"]);
            assert_eq!(values[0], values[1], "bulk read straddled a bulk write");
            if stop.load(Ordering::SeqCst) {
                break;
            }
        })
    };

    for i in 1..=300 {
        state.bulk_write([("left", i), ("right", i)]);
    }
    stop.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    assert_eq!(state.get("left"), Some(Value::from(300)));
}

#[test]
fn test_concurrent_setters_on_distinct_paths() {
    let state = Arc::new(StateContainer::new(Value::List(vec![
        Value::from(0.0);
        8
    ])));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for n in 0..100 {
                    assert!(state.set(format!("{}", i), n));
                    // Float slot: integers come back as floats
                    assert_eq!(state.get(format!("{}", i)), Some(Value::from(n as f64)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    for i in 0..8 {
        assert_eq!(state.get(format!("{}", i)), Some(Value::from(99.0)));
    }
}

#[test]
fn test_compound_edit_inside_write_region() {
    let state = StateContainer::new(training_config());

    {
        let _region = state.write_region();
        let count = state
            .get("additional_embeddings")
            .and_then(|v| v.as_list().map(|l| l.len()))
            .unwrap_or(0);
        state.put_at(
            "scheduler_params",
            count,
            Value::map([("key", "warmup"), ("value", "100")]),
        );
    }

    assert_eq!(state.get("scheduler_params.0.key"), Some(Value::from("warmup")));
}

#[test]
fn test_save_and_load_roundtrip() {
    let env = TestEnvironment::new().unwrap();
    let file = env.scratch_path("state.json");

    let state = StateContainer::new(training_config());
    state.set("optimizer.beta1", 0.95);
    state.set("batch_size", 16);
    state.save_json(&file).unwrap();

    let fresh = StateContainer::new(training_config());
    fresh.load_json(&file).unwrap();

    assert_eq!(fresh.get("optimizer.beta1"), Some(Value::from(0.95)));
    assert_eq!(fresh.get("batch_size"), Some(Value::from(16)));
    assert_eq!(fresh.snapshot(), state.snapshot());
}

#[test]
fn test_load_keeps_float_slots_and_ignores_unknown_fields() {
    let env = TestEnvironment::new().unwrap();
    let file = env
        .create_file(
            "partial.json",
            br#"{"learning_rate": 1, "bogus": true, "optimizer": {"beta1": "0.5"}}"#,
        )
        .unwrap();

    let state = StateContainer::new(training_config());
    state.load_json(&file).unwrap();

    assert_eq!(state.get("learning_rate"), Some(Value::from(1.0)));
    assert_eq!(state.get("optimizer.beta1"), Some(Value::from(0.5)));
    assert_eq!(state.get("optimizer.weight_decay"), Some(Value::from(0.01)));
    assert_eq!(state.get("bogus"), None);
}

#[test]
fn test_load_missing_file_is_error() {
    let env = TestEnvironment::new().unwrap();
    let state = StateContainer::new(training_config());
    assert!(state.load_json(env.scratch_path("absent.json")).is_err());
}

#[test]
fn test_presets_roundtrip() {
    let env = TestEnvironment::new().unwrap();
    env.create_preset("#", "{}").unwrap();

    let state = StateContainer::new(training_config());
    state.set("batch_size", 2);
    let written = save_preset(&state, &env.presets_dir, "tiny batch").unwrap();
    assert!(written.ends_with("tiny batch.json"));

    let names: Vec<_> = available_presets(&env.presets_dir, true)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["", "tiny batch"]);

    let other = StateContainer::new(training_config());
    load_preset(&other, &env.presets_dir, "tiny batch").unwrap();
    assert_eq!(other.get("batch_size"), Some(Value::from(2)));
}

proptest! {
    /// set-then-get returns what was written, as a float when the slot is one.
    #[test]
    fn prop_set_get_roundtrip(index in 0usize..4, x in -1_000_000i64..1_000_000) {
        let state = StateContainer::new(Value::map([
            ("floats", Value::List(vec![Value::from(0.0); 4])),
            ("ints", Value::List(vec![Value::from(0); 4])),
        ]));

        let float_path = format!("floats.{}", index);
        prop_assert!(state.set(float_path.as_str(), x));
        prop_assert_eq!(state.get(float_path.as_str()), Some(Value::from(x as f64)));

        let int_path = format!("ints.{}", index);
        prop_assert!(state.set(int_path.as_str(), x));
        prop_assert_eq!(state.get(int_path.as_str()), Some(Value::from(x)));
    }

    #[test]
    fn prop_out_of_range_never_panics(index in 4usize..64) {
        let state = StateContainer::new(Value::List(vec![Value::from(1.0); 4]));
        let path = format!("{}", index);
        prop_assert_eq!(state.get(path.as_str()), None);
        prop_assert!(!state.set(path.as_str(), 1));
    }
}
