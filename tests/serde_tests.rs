#![cfg(feature = "serde")]

use parametrize::prelude::*;

#[test]
fn value_round_trip() {
    let value = Value::Tuple(vec![
        Value::from("adam"),
        Value::Float(0.5),
        Value::Array(vec![1.0, 2.0]),
        Value::Int(3),
        Value::Bool(true),
    ]);
    let json = serde_json::to_string(&value).unwrap();
    let back: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back, value);
}

#[test]
fn choice_metadata_serializes() {
    let mut rng = fastrand::Rng::with_seed(0);
    let mut choice = Choice::builder(["a", "b"]).repetitions(2).build().unwrap();
    choice
        .set_value(&Value::Tuple(vec![Value::from("b"), Value::from("a")]))
        .unwrap();

    let hash = choice.value_hash(&mut rng);
    let back: ValueHash = serde_json::from_str(&serde_json::to_string(&hash).unwrap()).unwrap();
    assert_eq!(back, hash);

    let kind = choice.kind();
    let back: ChoiceKind = serde_json::from_str(&serde_json::to_string(&kind).unwrap()).unwrap();
    assert_eq!(back, kind);

    let descriptors = choice.descriptors();
    let json = serde_json::to_string(&descriptors).unwrap();
    assert!(json.contains("\"ordered\":false"));
}
