//! SnakeEngine: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing.
//!
//! Rules:
//!   - engine_version first, then fields in fixed order
//!   - body in head-first order, each cell as `[x, y]`
//!   - phase and heading as their wire codes
//!   - UTF-8 JSON, no whitespace

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::GameState;
use crate::ENGINE_VERSION;

/// Canonical serialization of a `GameState` to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn canonical_hash(state: &GameState) -> String {
    let digest = Sha256::digest(canonical_serialize(state));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Field order: engine_version, phase, heading, score, high_score,
/// body, food, games_played, food_eaten, longest_body
fn build_canonical_value(state: &GameState) -> Value {
    let body: Vec<Value> = state.body.iter().map(|p| json!([p.x, p.y])).collect();

    let mut root = Map::new();
    root.insert("engine_version".to_string(), json!(ENGINE_VERSION));
    root.insert("phase".to_string(), json!(state.phase.code()));
    root.insert("heading".to_string(), json!(state.heading.code()));
    root.insert("score".to_string(), json!(state.score));
    root.insert("high_score".to_string(), json!(state.high_score));
    root.insert("body".to_string(), Value::Array(body));
    root.insert("food".to_string(), json!([state.food.x, state.food.y]));
    root.insert(
        "games_played".to_string(),
        json!(state.counters.games_played),
    );
    root.insert("food_eaten".to_string(), json!(state.counters.food_eaten));
    root.insert(
        "longest_body".to_string(),
        json!(state.counters.longest_body),
    );

    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_serializes_in_fixed_order() {
        let text = String::from_utf8(canonical_serialize(&GameState::default())).unwrap();
        assert!(text.starts_with(r#"{"engine_version":1,"phase":0,"heading":0,"score":0"#));
        assert!(text.ends_with(r#""longest_body":0}"#));
    }

    #[test]
    fn hash_is_lowercase_hex_and_sensitive() {
        let a = GameState::default();
        let mut b = a.clone();
        b.score = 10;
        let ha = canonical_hash(&a);
        assert_eq!(ha.len(), 64);
        assert!(ha.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_ne!(ha, canonical_hash(&b));
        assert_eq!(ha, canonical_hash(&a.clone()));
    }
}
