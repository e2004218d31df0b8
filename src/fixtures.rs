#[cfg(test)]
pub mod test {
    use serde_json::{Map, Value, json};

    /// Unwrap a `json!` object literal into a tree.
    pub fn tree(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture is not an object: {other}"),
        }
    }

    /// A small bot configuration: ungrouped, grouped, labelled and disabled instances.
    pub fn current_tree() -> Map<String, Value> {
        tree(json!({
            "$theme": "dark",
            "console": { "port": 5140 },
            "group:basic": {
                "$label": "Basic",
                "help": { "shortcut": true },
                "~sudo": {}
            },
            "group:chat": {
                "echo:a1": { "prefix": "!", "aliases": ["say"] },
                "group:adapters": {
                    "adapter-qq": { "token": "old", "retry": { "times": 3, "delay": 100 } }
                }
            }
        }))
    }

    /// The same bot after edits made elsewhere.
    pub fn imported_tree() -> Map<String, Value> {
        tree(json!({
            "console": { "port": 5140 },
            "group:basic": {
                "$label": "Basic",
                "help": { "shortcut": false, "verbose": true }
            },
            "group:chat": {
                "echo:a1": { "prefix": "!", "aliases": "say" },
                "group:adapters": {
                    "adapter-qq": { "token": "new", "retry": { "times": 5 } }
                }
            },
            "dice": { "sides": 20 }
        }))
    }

    #[test]
    fn fixtures_are_maps() {
        assert!(current_tree().contains_key("console"));
        assert!(imported_tree().contains_key("dice"));
    }
}
