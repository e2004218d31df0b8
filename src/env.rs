use serde_json::{Map, Number, Value};

/// Build a settings layer from environment variables matching `{PREFIX}__*`.
///
/// `HEREDITAS__POLICY__ADDED=skip` becomes `{"policy": {"added": "skip"}}`.
/// Double underscore separates nesting levels; segments are lowercased.
/// Values are parsed heuristically: bool > integer > float > string.
pub fn env_to_map(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Map<String, Value> {
    let needle = format!("{prefix}__");
    let mut map = Map::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        insert_nested(&mut map, &segments, parse_env_value(&value));
    }

    map
}

/// Insert `value` at the path `segments`, creating intermediate maps. A
/// non-map value in the way is replaced.
pub(crate) fn insert_nested<S: AsRef<str>>(
    map: &mut Map<String, Value>,
    segments: &[S],
    value: Value,
) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.as_ref())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot
            .as_object_mut()
            .expect("hereditas: intermediate settings key was just made a map");
    }
    current.insert(leaf.as_ref().to_string(), value);
}

fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    // Require a dot so "NaN" and "inf" stay strings.
    if s.contains('.')
        && let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}
