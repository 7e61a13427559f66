use std::collections::BTreeMap;

use rhai::{Array, Dynamic, ImmutableString, Map, FLOAT, INT};
use sc_core::ScriptValue;

pub(crate) fn args_to_map(args: BTreeMap<String, String>) -> Map {
    let mut map = Map::new();
    for (name, value) in args {
        map.insert(name.into(), Dynamic::from(value));
    }
    map
}

pub(crate) fn dynamic_to_value(value: Dynamic) -> Result<ScriptValue, String> {
    if value.is_unit() {
        return Ok(ScriptValue::Unit);
    }
    if value.is::<bool>() {
        return Ok(ScriptValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(ScriptValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(ScriptValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(ScriptValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<char>() {
        return Ok(ScriptValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(ScriptValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(ScriptValue::Map(out));
    }

    Err(format!(
        "Unsupported handler return type \"{}\".",
        value.type_name()
    ))
}
