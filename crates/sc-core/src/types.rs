use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One parsed tag occurrence.
///
/// `line` is the 1-based line of the opening `[` in the tag document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub tag_name: String,
    pub properties: Vec<Property>,
    pub line: usize,
}

impl Command {
    pub fn new(tag_name: impl Into<String>, properties: Vec<Property>, line: usize) -> Self {
        Self {
            tag_name: tag_name.into(),
            properties,
            line,
        }
    }

    /// Builds the handler argument. Duplicate names resolve to the last declared value.
    pub fn argument_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for property in &self.properties {
            map.insert(property.name.clone(), property.value.clone());
        }
        map
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }
}
