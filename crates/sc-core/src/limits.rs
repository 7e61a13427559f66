use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TAG_NAME_LEN: usize = 128;
pub const DEFAULT_MAX_PROPERTIES: usize = 128;
pub const DEFAULT_MAX_PROPERTY_NAME_LEN: usize = 128;
pub const DEFAULT_MAX_PROPERTY_VALUE_LEN: usize = 4096;
pub const DEFAULT_MAX_COMMANDS: usize = 65536;

/// Capacity ceilings applied while parsing a tag document.
///
/// Lengths are measured in bytes of UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseLimits {
    pub max_tag_name_len: usize,
    pub max_properties: usize,
    pub max_property_name_len: usize,
    pub max_property_value_len: usize,
    pub max_commands: usize,
}

impl ParseLimits {
    pub fn unbounded() -> Self {
        Self {
            max_tag_name_len: usize::MAX,
            max_properties: usize::MAX,
            max_property_name_len: usize::MAX,
            max_property_value_len: usize::MAX,
            max_commands: usize::MAX,
        }
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_tag_name_len: DEFAULT_MAX_TAG_NAME_LEN,
            max_properties: DEFAULT_MAX_PROPERTIES,
            max_property_name_len: DEFAULT_MAX_PROPERTY_NAME_LEN,
            max_property_value_len: DEFAULT_MAX_PROPERTY_VALUE_LEN,
            max_commands: DEFAULT_MAX_COMMANDS,
        }
    }
}
