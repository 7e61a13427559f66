pub mod error;
pub mod limits;
pub mod types;
pub mod value;

pub use error::{
    Diagnostic, DispatchError, LoadError, ParseError, ParseErrorKind, ScriptError,
    ScriptErrorKind,
};
pub use limits::ParseLimits;
pub use types::*;
pub use value::*;
