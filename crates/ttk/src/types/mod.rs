mod exception;
mod value;

pub use exception::Exception;
pub use value::{Function, List, Map, Value, Vars};
