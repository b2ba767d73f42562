//! JSON rendering of record trees.
//!
//! - **Compact output** via [`to_json()`]
//! - **Pretty output** via [`to_json_pretty()`], with 2-space indentation
//!
//! Both accept anything serializable: a [`Value`](crate::Value), a
//! [`Hash`](crate::Hash) or a whole [`Record`](crate::Record). Field order is
//! the insertion order of each hash, not sorted.
//!
//! # Examples
//!
//! ```
//! use recfix::Value;
//! use recfix::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(vec![Value::from("a"), Value::from("b")]);
//!
//! assert_eq!(to_json(&value).unwrap(), r#"["a","b"]"#);
//! assert_eq!(to_json_pretty(&value).unwrap(), "[\n  \"a\",\n  \"b\"\n]");
//! ```

use serde::Serialize;

use crate::error::Result;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
