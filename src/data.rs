use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Local};

/// Mutable string-keyed store bound against a template at render time.
///
/// Every value is a string. Boolean semantics are a serialization
/// convention layered on top: a key is truthy iff its value is `"1"` or
/// `"true"` (ASCII case-insensitive, so `"True"` counts). [`set_flag`]
/// writes `"1"`/`"0"`.
///
/// [`set_flag`]: DataStore::set_flag
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataStore {
    values: BTreeMap<String, String>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.values.get(key.as_ref()).map(String::as_str)
    }

    pub fn set<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.values.insert(key.as_ref().to_string(), value.into());
        self
    }

    pub fn contains<K: AsRef<str>>(&self, key: K) -> bool {
        self.values.contains_key(key.as_ref())
    }

    /// Boolean-coerced read: `true` iff the key is present and its value is
    /// truthy under the `"1"`/`"true"` convention. Absent or malformed
    /// values read as `false`.
    pub fn flag<K: AsRef<str>>(&self, key: K) -> bool {
        self.get(key)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    pub fn set_flag<K: AsRef<str>>(&mut self, key: K, value: bool) -> &mut Self {
        self.set(key, if value { "1" } else { "0" })
    }

    /// Marks the block named `name` visible, i.e. `set_flag(name, true)`.
    pub fn show<K: AsRef<str>>(&mut self, name: K) -> &mut Self {
        self.set_flag(name, true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flattens `value` into the store under `root`.
    ///
    /// Field names are lowercased and dotted under the root (an empty root
    /// uses the bare field name): binding a `user` value with an `Email`
    /// field under root `"user"` produces the key `user.email`. Flags store
    /// as `"1"`/`"0"`, date/times as a short local date and time, nested
    /// values recurse with the composed key as their root.
    pub fn bind<B: Bindable + ?Sized>(&mut self, value: &B, root: &str) -> &mut Self {
        for (field, bound) in value.fields() {
            let key = if root.is_empty() {
                field.to_ascii_lowercase()
            } else {
                format!("{root}.{}", field.to_ascii_lowercase())
            };
            match bound {
                BindValue::Text(text) => {
                    self.set(key, text.into_owned());
                }
                BindValue::Flag(flag) => {
                    self.set_flag(key, flag);
                }
                BindValue::DateTime(stamp) => {
                    self.set(key, stamp.format("%x %R").to_string());
                }
                BindValue::Nested(nested) => {
                    self.bind(nested, &key);
                }
            }
        }
        self
    }
}

/// A scalar-or-nested value yielded by [`Bindable::fields`].
pub enum BindValue<'a> {
    Text(Cow<'a, str>),
    Flag(bool),
    DateTime(DateTime<Local>),
    Nested(&'a dyn Bindable),
}

impl<'a> BindValue<'a> {
    /// Text from anything displayable (numbers, ids, ...).
    pub fn text<T: ToString>(value: T) -> Self {
        Self::Text(Cow::Owned(value.to_string()))
    }
}

impl<'a> From<&'a str> for BindValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl From<bool> for BindValue<'_> {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Visitor contract for binding structured values into a [`DataStore`].
///
/// A bindable type enumerates its (field name, value) pairs explicitly; no
/// runtime introspection is involved. Nested values are reached through
/// [`BindValue::Nested`].
pub trait Bindable {
    fn fields(&self) -> Vec<(&'static str, BindValue<'_>)>;
}
