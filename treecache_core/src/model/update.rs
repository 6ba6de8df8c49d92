use serde::{Deserialize, Deserializer, Serialize};

/// Represents an update action for a field in partial-update requests.
///
/// This enum provides explicit semantics for partial updates, distinguishing between:
/// - Field not present in request (don't change)
/// - Field explicitly set to null (clear the value)
/// - Field has a new value (update to new value)
///
/// # JSON Mapping
/// - Missing field → `Unchanged` (field not in JSON)
/// - `null` value → `Clear` (field explicitly set to null)
/// - Value present → `Set(value)` (field has new value)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Update<T> {
    /// Don't change the field (field missing from request)
    #[default]
    Unchanged,
    /// Clear the field (set to NULL)
    Clear,
    /// Set the field to a new value
    Set(T),
}

impl<T> Update<T> {
    /// Returns `true` if this update should modify the field.
    pub fn should_update(&self) -> bool {
        !matches!(self, Update::Unchanged)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Update::Unchanged)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Update::Clear)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Update::Set(_))
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Update::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to `Option<Option<T>>`: `Unchanged` → `None`, `Clear` → `Some(None)`,
    /// `Set(v)` → `Some(Some(v))`.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Update::Unchanged => None,
            Update::Clear => Some(None),
            Update::Set(v) => Some(Some(v)),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Update<U> {
        match self {
            Update::Unchanged => Update::Unchanged,
            Update::Clear => Update::Clear,
            Update::Set(v) => Update::Set(f(v)),
        }
    }
}

impl<T: Serialize> Serialize for Update<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Update::Unchanged => serializer.serialize_none(),
            Update::Clear => serializer.serialize_none(),
            Update::Set(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Update<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Called only when the field is present in the JSON object.
        let opt = Option::<T>::deserialize(deserializer)?;
        Ok(match opt {
            Some(v) => Update::Set(v),
            None => Update::Clear,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unchanged() {
        let update: Update<String> = Default::default();
        assert_eq!(update, Update::Unchanged);
        assert!(update.is_unchanged());
        assert!(!update.should_update());
    }

    #[test]
    fn clear_should_update() {
        let update: Update<String> = Update::Clear;
        assert!(update.is_clear());
        assert!(update.should_update());
    }

    #[test]
    fn into_option_distinguishes_all_three_states() {
        let unchanged: Update<String> = Update::Unchanged;
        let clear: Update<String> = Update::Clear;
        let set: Update<String> = Update::Set("value".to_string());

        assert_eq!(unchanged.into_option(), None);
        assert_eq!(clear.into_option(), Some(None));
        assert_eq!(set.into_option(), Some(Some("value".to_string())));
    }

    #[test]
    fn map_transforms_set_and_leaves_others_alone() {
        assert_eq!(Update::Set(5).map(|v: i32| v * 2), Update::Set(10));
        assert_eq!(Update::<i32>::Clear.map(|v| v * 2), Update::Clear);
        assert_eq!(Update::<i32>::Unchanged.map(|v| v * 2), Update::Unchanged);
    }

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct Patch {
        #[serde(default)]
        name: Update<String>,
        #[serde(default)]
        parent_id: Update<i64>,
    }

    #[test]
    fn deserialize_missing_field_is_unchanged() {
        let result: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(result.name, Update::Unchanged);
        assert_eq!(result.parent_id, Update::Unchanged);
    }

    #[test]
    fn deserialize_null_is_clear() {
        let result: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(result.parent_id, Update::Clear);
    }

    #[test]
    fn deserialize_value_is_set() {
        let result: Patch = serde_json::from_str(r#"{"name": "Hardware", "parent_id": 3}"#).unwrap();
        assert_eq!(result.name, Update::Set("Hardware".to_string()));
        assert_eq!(result.parent_id, Update::Set(3));
    }

    #[test]
    fn serialize_unchanged_and_clear_both_become_null() {
        assert_eq!(serde_json::to_string(&Update::<i32>::Unchanged).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Update::<i32>::Clear).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Update::Set(7)).unwrap(), "7");
    }
}
