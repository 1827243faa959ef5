use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Attribute record of a persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advocate {
    class_name: String,
    attributes: BTreeMap<String, Value>,
}

impl Advocate {
    /// Create an empty record for the given class.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Class tag.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Fail unless the class tag is `expected`.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error on mismatch.
    pub fn check_class(&self, expected: &str) -> Result<()> {
        if self.class_name == expected {
            Ok(())
        } else {
            Err(Error::persistence(format!(
                "expected a {expected} record, got {}",
                self.class_name
            )))
        }
    }

    /// Store an attribute, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the value cannot be serialized.
    pub fn save_attribute<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.attributes.insert(name.to_owned(), value);
        Ok(())
    }

    /// Read an attribute.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the attribute is missing or has the
    /// wrong shape.
    pub fn load_attribute<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.attributes.get(name).ok_or_else(|| {
            Error::persistence(format!(
                "{} record has no attribute '{name}'",
                self.class_name
            ))
        })?;
        T::deserialize(value).map_err(|e| {
            Error::persistence(format!(
                "attribute '{name}' of {} record is malformed: {e}",
                self.class_name
            ))
        })
    }

    /// Whether an attribute is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names, in sorted order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Store a nested record.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the record cannot be serialized.
    pub fn save_record(&mut self, name: &str, record: &Self) -> Result<()> {
        self.save_attribute(name, record)
    }

    /// Read a nested record.
    ///
    /// # Errors
    ///
    /// Same as [`Advocate::load_attribute`].
    pub fn load_record(&self, name: &str) -> Result<Self> {
        self.load_attribute(name)
    }

    /// Serialize to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the string is not a valid record.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    #[test]
    fn test_attribute_roundtrip() {
        let mut advocate = Advocate::new("Thing");
        advocate.save_attribute("size", &12usize).unwrap();
        advocate
            .save_attribute("center", &Point::from_vec(vec![0.1, -3.5e-7]))
            .unwrap();
        let json = advocate.to_json().unwrap();
        let back = Advocate::from_json(&json).unwrap();
        assert_eq!(back, advocate);
        assert_eq!(back.load_attribute::<usize>("size").unwrap(), 12);
        assert_eq!(
            back.load_attribute::<Point>("center").unwrap(),
            Point::from_vec(vec![0.1, -3.5e-7])
        );
    }

    #[test]
    fn test_missing_and_malformed() {
        let mut advocate = Advocate::new("Thing");
        advocate.save_attribute("name", "x").unwrap();
        assert!(matches!(
            advocate.load_attribute::<f64>("size"),
            Err(Error::Persistence { .. })
        ));
        assert!(matches!(
            advocate.load_attribute::<f64>("name"),
            Err(Error::Persistence { .. })
        ));
    }

    #[test]
    fn test_check_class() {
        let advocate = Advocate::new("Normal");
        assert!(advocate.check_class("Normal").is_ok());
        assert!(advocate.check_class("Uniform").is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(Advocate::from_json("{not json").is_err());
    }
}
