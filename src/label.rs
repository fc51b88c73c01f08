//! Metric label.
//!
//! # References
//!
//! - [Data model](https://prometheus.io/docs/concepts/data_model/)
//! - [Metric and label naming](https://prometheus.io/docs/practices/naming/)
use std::fmt;

use alloc::AllocationPolicy;
use {ErrorKind, Result};

/// Metric label.
///
/// A label is a key-value pair.
///
/// Label names are non-empty and may contain ASCII letters, numbers and underscores.
/// Label values may contain any Unicode (utf-8) characters except the double-quote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    name: String,
    value: String,
}
impl Label {
    /// Makes a new `Label` instance.
    ///
    /// # Errors
    ///
    /// If `name` contains invalid characters or `value` contains a double-quote,
    /// this function returns `ErrorKind::InvalidInput` error.
    ///
    /// # Examples
    ///
    /// ```
    /// use promagg::ErrorKind;
    /// use promagg::label::Label;
    ///
    /// let label = Label::new("foo", "bar").unwrap();
    /// assert_eq!(label.name(), "foo");
    /// assert_eq!(label.value(), "bar");
    /// assert_eq!(label.to_string(), r#"foo="bar""#);
    ///
    /// // Invalid name
    /// assert_eq!(Label::new("fo-o", "bar").err().map(|e| *e.kind()),
    ///            Some(ErrorKind::InvalidInput));
    ///
    /// // Invalid value
    /// assert_eq!(Label::new("foo", "b\"ar").err().map(|e| *e.kind()),
    ///            Some(ErrorKind::InvalidInput));
    /// ```
    pub fn new(name: &str, value: &str) -> Result<Self> {
        track!(Self::with_policy(name, value, AllocationPolicy::default()))
    }

    /// Returns the name of this label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of this label.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn with_policy(name: &str, value: &str, policy: AllocationPolicy) -> Result<Self> {
        track!(validate_name(name), "name={:?}, value={:?}", name, value)?;
        track!(validate_value(value), "name={:?}, value={:?}", name, value)?;
        Ok(Label {
            name: track!(policy.copy_str(name))?,
            value: track!(policy.copy_str(value))?,
        })
    }
}
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}=\"", self.name)?;
        write_escaped(f, &self.value)?;
        write!(f, "\"")
    }
}

/// Validates the given labels and copies them under `policy`.
///
/// `reserved` names a label that is not available to the caller.
pub(crate) fn labels_from_pairs(
    pairs: &[(&str, &str)],
    reserved: Option<&str>,
    policy: AllocationPolicy,
) -> Result<Vec<Label>> {
    let mut labels = track!(policy.vec_with_capacity(pairs.len()))?;
    for &(name, value) in pairs {
        track_assert_ne!(reserved, Some(name), ErrorKind::InvalidInput);
        track_assert!(
            labels.iter().all(|l: &Label| l.name() != name),
            ErrorKind::InvalidInput,
            "Duplicate label: {:?}",
            name
        );
        labels.push(track!(Label::with_policy(name, value, policy))?);
    }
    Ok(labels)
}

/// Checks that `name` is a legal metric or label name.
///
/// REGEX: `[a-zA-Z0-9_]+`
pub(crate) fn validate_name(name: &str) -> Result<()> {
    track_assert!(!name.is_empty(), ErrorKind::InvalidInput);
    for c in name.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {}
            _ => track_panic!(ErrorKind::InvalidInput, "Illegal character: {:?}", c),
        }
    }
    Ok(())
}

/// Checks that `value` is a legal label value or help text.
pub(crate) fn validate_value(value: &str) -> Result<()> {
    track_assert!(
        !value.contains('"'),
        ErrorKind::InvalidInput,
        "Double-quote is not allowed"
    );
    Ok(())
}

// > `label_value` can be any sequence of UTF-8 characters,
// > but the backslash, the double-quote, and the line-feed
// > characters have to be escaped as `\\`, `\"`, and `\n`, respectively.
pub(crate) fn write_escaped<W: fmt::Write>(w: &mut W, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '\\' => w.write_str("\\\\")?,
            '\n' => w.write_str("\\n")?,
            _ => w.write_char(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_are_validated() {
        assert!(validate_name("test_counter1").is_ok());
        assert!(validate_name("0abc").is_ok());
        assert!(validate_name("_").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("bad name!").is_err());
        assert!(validate_name("foo:bar").is_err());
        assert!(validate_name("föo").is_err());
    }

    #[test]
    fn values_are_validated() {
        assert!(validate_value("").is_ok());
        assert!(validate_value("Test counter1").is_ok());
        assert!(validate_value("has\"quote").is_err());
    }

    #[test]
    fn labels_are_escaped() {
        let label = track_try_unwrap!(Label::new("path", "C:\\tmp\nx"));
        assert_eq!(label.to_string(), r#"path="C:\\tmp\nx""#);
    }

    #[test]
    fn labels_from_pairs_works() {
        let policy = AllocationPolicy::default();
        let labels = track_try_unwrap!(labels_from_pairs(
            &[("a", "1"), ("b", "2")],
            None,
            policy
        ));
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].to_string(), r#"b="2""#);

        let e = labels_from_pairs(&[("a", "1"), ("a", "2")], None, policy).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));

        let e = labels_from_pairs(&[("le", "1")], Some("le"), policy).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));

        let e = labels_from_pairs(&[("l", "has\"quote")], None, policy).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
    }
}
