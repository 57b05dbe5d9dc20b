//! Algorithm configurations as proposed by the tuner: flat `key=value` pairs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParameterError;

/// Immutable mapping from parameter name to raw string value.
///
/// Built once per evaluated candidate, either from an already materialized
/// mapping or by parsing the tokens received from the tuner, e.g.
/// `constructive=random balanced=true cooldown=0.9438 cyclelength=9`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmConfiguration {
    params: BTreeMap<String, String>,
}

impl AlgorithmConfiguration {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    /// Parse a sequence of `key=value` tokens.
    ///
    /// Each token is split on its first `=`. A value wrapped in one pair of
    /// single quotes has them removed, no other unescaping is done.
    pub fn parse<I, T>(tokens: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut params = BTreeMap::new();
        for token in tokens {
            let token = token.as_ref();
            let (key, value) = match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => (key, value),
                _ => {
                    return Err(ParameterError::MalformedParameter {
                        token: token.to_string(),
                    })
                }
            };
            if params.contains_key(key) {
                return Err(ParameterError::DuplicateParameter {
                    key: key.to_string(),
                });
            }
            params.insert(key.to_string(), strip_quotes(value).to_string());
        }
        Ok(Self { params })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn value_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.value(key).unwrap_or(default)
    }

    /// Integer value of `key`, parsed in radix 10.
    pub fn value_as_int(&self, key: &str) -> Result<Option<i64>, ParameterError> {
        self.parse_value(key, "integer")
    }

    /// Like [`value_as_int`](Self::value_as_int) but absent keys fall back to
    /// `default`. Malformed values are still an error.
    pub fn value_as_int_or(&self, key: &str, default: i64) -> Result<i64, ParameterError> {
        Ok(self.value_as_int(key)?.unwrap_or(default))
    }

    pub fn value_as_double(&self, key: &str) -> Result<Option<f64>, ParameterError> {
        self.parse_value(key, "double")
    }

    pub fn value_as_double_or(&self, key: &str, default: f64) -> Result<f64, ParameterError> {
        Ok(self.value_as_double(key)?.unwrap_or(default))
    }

    pub fn value_as_bool(&self, key: &str) -> Result<Option<bool>, ParameterError> {
        self.parse_value(key, "boolean")
    }

    /// Read-only view of every parameter.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn parse_value<T: FromStr>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, ParameterError> {
        match self.value(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| ParameterError::TypeMismatch {
                    key: key.to_string(),
                    value: raw.to_string(),
                    expected,
                }),
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    // Shell quoting artifact, e.g. name='hello world'
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

impl From<BTreeMap<String, String>> for AlgorithmConfiguration {
    fn from(params: BTreeMap<String, String>) -> Self {
        Self::new(params)
    }
}

impl From<HashMap<String, String>> for AlgorithmConfiguration {
    fn from(params: HashMap<String, String>) -> Self {
        Self::new(params.into_iter().collect())
    }
}

impl FromStr for AlgorithmConfiguration {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.split_whitespace())
    }
}

impl fmt::Display for AlgorithmConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.params {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_values() {
        let config: AlgorithmConfiguration = "a=1 b=true c=0.8".parse().unwrap();
        assert_eq!(config.len(), 3);
        assert_eq!(config.value_as_int("a").unwrap(), Some(1));
        assert_eq!(config.value_or("b", "false"), "true");
        assert_eq!(config.value_as_bool("b").unwrap(), Some(true));
        assert_eq!(config.value_as_double("c").unwrap(), Some(0.8));
        assert_eq!(config.value_as_double_or("missing", 2.5).unwrap(), 2.5);
        assert_eq!(config.value_as_int_or("missing", 7).unwrap(), 7);
        assert_eq!(config.value("missing"), None);
    }

    #[test]
    fn token_without_equals_is_malformed() {
        let err = AlgorithmConfiguration::parse(["novalue"]).unwrap_err();
        assert_eq!(
            err,
            ParameterError::MalformedParameter {
                token: "novalue".into()
            }
        );

        let err = AlgorithmConfiguration::parse(["=orphan"]).unwrap_err();
        assert!(matches!(err, ParameterError::MalformedParameter { .. }));
    }

    #[test]
    fn repeated_key_is_rejected() {
        let err = AlgorithmConfiguration::parse(["a=1", "a=2"]).unwrap_err();
        assert_eq!(err, ParameterError::DuplicateParameter { key: "a".into() });
    }

    #[test]
    fn splits_on_first_equals_only() {
        let config = AlgorithmConfiguration::parse(["expr=x=y", "empty="]).unwrap();
        assert_eq!(config.value("expr"), Some("x=y"));
        assert_eq!(config.value("empty"), Some(""));
    }

    #[test]
    fn quotes_are_stripped_once() {
        let config =
            AlgorithmConfiguration::parse(["greeting='hello world'", "nested=''x''", "plain=abc"])
                .unwrap();
        assert_eq!(config.value("greeting"), Some("hello world"));
        assert_eq!(config.value("nested"), Some("'x'"));
        assert_eq!(config.value("plain"), Some("abc"));

        let lonely = AlgorithmConfiguration::parse(["q='"]).unwrap();
        assert_eq!(lonely.value("q"), Some("'"));
    }

    #[test]
    fn malformed_values_are_not_defaulted() {
        let config = AlgorithmConfiguration::parse(["n=ten", "r=fast"]).unwrap();
        let err = config.value_as_int_or("n", 3).unwrap_err();
        assert!(matches!(err, ParameterError::TypeMismatch { expected: "integer", .. }));
        let err = config.value_as_double_or("r", 1.0).unwrap_err();
        assert!(matches!(err, ParameterError::TypeMismatch { expected: "double", .. }));
    }

    #[test]
    fn builds_from_map_and_displays_sorted() {
        let mut map = HashMap::new();
        map.insert("zeta".to_string(), "1".to_string());
        map.insert("alpha".to_string(), "0.5".to_string());
        let config = AlgorithmConfiguration::from(map);
        assert_eq!(config.as_map().len(), 2);
        assert_eq!(config.to_string(), "alpha=0.5 zeta=1");
    }
}
