//! Кодирование производителей в плотные целые метки

use std::collections::{BTreeSet, HashMap};

use crate::error::ServiceError;

/// Биекция "производитель <-> код" в диапазоне [0, K)
#[derive(Debug, Clone, Default)]
pub struct LabelSpace {
    names: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelSpace {
    /// Коды выдаются в лексикографическом порядке имён
    pub fn fit<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = names.into_iter().collect();
        let names: Vec<String> = unique.into_iter().map(str::to_string).collect();
        let codes = names
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Self { names, codes }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn encode(&self, name: &str) -> Result<usize, ServiceError> {
        self.codes
            .get(name)
            .copied()
            .ok_or_else(|| ServiceError::InvalidInput(format!("unknown manufacturer '{}'", name)))
    }

    pub fn decode(&self, code: usize) -> Result<&str, ServiceError> {
        self.names
            .get(code)
            .map(String::as_str)
            .ok_or(ServiceError::UnknownLabel(code))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
