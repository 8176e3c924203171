use core::hash::BuildHasherDefault;
use std::collections::{HashMap, HashSet};
use seahash::SeaHasher;

// used to print out readable forms of a value
use std::fmt;

use crate::error::{ReportError, Result};

pub type NameHasher = BuildHasherDefault<SeaHasher>;

// ------------- Value -------------
/// A single entry in an attribute. Rows hand the core text, reductions hand it
/// numbers, and the record does not care which.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    /// Numbers as they are, text only if it parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}
impl From<&String> for Value {
    fn from(s: &String) -> Self { Value::Text(s.clone()) }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self { Value::Number(n as f64) }
}
impl From<u32> for Value {
    fn from(n: u32) -> Self { Value::Number(f64::from(n)) }
}

// ------------- Datum -------------
/// A multi-valued record keyed by an identifier. Attributes must be declared
/// before anything is written to them.
#[derive(Clone, Debug)]
pub struct Datum {
    id: String,
    declared: Vec<String>, // declaration order
    unique: HashSet<String, NameHasher>,
    data: HashMap<String, Vec<Value>, NameHasher>,
}

impl Datum {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            declared: Vec::new(),
            unique: HashSet::default(),
            data: HashMap::default(),
        }
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn declare_attribute(&mut self, name: &str) {
        if !self.is_declared(name) {
            self.declared.push(name.to_owned());
            self.data.insert(name.to_owned(), Vec::new());
        }
    }
    /// Advisory only, owners decide what to do with it.
    pub fn set_unique(&mut self, name: &str) {
        self.unique.insert(name.to_owned());
    }
    pub fn unique_attributes(&self) -> impl Iterator<Item = &str> {
        self.unique.iter().map(String::as_str)
    }
    pub fn is_declared(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }
    pub fn add_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.data.get_mut(name) {
            Some(values) => {
                values.push(value.into());
                Ok(())
            }
            None => Err(ReportError::UndeclaredAttribute {
                datum: self.id.clone(),
                attribute: name.to_owned(),
            }),
        }
    }
    pub fn values(&self, name: &str) -> &[Value] {
        self.data.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn first_value(&self, name: &str) -> Result<&Value> {
        self.values(name).first().ok_or_else(|| ReportError::NoValue {
            datum: self.id.clone(),
            attribute: name.to_owned(),
        })
    }
    pub fn first_text(&self, name: &str) -> Result<String> {
        self.first_value(name).map(Value::to_string)
    }
}
