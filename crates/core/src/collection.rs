// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! The abstract collection interface the engine is generic over: a small,
//! indexed subset of what any document database offers (filtered finds,
//! upserts, atomic single-document updates, partial unique indexes).

use std::cmp::Ordering;

use chronicle_type::{AttrMap, Value};

use crate::Result;

/// Comparison applied to one (possibly dotted) attribute path.
#[derive(Clone, Debug)]
pub enum Cond {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Exists(bool),
}

/// A conjunction of per-path conditions.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    clauses: Vec<(String, Cond)>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Eq(value.into())));
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Ne(value.into())));
        self
    }

    pub fn gt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Gt(value.into())));
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Gte(value.into())));
        self
    }

    pub fn lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Lt(value.into())));
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Cond::Lte(value.into())));
        self
    }

    pub fn exists(mut self, field: impl Into<String>, present: bool) -> Self {
        self.clauses.push((field.into(), Cond::Exists(present)));
        self
    }

    pub fn clauses(&self) -> &[(String, Cond)] {
        &self.clauses
    }

    /// The equality clauses of this filter; upserting stores seed the fresh
    /// document from these.
    pub fn eq_clauses(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.clauses.iter().filter_map(|(field, cond)| match cond {
            Cond::Eq(value) => Some((field.as_str(), value)),
            _ => None,
        })
    }

    pub fn matches(&self, doc: &AttrMap) -> bool {
        self.clauses.iter().all(|(field, cond)| {
            let value = doc.get_path(field);
            match cond {
                Cond::Eq(expected) => value == Some(expected),
                Cond::Ne(expected) => value != Some(expected),
                Cond::Gt(bound) => value.is_some_and(|v| v > bound),
                Cond::Gte(bound) => value.is_some_and(|v| v >= bound),
                Cond::Lt(bound) => value.is_some_and(|v| v < bound),
                Cond::Lte(bound) => value.is_some_and(|v| v <= bound),
                Cond::Exists(expected) => value.is_some() == *expected,
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Orders two documents under a sort specification; absent attributes sort
/// before present ones.
pub fn compare_docs(left: &AttrMap, right: &AttrMap, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ord = match (left.get_path(&key.field), right.get_path(&key.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(l), Some(r)) => l.cmp(r),
        };
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A `$set`-style update: each named attribute is replaced with the given
/// value.
#[derive(Clone, Debug, Default)]
pub struct UpdateDoc {
    sets: Vec<(String, Value)>,
}

impl UpdateDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((field.into(), value.into()));
        self
    }

    pub fn sets(&self) -> &[(String, Value)] {
        &self.sets
    }

    pub fn apply(&self, doc: &mut AttrMap) {
        for (field, value) in &self.sets {
            doc.insert(field.clone(), value.clone());
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted: bool,
}

/// Declaration of a (possibly partial, possibly unique) index.
#[derive(Clone, Debug)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<SortKey>,
    pub unique: bool,
    /// Only documents matching this filter participate in the index.
    pub partial: Option<Filter>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, fields: Vec<SortKey>) -> Self {
        Self {
            name: name.into(),
            fields,
            unique: false,
            partial: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn partial(mut self, filter: Filter) -> Self {
        self.partial = Some(filter);
        self
    }
}

/// The surface the engine needs from a document collection. Every call is
/// atomic with respect to other calls on the same collection; there are no
/// multi-collection transactions.
pub trait Collection {
    fn insert_one(&self, doc: AttrMap) -> Result<()>;

    fn update_one(&self, filter: &Filter, update: &UpdateDoc, upsert: bool)
    -> Result<UpdateOutcome>;

    fn update_many(&self, filter: &Filter, update: &UpdateDoc) -> Result<u64>;

    fn delete_one(&self, filter: &Filter) -> Result<u64>;

    fn delete_many(&self, filter: &Filter) -> Result<u64>;

    fn find_one(&self, filter: &Filter, options: &FindOptions) -> Result<Option<AttrMap>>;

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<AttrMap>>;

    fn count(&self, filter: &Filter) -> Result<u64>;

    fn create_index(&self, spec: IndexSpec) -> Result<()>;
}

/// Hands out named collections; the engine asks for its chunk, branch,
/// metadata, key and config collections through this at initialize time.
pub trait DocumentStore {
    type Collection: Collection;

    /// Opens the named collection, creating it if needed.
    fn collection(&self, name: &str) -> Self::Collection;
}

#[cfg(test)]
mod test {
    use chronicle_type::{Value, attrs};

    use crate::collection::{Filter, SortKey, compare_docs};

    #[test]
    fn test_filter_eq_and_ne() {
        let doc = attrs! { "a" => 1, "b" => "x" };
        assert!(Filter::all().eq("a", 1).matches(&doc));
        assert!(!Filter::all().eq("a", 2).matches(&doc));
        assert!(Filter::all().ne("a", 2).matches(&doc));
        // an absent attribute is "not equal"
        assert!(Filter::all().ne("missing", 1).matches(&doc));
        assert!(!Filter::all().eq("missing", 1).matches(&doc));
    }

    #[test]
    fn test_filter_ranges() {
        let doc = attrs! { "serial" => 5 };
        assert!(Filter::all().gt("serial", 4).matches(&doc));
        assert!(!Filter::all().gt("serial", 5).matches(&doc));
        assert!(Filter::all().lte("serial", 5).matches(&doc));
        assert!(!Filter::all().lt("serial", 5).matches(&doc));
        // range conditions never match absent attributes
        assert!(!Filter::all().gt("missing", 0).matches(&doc));
    }

    #[test]
    fn test_filter_exists_and_dotted_paths() {
        let doc = attrs! { "payload" => attrs! { "email" => "x@y" } };
        assert!(Filter::all().exists("payload.email", true).matches(&doc));
        assert!(Filter::all().exists("payload.phone", false).matches(&doc));
        assert!(Filter::all().eq("payload.email", "x@y").matches(&doc));
    }

    #[test]
    fn test_filter_is_a_conjunction() {
        let doc = attrs! { "a" => 1, "b" => 2 };
        assert!(Filter::all().eq("a", 1).eq("b", 2).matches(&doc));
        assert!(!Filter::all().eq("a", 1).eq("b", 3).matches(&doc));
    }

    #[test]
    fn test_compare_docs_multi_key() {
        let first = attrs! { "epoch" => 1, "serial" => 9 };
        let second = attrs! { "epoch" => 2, "serial" => 1 };
        let sort = vec![SortKey::desc("epoch"), SortKey::desc("serial")];
        assert_eq!(
            compare_docs(&first, &second, &sort),
            std::cmp::Ordering::Greater
        );

        let by_serial = vec![SortKey::asc("serial")];
        assert_eq!(
            compare_docs(&first, &second, &by_serial),
            std::cmp::Ordering::Greater
        );
    }

    #[test]
    fn test_undefined_value_is_present() {
        let doc = attrs! { "key_email" => Value::Undefined };
        assert!(Filter::all().eq("key_email", Value::Undefined).matches(&doc));
        assert!(!Filter::all().ne("key_email", Value::Undefined).matches(&doc));
    }
}
