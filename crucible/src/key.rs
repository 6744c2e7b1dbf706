//! Canonical identity of an injection target: a type paired with an optional
//! qualifier annotation.

use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A reified type. Rust erases generics at compile time and has no runtime
/// decomposition of a parameterised type into its arguments, so unlike the
/// original's `TypeLiteral` this only carries the erased [`TypeId`] plus a
/// human-readable name — that is all canonicalisation and equality need.
#[derive(Clone, Copy)]
pub struct TypeLiteral {
    id: TypeId,
    name: &'static str,
}

impl TypeLiteral {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for TypeLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TypeLiteral {}

impl Hash for TypeLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A member value captured from a "fully populated" qualifier annotation.
/// Floats are deliberately not supported since `Eq`/`Hash` need exact
/// comparisons; qualifiers are meant to carry small discriminating values
/// (names, ids, flags), not arbitrary data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QualifierValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Type(TypeId),
}

impl From<&str> for QualifierValue {
    fn from(v: &str) -> Self {
        QualifierValue::Str(v.to_owned())
    }
}
impl From<String> for QualifierValue {
    fn from(v: String) -> Self {
        QualifierValue::Str(v)
    }
}
impl From<i64> for QualifierValue {
    fn from(v: i64) -> Self {
        QualifierValue::Int(v)
    }
}
impl From<bool> for QualifierValue {
    fn from(v: bool) -> Self {
        QualifierValue::Bool(v)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A qualifier distinguishes otherwise-identical [`Key`]s. It is either a
/// bare marker type (`@Named` used as a type-level tag) or a value carrying
/// annotation (member values included in equality).
#[derive(Clone)]
pub enum Qualifier {
    Marker(TypeLiteral),
    Value(TypeLiteral, BTreeMap<&'static str, QualifierValue>),
}

impl Qualifier {
    pub fn marker<Q: 'static>() -> Self {
        Qualifier::Marker(TypeLiteral::of::<Q>())
    }

    pub fn value<Q: 'static>(fields: BTreeMap<&'static str, QualifierValue>) -> Self {
        Qualifier::Value(TypeLiteral::of::<Q>(), fields)
    }

    /// Convenience for the common `@Named("x")` shape.
    pub fn named(name: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("value", QualifierValue::Str(name.into()));
        Qualifier::value::<Named>(fields)
    }

    pub fn annotation_type(&self) -> TypeLiteral {
        match self {
            Qualifier::Marker(t) => *t,
            Qualifier::Value(t, _) => *t,
        }
    }

    /// True when `self` and `other` share an annotation type but one is a
    /// bare marker and the other carries values — an illegal mix per §4.A.
    pub fn conflicts_in_kind(&self, other: &Qualifier) -> bool {
        self.annotation_type() == other.annotation_type()
            && std::mem::discriminant(self) != std::mem::discriminant(other)
    }
}

/// Marker type backing [`Qualifier::named`], analogous to Guice's `@Named`.
pub struct Named;

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Marker(t) => write!(f, "@{}", t.name()),
            Qualifier::Value(t, fields) => write!(f, "@{}{:?}", t.name(), fields),
        }
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Qualifier::Marker(a), Qualifier::Marker(b)) => a == b,
            (Qualifier::Value(a, fa), Qualifier::Value(b, fb)) => a == b && fa == fb,
            _ => false,
        }
    }
}
impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Qualifier::Marker(t) => {
                0u8.hash(state);
                t.hash(state);
            }
            Qualifier::Value(t, fields) => {
                1u8.hash(state);
                t.hash(state);
                for (k, v) in fields {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The identity `(type, qualifier?)` under which a value is requested.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    type_literal: TypeLiteral,
    qualifier: Option<Qualifier>,
}

impl Key {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_literal: TypeLiteral::of::<T>(),
            qualifier: None,
        }
    }

    pub fn of_type(type_literal: TypeLiteral) -> Self {
        Self {
            type_literal,
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Equivalent of `Key.ofType(newTypeLiteral)`: same qualifier, new type.
    pub fn rekeyed(&self, type_literal: TypeLiteral) -> Self {
        Self {
            type_literal,
            qualifier: self.qualifier.clone(),
        }
    }

    pub fn type_literal(&self) -> TypeLiteral {
        self.type_literal
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "Key({} {:?})", self.type_literal, q),
            None => write!(f, "Key({})", self.type_literal),
        }
    }
}
