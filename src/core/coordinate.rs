// =============================================================================
// COORDINATE — Les valeurs d'axes et les clés de position
// =============================================================================
//
// Un cube range ses cellules par POSITION : un tuple ordonné de N
// coordonnées, une par dimension (axe).
//
//   position = (région, année, produit)
//                 │        │       │
//              axe 1    axe 2   axe 3
//
// Deux représentations cohabitent :
//
//   1. Les positions TYPÉES : de simples tuples Rust `(A,)`, `(A, B)`, ...
//      jusqu'à 6 axes. Chaque axe a son propre type, vérifié à la compilation.
//      L'égalité et le hash sont ceux du tuple : composante par composante,
//      l'ordre des axes compte.
//
//   2. Les positions DYNAMIQUES : `Position`, une liste de `Value` dont
//      l'arité n'est connue qu'à l'exécution (cubes lus depuis un export,
//      plus de 6 axes, ...).
//
// ÉGALITÉ DES ABSENTS : `None == None` pour les `Option<T>`, et
// `Value::Null == Value::Null`. Les deux se hashent de façon cohérente.
//
// =============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

/// Le type d'une coordonnée dynamique.
///
/// Sert à vérifier qu'un cube dynamique est « rectangulaire » : un seul type
/// par axe (voir `validate`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BaseType {
    /// Chaîne de caractères
    String,
    /// Entier signé 64 bits
    Integer,
    /// Nombre à virgule flottante
    Float,
    /// Booléen
    Boolean,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::String => write!(f, "String"),
            BaseType::Integer => write!(f, "Int"),
            BaseType::Float => write!(f, "Float"),
            BaseType::Boolean => write!(f, "Bool"),
        }
    }
}

/// Une coordonnée dynamique.
///
/// Contrairement à un `f64` brut, `Value` est `Eq + Hash` : les flottants
/// sont comparés sur leur motif binaire canonique (`-0.0 == 0.0`, tous les
/// NaN sont égaux entre eux). Sans ça, un NaN ne retrouverait jamais sa
/// cellule.
///
/// # Export
///
/// Un `Value` s'exporte comme le scalaire nu (`"EU"`, `2024`, `1.5`, `true`,
/// `null`). Les flottants non finis (NaN, ±∞) sont REFUSÉS à l'export : JSON
/// n'a pas de littéral pour eux et les relirait comme `Null`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(std::string::String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

/// Motif binaire canonique d'un flottant, utilisé pour l'égalité et le hash.
fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => canonical_bits(*f).hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => Err(ser::Error::custom(format!(
                "flottant non fini {} : pas d'export possible",
                f
            ))),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Retourne le BaseType de cette valeur (None pour Null, qui n'en a pas)
    pub fn get_type(&self) -> Option<BaseType> {
        match self {
            Value::String(_) => Some(BaseType::String),
            Value::Integer(_) => Some(BaseType::Integer),
            Value::Float(_) => Some(BaseType::Float),
            Value::Boolean(_) => Some(BaseType::Boolean),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(s: std::string::String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// `None` → `Null`. Seulement pour les scalaires : un `Option<Option<T>>`
// confondrait `None` et `Some(None)`.
macro_rules! impl_from_option {
    ($($t:ty),*) => {
        $(
            impl From<Option<$t>> for Value {
                fn from(opt: Option<$t>) -> Self {
                    opt.map_or(Value::Null, Into::into)
                }
            }
        )*
    };
}

impl_from_option!(std::string::String, i64, i32, u32, f64, bool);

impl<'a> From<Option<&'a str>> for Value {
    fn from(opt: Option<&'a str>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Coordonnées et clés typées
// =============================================================================

/// Une coordonnée : n'importe quel type comparable et hashable.
///
/// Implémenté automatiquement ; sert surtout de raccourci pour les bornes.
pub trait Coordinate: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Coordinate for T {}

/// Une clé de position : un tuple ordonné de coordonnées.
///
/// Implémenté pour les tuples de 0 à 6 coordonnées et pour `Position`.
pub trait PositionKey: Clone + Eq + Hash + fmt::Debug {
    /// Nombre d'axes de cette position
    fn arity(&self) -> usize;
}

/// Conversion d'une position typée en position dynamique.
pub trait ToPosition {
    fn to_position(&self) -> Position;
}

macro_rules! impl_position_key {
    ($n:expr; $($P:ident . $i:tt),*) => {
        impl<$($P: Coordinate),*> PositionKey for ($($P,)*) {
            fn arity(&self) -> usize {
                $n
            }
        }

        impl<$($P: Clone + Into<Value>),*> ToPosition for ($($P,)*) {
            fn to_position(&self) -> Position {
                Position::new(vec![$(self.$i.clone().into()),*])
            }
        }
    };
}

impl_position_key!(0;);
impl_position_key!(1; P1 . 0);
impl_position_key!(2; P1 . 0, P2 . 1);
impl_position_key!(3; P1 . 0, P2 . 1, P3 . 2);
impl_position_key!(4; P1 . 0, P2 . 1, P3 . 2, P4 . 3);
impl_position_key!(5; P1 . 0, P2 . 1, P3 . 2, P4 . 3, P5 . 4);
impl_position_key!(6; P1 . 0, P2 . 1, P3 . 2, P4 . 3, P5 . 4, P6 . 5);

// =============================================================================
// Position dynamique
// =============================================================================

/// Position d'arité quelconque, connue seulement à l'exécution.
///
/// Deux positions sont égales ssi elles ont la même arité et des
/// coordonnées égales deux à deux, dans le même ordre.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position(Vec<Value>);

impl Position {
    pub fn new(coordinates: Vec<Value>) -> Self {
        Position(coordinates)
    }

    /// Nombre d'axes
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Coordonnée sur l'axe `dim` (0-indexé)
    pub fn get(&self, dim: usize) -> Option<&Value> {
        self.0.get(dim)
    }

    pub fn coordinates(&self) -> &[Value] {
        &self.0
    }

    /// La même position sans l'axe `dim`.
    /// Si `dim` est hors bornes, la position est retournée telle quelle.
    pub fn without(&self, dim: usize) -> Position {
        Position(
            self.0
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != dim)
                .map(|(_, v)| v.clone())
                .collect(),
        )
    }
}

impl PositionKey for Position {
    fn arity(&self) -> usize {
        self.0.len()
    }
}

impl ToPosition for Position {
    fn to_position(&self) -> Position {
        self.clone()
    }
}

impl From<Vec<Value>> for Position {
    fn from(coordinates: Vec<Value>) -> Self {
        Position(coordinates)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from("x").get_type(), Some(BaseType::String));
        assert_eq!(Value::from(42i64).get_type(), Some(BaseType::Integer));
        assert_eq!(Value::Null.get_type(), None);
    }

    #[test]
    fn test_null_equals_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(hash_of(&Value::Null), hash_of(&Value::Null));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_optional_scalars() {
        assert_eq!(Value::from(Some("EU")), Value::from("EU"));
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some(2.5f64)), Value::Float(2.5));
        assert_eq!(Value::from(None::<bool>), Value::Null);
        assert_eq!((Some(1i32), None::<String>).to_position().coordinates(), &[Value::Integer(1), Value::Null]);
    }

    #[test]
    fn test_float_canonical_equality() {
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(hash_of(&Value::Float(0.0)), hash_of(&Value::Float(-0.0)));
        assert_eq!(Value::Float(f64::NAN), Value::Float(-f64::NAN));
        assert_eq!(hash_of(&Value::Float(f64::NAN)), hash_of(&Value::Float(f64::NAN)));
        assert_ne!(Value::Float(1.0), Value::Integer(1));
    }

    #[test]
    fn test_value_export() {
        let values = vec![
            Value::from("EU"),
            Value::Integer(2024),
            Value::Float(1.5),
            Value::Boolean(true),
            Value::Null,
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"["EU",2024,1.5,true,null]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_non_finite_float_refused_on_export() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = serde_json::to_string(&Value::Float(f)).unwrap_err();
            assert!(err.to_string().contains("non fini"));
        }
        let p = Position::new(vec!["a".into(), Value::Float(f64::NAN)]);
        assert!(serde_json::to_string(&p).is_err());
    }

    #[test]
    fn test_tuple_arity() {
        assert_eq!(().arity(), 0);
        assert_eq!(("a",).arity(), 1);
        assert_eq!(("a", 1, true, 'c', 2u8, None::<i32>).arity(), 6);
    }

    #[test]
    fn test_order_is_significant() {
        assert_ne!(("a", "b"), ("b", "a"));
        assert_ne!(
            Position::new(vec!["a".into(), "b".into()]),
            Position::new(vec!["b".into(), "a".into()])
        );
    }

    #[test]
    fn test_to_position() {
        let p = ("EU", 2024i64, Some(true)).to_position();
        assert_eq!(p.arity(), 3);
        assert_eq!(p.get(0), Some(&Value::from("EU")));
        assert_eq!(p.get(1), Some(&Value::Integer(2024)));
        assert_eq!(p.get(2), Some(&Value::Boolean(true)));
        assert_eq!(p.get(3), None);
    }

    #[test]
    fn test_without() {
        let p = Position::new(vec!["a".into(), 1i64.into(), Value::Null]);
        assert_eq!(p.without(1), Position::new(vec!["a".into(), Value::Null]));
        assert_eq!(p.without(9), p);
    }

    #[test]
    fn test_position_display() {
        let p = Position::new(vec!["a".into(), 1i64.into(), Value::Null]);
        assert_eq!(p.to_string(), "(\"a\", 1, NULL)");
    }
}
