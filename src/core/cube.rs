// =============================================================================
// CUBE — Le magasin de cellules (cœur du cube de données)
// =============================================================================
//
// Un DataCube est une table CLAIRSEMÉE : position → cellule.
// Seules les positions effectivement alimentées existent.
//
// EXEMPLE (2 axes : région × année, cellule = chiffre d'affaires) :
//
//              2023     2024
//     EU   │   120   │   150  │
//     US   │    —    │    90  │      ← (US, 2023) n'existe pas
//
// UNE SEULE PRIMITIVE D'ÉCRITURE : `set_or_else_update`.
//
//   set_or_else_update(position, entrant, init, agg)
//     - pas de cellule à `position` → on stocke init(entrant)
//     - sinon                       → on stocke agg(existant, entrant)
//
// C'est un fold dont le « zéro » est calculé paresseusement à partir du
// premier élément. Toutes les autres écritures (`set`, `get_or_else_set`,
// les pipelines, la désérialisation) passent par elle.
//
// Le cube est générique sur le type de position `P` : il est écrit UNE
// fois pour toutes les arités. Les façades typées (DataCube1..DataCube6)
// sont dans `arity`.
//
// =============================================================================

use std::collections::hash_map::{self, Entry};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use super::coordinate::{Position, PositionKey, ToPosition};
use crate::config::CubeConfig;

/// Cube de données : associe au plus une cellule à chaque position.
///
/// # Concurrence
///
/// **Le cube n'a AUCUNE synchronisation interne.** C'est une structure en
/// mémoire, mono-écrivain : toute écriture exige `&mut self`. Pour partager
/// un cube entre threads, l'appelant doit sérialiser lui-même les accès
/// (`Mutex`, `RwLock`, ...). Un écrivain ne doit jamais concourir avec une
/// énumération en cours.
///
/// # Ordre
///
/// L'ordre d'insertion ne change pas l'ensemble des positions, mais change
/// la valeur d'une cellule si l'agrégateur n'est pas commutatif. L'ordre
/// d'énumération (`iter`) n'est pas spécifié.
///
/// # Panique dans un agrégateur
///
/// `set_or_else_update` sort la cellule du cube avant d'appeler
/// l'agrégateur : s'il panique, la cellule est perdue. `fold_into` et les
/// pipelines infaillibles (`to_data_cube`, `to_collection_data_cube`)
/// héritent de ce comportement. `try_set_or_else_update` et
/// `try_fold_into` laissent la cellule intacte.
#[derive(Debug, Clone)]
pub struct DataCube<P, V> {
    cells: HashMap<P, V>,
}

impl<P: PositionKey, V> DataCube<P, V> {
    /// Crée un cube vide
    pub fn new() -> Self {
        DataCube { cells: HashMap::new() }
    }

    /// Crée un cube vide avec de la place pour `capacity` cellules
    pub fn with_capacity(capacity: usize) -> Self {
        DataCube { cells: HashMap::with_capacity(capacity) }
    }

    /// Crée un cube vide dimensionné selon la configuration
    pub fn with_config(config: &CubeConfig) -> Self {
        Self::with_capacity(config.capacity_for((0, None)))
    }

    /// Réserve de la place pour `additional` cellules de plus
    pub fn reserve(&mut self, additional: usize) {
        self.cells.reserve(additional);
    }

    /// Nombre de cellules que le cube peut contenir sans réallouer
    pub fn capacity(&self) -> usize {
        self.cells.capacity()
    }

    // -------------------------------------------------------------------------
    // Écriture
    // -------------------------------------------------------------------------

    /// LA primitive d'écriture.
    ///
    /// - Pas de cellule à `position` : stocke `initializer(value)`.
    /// - Sinon : stocke `aggregator(existant, value)`.
    ///
    /// Après l'appel, exactement une cellule existe à `position`, et aucune
    /// autre cellule n'a été touchée. Retourne la cellule résultante.
    ///
    /// Si l'agrégateur panique, la cellule existante est perdue : utiliser
    /// `try_set_or_else_update` quand l'agrégation peut échouer.
    pub fn set_or_else_update<W>(
        &mut self,
        position: P,
        value: W,
        initializer: impl FnOnce(W) -> V,
        aggregator: impl FnOnce(V, W) -> V,
    ) -> &V {
        let cell = match self.cells.remove(&position) {
            Some(existing) => aggregator(existing, value),
            None => initializer(value),
        };
        self.cells.entry(position).or_insert(cell)
    }

    /// Variante faillible de `set_or_else_update`.
    ///
    /// L'agrégateur reçoit la position (pour pouvoir construire une erreur
    /// qui l'identifie) et un EMPRUNT de la cellule existante. En cas
    /// d'erreur, elle est retournée telle quelle et le cube est inchangé.
    pub fn try_set_or_else_update<W, E>(
        &mut self,
        position: P,
        value: W,
        initializer: impl FnOnce(W) -> Result<V, E>,
        aggregator: impl FnOnce(&P, &V, W) -> Result<V, E>,
    ) -> Result<&V, E> {
        match self.cells.entry(position) {
            Entry::Occupied(mut entry) => {
                let updated = aggregator(entry.key(), entry.get(), value)?;
                entry.insert(updated);
                Ok(&*entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let cell = initializer(value)?;
                Ok(&*entry.insert(cell))
            }
        }
    }

    /// Écrit `value` à `position`, en écrasant la cellule existante.
    pub fn set(&mut self, position: P, value: V) -> &V {
        self.set_or_else_update(position, value, |v| v, |_, v| v)
    }

    /// Retourne la cellule à `position`, en la créant avec `setter()`
    /// si elle n'existe pas. Une cellule existante n'est pas modifiée.
    pub fn get_or_else_set(&mut self, position: P, setter: impl FnOnce() -> V) -> &V {
        self.set_or_else_update(position, (), |()| setter(), |existing, ()| existing)
    }

    // -------------------------------------------------------------------------
    // Lecture
    // -------------------------------------------------------------------------

    /// La cellule à `position`, si elle existe
    pub fn get(&self, position: &P) -> Option<&V> {
        self.cells.get(position)
    }

    pub fn contains(&self, position: &P) -> bool {
        self.cells.contains_key(position)
    }

    /// Nombre de positions distinctes alimentées
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Énumère les couples (position, cellule), dans un ordre non spécifié.
    ///
    /// L'itération ne modifie rien : on peut la recommencer autant de fois
    /// qu'on veut.
    pub fn iter(&self) -> hash_map::Iter<'_, P, V> {
        self.cells.iter()
    }

    pub fn positions(&self) -> hash_map::Keys<'_, P, V> {
        self.cells.keys()
    }

    pub fn values(&self) -> hash_map::Values<'_, P, V> {
        self.cells.values()
    }

    // -------------------------------------------------------------------------
    // Cubes dérivés (le cube source n'est jamais modifié)
    // -------------------------------------------------------------------------

    /// Applique `f` à chaque cellule. Les positions sont conservées.
    pub fn transform<U>(&self, mut f: impl FnMut(&P, &V) -> U) -> DataCube<P, U> {
        DataCube {
            cells: self.cells.iter().map(|(p, v)| (p.clone(), f(p, v))).collect(),
        }
    }

    /// Garde les cellules qui satisfont `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&P, &V) -> bool) -> DataCube<P, V>
    where
        V: Clone,
    {
        DataCube {
            cells: self
                .cells
                .iter()
                .filter(|(p, v)| predicate(*p, *v))
                .map(|(p, v)| (p.clone(), v.clone()))
                .collect(),
        }
    }

    /// Tranche générique : garde les positions pour lesquelles `select`
    /// retourne `Some(q)`, et les re-range sous la clé `q`.
    ///
    /// `select` est censé être injectif sur les positions gardées (c'est le
    /// cas quand il fixe des coordonnées et retire les axes correspondants).
    /// Sinon une seule des cellules en collision est gardée, laquelle n'est
    /// pas spécifié.
    pub fn slice_by<Q: PositionKey>(
        &self,
        mut select: impl FnMut(&P) -> Option<Q>,
    ) -> DataCube<Q, V>
    where
        V: Clone,
    {
        let mut sliced = DataCube::new();
        for (p, v) in &self.cells {
            if let Some(q) = select(p) {
                sliced.set(q, v.clone());
            }
        }
        sliced
    }

    /// Agrégation générique : re-range chaque cellule sous `project(p)` et
    /// replie les cellules qui tombent sur la même clé projetée.
    ///
    /// `initializer` et `aggregator` jouent le même rôle que dans
    /// `set_or_else_update`, mais sur les cellules du cube source.
    pub fn roll_up_by<Q: PositionKey, T>(
        &self,
        mut project: impl FnMut(&P) -> Q,
        mut initializer: impl FnMut(&V) -> T,
        mut aggregator: impl FnMut(T, &V) -> T,
    ) -> DataCube<Q, T> {
        let mut rolled = DataCube::new();
        for (p, v) in &self.cells {
            rolled.set_or_else_update(
                project(p),
                v,
                |v| initializer(v),
                |acc, v| aggregator(acc, v),
            );
        }
        rolled
    }

    /// Convertit en cube dynamique (positions `Position`).
    ///
    /// Deux positions typées distinctes qui donnent la même `Position`
    /// fusionneraient (une seule cellule gardée, comme dans `slice_by`).
    /// Les conversions fournies vers `Value` sont injectives par axe, et
    /// `Option` n'est convertible qu'à un seul niveau : un
    /// `Option<Option<T>>` n'implémente pas `ToPosition`.
    pub fn to_dynamic(&self) -> DataCube<Position, V>
    where
        P: ToPosition,
        V: Clone,
    {
        self.slice_by(|p| Some(p.to_position()))
    }
}

impl<P: PositionKey, V> Default for DataCube<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PositionKey, V: PartialEq> PartialEq for DataCube<P, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl<P: PositionKey, V: Eq> Eq for DataCube<P, V> {}

impl<P, V> IntoIterator for DataCube<P, V> {
    type Item = (P, V);
    type IntoIter = hash_map::IntoIter<P, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl<'a, P, V> IntoIterator for &'a DataCube<P, V> {
    type Item = (&'a P, &'a V);
    type IntoIter = hash_map::Iter<'a, P, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

impl<P: fmt::Debug, V: fmt::Debug> fmt::Display for DataCube<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cube ({} cellules) {{", self.cells.len())?;
        for (p, v) in &self.cells {
            writeln!(f, "  {:?} => {:?}", p, v)?;
        }
        write!(f, "}}")
    }
}

// =============================================================================
// Sérialisation : une liste d'entrées [position, cellule]
// =============================================================================

impl<P: Serialize, V: Serialize> Serialize for DataCube<P, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len()))?;
        for entry in &self.cells {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

struct CubeVisitor<P, V> {
    marker: PhantomData<fn() -> DataCube<P, V>>,
}

impl<'de, P, V> Visitor<'de> for CubeVisitor<P, V>
where
    P: PositionKey + Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = DataCube<P, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "une liste d'entrées [position, cellule]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut cube = DataCube::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some((position, value)) = seq.next_element::<(P, V)>()? {
            cube.try_set_or_else_update(position, value, Ok, |p, _, _| {
                Err(<A::Error as de::Error>::custom(format!(
                    "position {:?} en double",
                    p
                )))
            })?;
        }
        Ok(cube)
    }
}

impl<'de, P, V> Deserialize<'de> for DataCube<P, V>
where
    P: PositionKey + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(CubeVisitor { marker: PhantomData })
    }
}
