// =============================================================================
// DATACUBE — Cubes de données multi-dimensionnels en Rust
// =============================================================================
//
// Un cube range des valeurs agrégées par POSITION, un tuple de N
// coordonnées. On le remplit en repliant une séquence d'enregistrements :
//
//   ventes ──(région, année)──▶ cube[(région, année)] = Σ montants
//
// Architecture :
//   core/     → le cube, ses façades par arité et le pipeline de remplissage
//   config    → réglages (capacité, limite de cardinalité)
//   error     → erreurs du pipeline et de la configuration
//
// Concepts fondamentaux :
//   Coordinate  = une valeur sur un axe
//   Position    = le tuple ordonné des coordonnées d'une cellule
//   Cell        = la valeur agrégée à une position
//   Collision   = deux enregistrements qui tombent sur la même position
//
// =============================================================================

pub mod core;
pub mod config;
pub mod error;

pub use crate::config::CubeConfig;
pub use crate::core::arity::{DataCube1, DataCube2, DataCube3, DataCube4, DataCube5, DataCube6};
pub use crate::core::coordinate::{Coordinate, Position, PositionKey, ToPosition, Value};
pub use crate::core::cube::DataCube;
pub use crate::core::pipeline::ToDataCube;
pub use crate::error::{ConfigError, CubeError};
