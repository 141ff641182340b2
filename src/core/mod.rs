// =============================================================================
// CORE — Le cube de données et son pipeline
// =============================================================================
//
// Tout est en mémoire, mono-thread, sans E/S.
//
// Architecture (des feuilles vers le haut) :
//   coordinate → les valeurs d'axes et les clés de position
//   cube       → le magasin de cellules (UNE primitive d'écriture)
//   pipeline   → source + sélecteurs → cube (group-by puis fold)
//   arity      → façades typées DataCube1..DataCube6
//   validate   → forme des cubes dynamiques
//
// =============================================================================

pub mod coordinate;
pub mod cube;
pub mod pipeline;
pub mod arity;
pub mod validate;
