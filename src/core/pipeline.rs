// =============================================================================
// PIPELINE — Remplir un cube à partir d'une séquence d'enregistrements
// =============================================================================
//
// C'est un GROUP BY à N clés suivi d'un fold, en une seule passe :
//
//   source ──▶ pour chaque enregistrement r (dans l'ordre de la source) :
//                position     = (clé₁(r), …, cléₙ(r))
//                contribution = valeur(r)
//                cube.set_or_else_update(position, contribution, init, agg)
//
// Chaque enregistrement contribue EXACTEMENT une fois.
//
// Trois saveurs :
//   to_data_cube             → init/agg fournis par l'appelant
//   to_unique_data_cube      → agg = erreur de collision (clés uniques exigées)
//   to_collection_data_cube  → init = [v], agg = push (jamais d'erreur)
//
// Et une version faillible, `try_to_data_cube`, qui respecte la
// configuration (capacité, limite de cardinalité) et propage SANS LES
// TOUCHER les erreurs des callbacks.
//
// La première erreur interrompt le fold. Pas de rollback : avec
// `try_fold_into`, le cube garde les cellules écrites avant
// l'enregistrement fautif.
//
// =============================================================================

use tracing::{debug, trace, warn};

use super::coordinate::PositionKey;
use super::cube::DataCube;
use crate::config::CubeConfig;
use crate::error::CubeError;

/// Replie `source` dans un cube existant.
///
/// Retourne le nombre d'enregistrements lus. La réservation tirée du
/// `size_hint` est plafonnée (voir `CubeConfig::capacity_for`).
///
/// Hérite de `set_or_else_update` : si `aggregator` panique, la cellule en
/// cours d'agrégation disparaît du cube ; les autres cellules sont
/// intactes. `try_fold_into` n'a pas ce défaut.
pub fn fold_into<I, P, W, V>(
    cube: &mut DataCube<P, V>,
    source: I,
    mut position: impl FnMut(&I::Item) -> P,
    mut value: impl FnMut(&I::Item) -> W,
    mut initializer: impl FnMut(W) -> V,
    mut aggregator: impl FnMut(V, W) -> V,
) -> usize
where
    I: IntoIterator,
    P: PositionKey,
{
    let iter = source.into_iter();
    cube.reserve(CubeConfig::default().capacity_for(iter.size_hint()));
    let cells_before = cube.len();
    let mut records = 0usize;

    for record in iter {
        let p = position(&record);
        let w = value(&record);
        cube.set_or_else_update(p, w, &mut initializer, &mut aggregator);
        records += 1;
    }

    let created = cube.len() - cells_before;
    debug!(
        records,
        cells_created = created,
        collisions = records - created,
        "fold terminé"
    );
    records
}

/// Version faillible de `fold_into`.
///
/// - Les erreurs des sélecteurs et des callbacks remontent telles quelles.
/// - `config.max_cells` borne le nombre de cellules du cube.
/// - En cas d'erreur, le cube garde les cellules écrites avant
///   l'enregistrement fautif ; la cellule de cet enregistrement est intacte.
pub fn try_fold_into<I, P, W, V, E>(
    cube: &mut DataCube<P, V>,
    source: I,
    config: &CubeConfig,
    mut position: impl FnMut(&I::Item) -> Result<P, E>,
    mut value: impl FnMut(&I::Item) -> Result<W, E>,
    mut initializer: impl FnMut(W) -> Result<V, E>,
    mut aggregator: impl FnMut(&P, &V, W) -> Result<V, E>,
) -> Result<usize, E>
where
    I: IntoIterator,
    P: PositionKey,
    E: From<CubeError<P>>,
{
    let iter = source.into_iter();
    cube.reserve(config.capacity_for(iter.size_hint()));
    let mut records = 0usize;

    for record in iter {
        let p = position(&record)?;
        let w = value(&record)?;

        if let Some(limit) = config.max_cells {
            if cube.len() >= limit && !cube.contains(&p) {
                warn!(limit, position = ?p, "limite de cardinalité atteinte, fold interrompu");
                return Err(CubeError::CardinalityExceeded { limit, position: p }.into());
            }
        }

        cube.try_set_or_else_update(p, w, &mut initializer, |p, existing, w| {
            trace!(position = ?p, "collision, agrégation");
            aggregator(p, existing, w)
        })?;
        records += 1;
    }

    debug!(records, cells = cube.len(), "fold faillible terminé");
    Ok(records)
}

/// Construction de cubes depuis n'importe quelle source itérable.
///
/// Implémenté pour tout `IntoIterator`. La position est calculée par UN
/// sélecteur qui retourne un tuple ; les façades par arité de `arity`
/// prennent une clé par axe.
pub trait ToDataCube: IntoIterator + Sized {
    /// Group-by-puis-fold : `initializer` crée la cellule à partir de la
    /// première contribution, `aggregator` y replie les suivantes.
    fn to_data_cube<P, W, V>(
        self,
        position: impl FnMut(&Self::Item) -> P,
        value: impl FnMut(&Self::Item) -> W,
        initializer: impl FnMut(W) -> V,
        aggregator: impl FnMut(V, W) -> V,
    ) -> DataCube<P, V>
    where
        P: PositionKey,
    {
        let mut cube = DataCube::new();
        fold_into(&mut cube, self, position, value, initializer, aggregator);
        cube
    }

    /// Exige des positions uniques : deux enregistrements à la même
    /// position donnent `CubeError::Collision` pour cette position.
    fn to_unique_data_cube<P, W>(
        self,
        mut position: impl FnMut(&Self::Item) -> P,
        mut value: impl FnMut(&Self::Item) -> W,
    ) -> Result<DataCube<P, W>, CubeError<P>>
    where
        P: PositionKey,
    {
        self.try_to_data_cube(
            &CubeConfig::default(),
            |r| Ok(position(r)),
            |r| Ok(value(r)),
            Ok,
            |p, _, _| Err(CubeError::Collision { position: p.clone() }),
        )
    }

    /// Chaque cellule est la liste des contributions à sa position, dans
    /// l'ordre de la source. Ne peut pas échouer.
    fn to_collection_data_cube<P, W>(
        self,
        position: impl FnMut(&Self::Item) -> P,
        value: impl FnMut(&Self::Item) -> W,
    ) -> DataCube<P, Vec<W>>
    where
        P: PositionKey,
    {
        self.to_data_cube(position, value, |w| vec![w], |mut acc, w| {
            acc.push(w);
            acc
        })
    }

    /// Version faillible et configurable de `to_data_cube`.
    fn try_to_data_cube<P, W, V, E>(
        self,
        config: &CubeConfig,
        position: impl FnMut(&Self::Item) -> Result<P, E>,
        value: impl FnMut(&Self::Item) -> Result<W, E>,
        initializer: impl FnMut(W) -> Result<V, E>,
        aggregator: impl FnMut(&P, &V, W) -> Result<V, E>,
    ) -> Result<DataCube<P, V>, E>
    where
        P: PositionKey,
        E: From<CubeError<P>>,
    {
        let mut cube = DataCube::with_config(config);
        try_fold_into(&mut cube, self, config, position, value, initializer, aggregator)?;
        Ok(cube)
    }
}

impl<I: IntoIterator> ToDataCube for I {}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIZE_HINT_CAPACITY_CAP;

    fn letters() -> Vec<(&'static str, i32)> {
        vec![("a", 1), ("b", 2), ("a", 3)]
    }

    #[test]
    fn test_sum_by_key() {
        let cube = letters().to_data_cube(|r| (r.0,), |r| r.1, |v| v, |acc, v| acc + v);
        assert_eq!(cube.get(&("a",)), Some(&4));
        assert_eq!(cube.get(&("b",)), Some(&2));
        assert_eq!(cube.len(), 2);
    }

    #[test]
    fn test_unique_collision_names_position() {
        let err = letters().to_unique_data_cube(|r| (r.0,), |r| r.1).unwrap_err();
        assert_eq!(err, CubeError::Collision { position: ("a",) });
    }

    #[test]
    fn test_unique_without_collision() {
        let cube = vec![("a", 1), ("b", 2)]
            .to_unique_data_cube(|r| (r.0,), |r| r.1)
            .unwrap();
        assert_eq!(cube.len(), 2);
        assert_eq!(cube.get(&("b",)), Some(&2));
    }

    #[test]
    fn test_collection_preserves_order() {
        let cube = letters().to_collection_data_cube(|r| (r.0,), |r| r.1);
        assert_eq!(cube.get(&("a",)), Some(&vec![1, 3]));
        assert_eq!(cube.get(&("b",)), Some(&vec![2]));
    }

    #[test]
    fn test_empty_source() {
        let source: Vec<(&str, i32)> = Vec::new();
        let cube = source.to_collection_data_cube(|r| (r.0,), |r| r.1);
        assert!(cube.is_empty());
    }

    #[test]
    fn test_callback_error_propagates_unchanged() {
        #[derive(Debug, PartialEq)]
        enum MyError {
            Negative(i32),
            Cube,
        }
        impl From<CubeError<(&'static str,)>> for MyError {
            fn from(_: CubeError<(&'static str,)>) -> Self {
                MyError::Cube
            }
        }

        let source = vec![("a", 1), ("b", -2), ("c", 3)];
        let result = source.try_to_data_cube(
            &CubeConfig::default(),
            |r| Ok((r.0,)),
            |r| if r.1 < 0 { Err(MyError::Negative(r.1)) } else { Ok(r.1) },
            Ok,
            |_, acc, v| Ok(acc + v),
        );
        assert_eq!(result.unwrap_err(), MyError::Negative(-2));
    }

    #[test]
    fn test_partial_state_kept_by_try_fold_into() {
        let mut cube = DataCube::new();
        let source = vec![("a", 1), ("b", 2), ("a", 3)];
        let result = try_fold_into(
            &mut cube,
            source,
            &CubeConfig::default(),
            |r| Ok((r.0,)),
            |r| Ok(r.1),
            Ok,
            |p, _, _| Err(CubeError::Collision { position: p.clone() }),
        );
        assert!(result.is_err());
        assert_eq!(cube.len(), 2);
        assert_eq!(cube.get(&("a",)), Some(&1));
    }

    #[test]
    fn test_cardinality_limit() {
        let config = CubeConfig { max_cells: Some(2), ..Default::default() };
        let source = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4)];
        let result: Result<DataCube<(&str,), i32>, CubeError<(&str,)>> = source.try_to_data_cube(
            &config,
            |r| Ok((r.0,)),
            |r| Ok(r.1),
            Ok,
            |_, acc, v| Ok(acc + v),
        );
        assert_eq!(
            result.unwrap_err(),
            CubeError::CardinalityExceeded { limit: 2, position: ("c",) }
        );
    }

    #[test]
    fn test_fold_into_existing_cube() {
        let mut cube = letters().to_data_cube(|r| (r.0,), |r| r.1, |v| v, |acc, v| acc + v);
        let read = fold_into(&mut cube, vec![("b", 10), ("z", 1)], |r| (r.0,), |r| r.1, |v| v, |acc, v| acc + v);
        assert_eq!(read, 2);
        assert_eq!(cube.get(&("b",)), Some(&12));
        assert_eq!(cube.len(), 3);
    }

    #[test]
    fn test_many_records_few_cells_keeps_small_capacity() {
        let cube = (0u64..1_000_000).to_data_cube(|i| (i % 2,), |_| 1u64, |v| v, |a, v| a + v);
        assert_eq!(cube.len(), 2);
        assert_eq!(cube.get(&(0,)), Some(&500_000));
        assert!(cube.capacity() < 2 * SIZE_HINT_CAPACITY_CAP, "capacité {}", cube.capacity());

        let bounded: DataCube<(u64,), u64> = (0u64..1_000_000)
            .try_to_data_cube(
                &CubeConfig::default(),
                |i| Ok((i % 3,)),
                |_| Ok(1u64),
                Ok,
                |_, a, v| Ok::<u64, CubeError<(u64,)>>(a + v),
            )
            .unwrap();
        assert_eq!(bounded.len(), 3);
        assert!(bounded.capacity() < 2 * SIZE_HINT_CAPACITY_CAP);
    }

    #[test]
    fn test_explicit_capacity_is_reserved() {
        let config = CubeConfig { initial_capacity: Some(5000), ..Default::default() };
        let cube: DataCube<(u8,), u8> = vec![1u8, 2]
            .try_to_data_cube(&config, |v| Ok((*v,)), |v| Ok(*v), Ok, |_, a, v| {
                Ok::<u8, CubeError<(u8,)>>(a + v)
            })
            .unwrap();
        assert!(cube.capacity() >= 5000);
    }

    #[test]
    fn test_fold_into_panicking_aggregator_drops_only_that_cell() {
        let mut cube = letters().to_data_cube(|r| (r.0,), |r| r.1, |v| v, |acc, v| acc + v);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fold_into(&mut cube, vec![("a", 0)], |r| (r.0,), |r| r.1, |v| v, |_, _| panic!("agrégation"))
        }));
        assert!(result.is_err());
        assert_eq!(cube.get(&("a",)), None);
        assert_eq!(cube.get(&("b",)), Some(&2));

        // la version faillible garde la cellule
        let mut cube = letters().to_data_cube(|r| (r.0,), |r| r.1, |v| v, |acc, v| acc + v);
        let result = try_fold_into(
            &mut cube,
            vec![("a", 0)],
            &CubeConfig::default(),
            |r| Ok((r.0,)),
            |r| Ok(r.1),
            Ok,
            |p, _, _| Err(CubeError::Collision { position: p.clone() }),
        );
        assert!(result.is_err());
        assert_eq!(cube.get(&("a",)), Some(&4));
    }

    #[test]
    fn test_borrowed_source() {
        struct Sale {
            region: String,
            amount: f64,
        }
        let sales = vec![
            Sale { region: "EU".into(), amount: 1.5 },
            Sale { region: "EU".into(), amount: 2.5 },
        ];
        let cube = sales.iter().to_data_cube(
            |s| (s.region.clone(),),
            |s| s.amount,
            |v| v,
            |acc, v| acc + v,
        );
        assert_eq!(cube.get(&("EU".to_string(),)), Some(&4.0));
        assert_eq!(sales.len(), 2);
    }
}
