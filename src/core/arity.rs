// =============================================================================
// ARITY — Les façades typées DataCube1 .. DataCube6
// =============================================================================
//
// Le moteur (`cube`, `pipeline`) est écrit une seule fois, générique sur la
// position. Ce module ne fait qu'ÉPELER les axes un par un à la frontière
// de l'API, pour le confort des appelants :
//
//   cube.get(&("EU", 2024, "vélo"))      // moteur : un tuple
//   cube.get_at("EU", 2024, "vélo")      // façade : trois coordonnées
//
// Tout est généré par des macros qui délèguent au moteur : aucune logique
// propre à une arité. Pour chaque axe k d'une arité n :
//
//   domain_k()      → les coordonnées distinctes sur l'axe k
//   slice_k(&c)     → fixe l'axe k à c, cube d'arité n-1
//   roll_up_k(agg)  → retire l'axe k en repliant les cellules fusionnées
//
// Les cubes dynamiques (`DataCube<Position, V>`) ont les mêmes opérations,
// paramétrées par le numéro d'axe : `domain_dim`, `slice_dim`, `roll_up_dim`.
//
// =============================================================================

use std::collections::HashSet;

use super::coordinate::{Coordinate, Position, Value};
use super::cube::DataCube;
use super::pipeline::ToDataCube;
use crate::error::CubeError;

pub type DataCube1<P1, V> = DataCube<(P1,), V>;
pub type DataCube2<P1, P2, V> = DataCube<(P1, P2), V>;
pub type DataCube3<P1, P2, P3, V> = DataCube<(P1, P2, P3), V>;
pub type DataCube4<P1, P2, P3, P4, V> = DataCube<(P1, P2, P3, P4), V>;
pub type DataCube5<P1, P2, P3, P4, P5, V> = DataCube<(P1, P2, P3, P4, P5), V>;
pub type DataCube6<P1, P2, P3, P4, P5, P6, V> = DataCube<(P1, P2, P3, P4, P5, P6), V>;

// -----------------------------------------------------------------------------
// Accès par coordonnées séparées
// -----------------------------------------------------------------------------

macro_rules! impl_arity {
    ($($P:ident $p:ident),+) => {
        impl<$($P: Coordinate,)+ V> DataCube<($($P,)+), V> {
            /// La cellule aux coordonnées données
            pub fn get_at(&self, $($p: $P),+) -> Option<&V> {
                self.get(&($($p,)+))
            }

            pub fn contains_at(&self, $($p: $P),+) -> bool {
                self.contains(&($($p,)+))
            }

            /// `set_or_else_update` avec une coordonnée par axe
            pub fn set_or_else_update_at<W>(
                &mut self,
                $($p: $P,)+
                value: W,
                initializer: impl FnOnce(W) -> V,
                aggregator: impl FnOnce(V, W) -> V,
            ) -> &V {
                self.set_or_else_update(($($p,)+), value, initializer, aggregator)
            }
        }
    };
}

impl_arity!(P1 p1);
impl_arity!(P1 p1, P2 p2);
impl_arity!(P1 p1, P2 p2, P3 p3);
impl_arity!(P1 p1, P2 p2, P3 p3, P4 p4);
impl_arity!(P1 p1, P2 p2, P3 p3, P4 p4, P5 p5);
impl_arity!(P1 p1, P2 p2, P3 p3, P4 p4, P5 p5, P6 p6);

// -----------------------------------------------------------------------------
// Opérations par axe
// -----------------------------------------------------------------------------

macro_rules! impl_dimension {
    (
        [$($P:ident),+]
        $domain:ident, $slice:ident, $roll_up:ident;
        $Pk:ident . $k:tt;
        [$($R:ident . $r:tt),*]
    ) => {
        #[allow(unused_variables)]
        impl<$($P: Coordinate,)+ V> DataCube<($($P,)+), V> {
            /// Les coordonnées distinctes présentes sur cet axe
            pub fn $domain(&self) -> HashSet<$Pk> {
                self.positions().map(|p| p.$k.clone()).collect()
            }

            /// Fixe cet axe à `coordinate` ; le cube résultant n'a plus cet axe.
            pub fn $slice(&self, coordinate: &$Pk) -> DataCube<($($R,)*), V>
            where
                V: Clone,
            {
                self.slice_by(|p| (&p.$k == coordinate).then(|| ($(p.$r.clone(),)*)))
            }

            /// Retire cet axe ; les cellules qui ne diffèrent que par lui sont
            /// repliées avec `aggregator` (ordre non spécifié).
            pub fn $roll_up(
                &self,
                mut aggregator: impl FnMut(V, &V) -> V,
            ) -> DataCube<($($R,)*), V>
            where
                V: Clone,
            {
                self.roll_up_by(|p| ($(p.$r.clone(),)*), V::clone, |acc, v| aggregator(acc, v))
            }
        }
    };
}

impl_dimension!([P1] domain1, slice1, roll_up1; P1 . 0; []);

impl_dimension!([P1, P2] domain1, slice1, roll_up1; P1 . 0; [P2 . 1]);
impl_dimension!([P1, P2] domain2, slice2, roll_up2; P2 . 1; [P1 . 0]);

impl_dimension!([P1, P2, P3] domain1, slice1, roll_up1; P1 . 0; [P2 . 1, P3 . 2]);
impl_dimension!([P1, P2, P3] domain2, slice2, roll_up2; P2 . 1; [P1 . 0, P3 . 2]);
impl_dimension!([P1, P2, P3] domain3, slice3, roll_up3; P3 . 2; [P1 . 0, P2 . 1]);

impl_dimension!([P1, P2, P3, P4] domain1, slice1, roll_up1; P1 . 0; [P2 . 1, P3 . 2, P4 . 3]);
impl_dimension!([P1, P2, P3, P4] domain2, slice2, roll_up2; P2 . 1; [P1 . 0, P3 . 2, P4 . 3]);
impl_dimension!([P1, P2, P3, P4] domain3, slice3, roll_up3; P3 . 2; [P1 . 0, P2 . 1, P4 . 3]);
impl_dimension!([P1, P2, P3, P4] domain4, slice4, roll_up4; P4 . 3; [P1 . 0, P2 . 1, P3 . 2]);

impl_dimension!([P1, P2, P3, P4, P5] domain1, slice1, roll_up1; P1 . 0; [P2 . 1, P3 . 2, P4 . 3, P5 . 4]);
impl_dimension!([P1, P2, P3, P4, P5] domain2, slice2, roll_up2; P2 . 1; [P1 . 0, P3 . 2, P4 . 3, P5 . 4]);
impl_dimension!([P1, P2, P3, P4, P5] domain3, slice3, roll_up3; P3 . 2; [P1 . 0, P2 . 1, P4 . 3, P5 . 4]);
impl_dimension!([P1, P2, P3, P4, P5] domain4, slice4, roll_up4; P4 . 3; [P1 . 0, P2 . 1, P3 . 2, P5 . 4]);
impl_dimension!([P1, P2, P3, P4, P5] domain5, slice5, roll_up5; P5 . 4; [P1 . 0, P2 . 1, P3 . 2, P4 . 3]);

impl_dimension!([P1, P2, P3, P4, P5, P6] domain1, slice1, roll_up1; P1 . 0; [P2 . 1, P3 . 2, P4 . 3, P5 . 4, P6 . 5]);
impl_dimension!([P1, P2, P3, P4, P5, P6] domain2, slice2, roll_up2; P2 . 1; [P1 . 0, P3 . 2, P4 . 3, P5 . 4, P6 . 5]);
impl_dimension!([P1, P2, P3, P4, P5, P6] domain3, slice3, roll_up3; P3 . 2; [P1 . 0, P2 . 1, P4 . 3, P5 . 4, P6 . 5]);
impl_dimension!([P1, P2, P3, P4, P5, P6] domain4, slice4, roll_up4; P4 . 3; [P1 . 0, P2 . 1, P3 . 2, P5 . 4, P6 . 5]);
impl_dimension!([P1, P2, P3, P4, P5, P6] domain5, slice5, roll_up5; P5 . 4; [P1 . 0, P2 . 1, P3 . 2, P4 . 3, P6 . 5]);
impl_dimension!([P1, P2, P3, P4, P5, P6] domain6, slice6, roll_up6; P6 . 5; [P1 . 0, P2 . 1, P3 . 2, P4 . 3, P5 . 4]);

// -----------------------------------------------------------------------------
// Pipelines avec une clé par axe
// -----------------------------------------------------------------------------

macro_rules! impl_fold_facade {
    ($to:ident, $unique:ident, $collection:ident; $($K:ident $k:ident => $P:ident),+) => {
        /// `ToDataCube::to_data_cube` avec un sélecteur de clé par axe
        pub fn $to<I, $($K, $P,)+ W, V>(
            source: I,
            $(mut $k: $K,)+
            value: impl FnMut(&I::Item) -> W,
            initializer: impl FnMut(W) -> V,
            aggregator: impl FnMut(V, W) -> V,
        ) -> DataCube<($($P,)+), V>
        where
            I: IntoIterator,
            $($K: FnMut(&I::Item) -> $P, $P: Coordinate,)+
        {
            source.to_data_cube(move |r| ($($k(r),)+), value, initializer, aggregator)
        }

        /// `ToDataCube::to_unique_data_cube` avec un sélecteur de clé par axe
        pub fn $unique<I, $($K, $P,)+ W>(
            source: I,
            $(mut $k: $K,)+
            value: impl FnMut(&I::Item) -> W,
        ) -> Result<DataCube<($($P,)+), W>, CubeError<($($P,)+)>>
        where
            I: IntoIterator,
            $($K: FnMut(&I::Item) -> $P, $P: Coordinate,)+
        {
            source.to_unique_data_cube(move |r| ($($k(r),)+), value)
        }

        /// `ToDataCube::to_collection_data_cube` avec un sélecteur de clé par axe
        pub fn $collection<I, $($K, $P,)+ W>(
            source: I,
            $(mut $k: $K,)+
            value: impl FnMut(&I::Item) -> W,
        ) -> DataCube<($($P,)+), Vec<W>>
        where
            I: IntoIterator,
            $($K: FnMut(&I::Item) -> $P, $P: Coordinate,)+
        {
            source.to_collection_data_cube(move |r| ($($k(r),)+), value)
        }
    };
}

impl_fold_facade!(to_data_cube_1, to_unique_data_cube_1, to_collection_data_cube_1;
    K1 key1 => P1);
impl_fold_facade!(to_data_cube_2, to_unique_data_cube_2, to_collection_data_cube_2;
    K1 key1 => P1, K2 key2 => P2);
impl_fold_facade!(to_data_cube_3, to_unique_data_cube_3, to_collection_data_cube_3;
    K1 key1 => P1, K2 key2 => P2, K3 key3 => P3);
impl_fold_facade!(to_data_cube_4, to_unique_data_cube_4, to_collection_data_cube_4;
    K1 key1 => P1, K2 key2 => P2, K3 key3 => P3, K4 key4 => P4);
impl_fold_facade!(to_data_cube_5, to_unique_data_cube_5, to_collection_data_cube_5;
    K1 key1 => P1, K2 key2 => P2, K3 key3 => P3, K4 key4 => P4, K5 key5 => P5);
impl_fold_facade!(to_data_cube_6, to_unique_data_cube_6, to_collection_data_cube_6;
    K1 key1 => P1, K2 key2 => P2, K3 key3 => P3, K4 key4 => P4, K5 key5 => P5, K6 key6 => P6);

// -----------------------------------------------------------------------------
// Cubes dynamiques : l'axe est un paramètre
// -----------------------------------------------------------------------------

impl<V> DataCube<Position, V> {
    /// Les coordonnées distinctes sur l'axe `dim`.
    /// Les positions trop courtes pour avoir cet axe sont ignorées.
    pub fn domain_dim(&self, dim: usize) -> HashSet<Value> {
        self.positions().filter_map(|p| p.get(dim).cloned()).collect()
    }

    /// Fixe l'axe `dim` à `coordinate`.
    pub fn slice_dim(&self, dim: usize, coordinate: &Value) -> DataCube<Position, V>
    where
        V: Clone,
    {
        self.slice_by(|p| (p.get(dim) == Some(coordinate)).then(|| p.without(dim)))
    }

    /// Retire l'axe `dim` en repliant les cellules fusionnées.
    /// Les positions trop courtes pour avoir cet axe gardent leur clé.
    pub fn roll_up_dim(
        &self,
        dim: usize,
        mut aggregator: impl FnMut(V, &V) -> V,
    ) -> DataCube<Position, V>
    where
        V: Clone,
    {
        self.roll_up_by(|p| p.without(dim), V::clone, |acc, v| aggregator(acc, v))
    }
}
