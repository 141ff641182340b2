// =============================================================================
// ERROR — Les erreurs du cube et de sa configuration
// =============================================================================
//
// Deux familles :
//   CubeError<P>  → levée par le pipeline (collision, limite de cardinalité).
//                   Générique sur la position pour IDENTIFIER la cellule fautive.
//   ConfigError   → chargement / validation de CubeConfig.
//
// Les erreurs levées par les callbacks de l'appelant (sélecteurs,
// initialiseur, agrégateur) ne sont JAMAIS enveloppées : elles remontent
// telles quelles via les API `try_*`.
//
// =============================================================================

use std::fmt::Debug;
use thiserror::Error;

/// Erreur levée pendant le remplissage d'un cube.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CubeError<P: Debug> {
    /// Deux enregistrements tombent sur la même position alors que
    /// l'appelant a exigé des clés uniques.
    #[error("collision : plusieurs enregistrements à la position {position:?}")]
    Collision { position: P },

    /// Créer la cellule `position` dépasserait `max_cells`.
    #[error("cardinalité dépassée : limite de {limit} cellules atteinte (position {position:?})")]
    CardinalityExceeded { limit: usize, position: P },
}

impl<P: Debug> CubeError<P> {
    /// La position qui a provoqué l'erreur
    pub fn position(&self) -> &P {
        match self {
            CubeError::Collision { position } => position,
            CubeError::CardinalityExceeded { position, .. } => position,
        }
    }
}

/// Erreurs de configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Fichier illisible
    #[error("impossible de lire {path} : {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML invalide
    #[error("TOML invalide : {0}")]
    Parse(#[from] toml::de::Error),

    /// Sérialisation TOML impossible
    #[error("sérialisation TOML impossible : {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Valeurs incohérentes
    #[error("configuration invalide : {0}")]
    Invalid(String),
}
