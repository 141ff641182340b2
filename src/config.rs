// =============================================================================
// CONFIG — Réglages du remplissage des cubes
// =============================================================================
//
// Un cube n'a presque rien à configurer : sa capacité initiale et, pour
// les sources non maîtrisées, une limite de cardinalité (nombre maximal de
// cellules distinctes). Format TOML, surcharges par variables d'environnement :
//
// ```toml
// initial_capacity = 1024
// use_size_hint = true
// max_cells = 100000
// ```
//
//   DATACUBE_INITIAL_CAPACITY, DATACUBE_MAX_CELLS, DATACUBE_USE_SIZE_HINT
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Réservation maximale tirée d'un `size_hint`.
///
/// Le `size_hint` compte des enregistrements, pas des cellules : un group-by
/// de 100 millions de lignes peut tomber sur 2 cellules. Au-delà de ce seuil,
/// la table grandit à la demande.
pub const SIZE_HINT_CAPACITY_CAP: usize = 1024;

/// Configuration d'un cube et du pipeline qui le remplit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CubeConfig {
    /// Nombre de cellules à réserver d'avance
    #[serde(default)]
    pub initial_capacity: Option<usize>,

    /// Réserver d'après le `size_hint` de la source quand `initial_capacity`
    /// n'est pas fixée (au plus `SIZE_HINT_CAPACITY_CAP` cellules)
    #[serde(default = "default_use_size_hint")]
    pub use_size_hint: bool,

    /// Nombre maximal de cellules distinctes (None = illimité)
    #[serde(default)]
    pub max_cells: Option<usize>,
}

fn default_use_size_hint() -> bool {
    true
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: None,
            use_size_hint: default_use_size_hint(),
            max_cells: None,
        }
    }
}

impl CubeConfig {
    /// Parse une configuration TOML
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CubeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un fichier TOML
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Charge un fichier puis applique les surcharges d'environnement
    pub fn from_file_with_env(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Configuration par défaut + variables d'environnement
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applique les variables `DATACUBE_*` présentes.
    /// Une valeur illisible est ignorée.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(capacity) = std::env::var("DATACUBE_INITIAL_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.initial_capacity = Some(c);
            }
        }
        if let Ok(max) = std::env::var("DATACUBE_MAX_CELLS") {
            if let Ok(m) = max.parse() {
                self.max_cells = Some(m);
            }
        }
        if let Ok(hint) = std::env::var("DATACUBE_USE_SIZE_HINT") {
            if let Ok(h) = hint.parse() {
                self.use_size_hint = h;
            }
        }
    }

    /// Vérifie la cohérence des réglages
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cells == Some(0) {
            return Err(ConfigError::Invalid("max_cells doit être > 0".to_string()));
        }
        if let (Some(capacity), Some(max)) = (self.initial_capacity, self.max_cells) {
            if capacity > max {
                return Err(ConfigError::Invalid(format!(
                    "initial_capacity ({}) dépasse max_cells ({})",
                    capacity, max
                )));
            }
        }
        Ok(())
    }

    /// Sérialise la configuration en TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Capacité à réserver pour une source dont on connaît le `size_hint`.
    ///
    /// `initial_capacity` est prise telle quelle ; le `size_hint` est plafonné
    /// à `SIZE_HINT_CAPACITY_CAP`. Le tout est plafonné à `max_cells`.
    pub fn capacity_for(&self, size_hint: (usize, Option<usize>)) -> usize {
        let wanted = match self.initial_capacity {
            Some(c) => c,
            None if self.use_size_hint => size_hint.0.min(SIZE_HINT_CAPACITY_CAP),
            None => 0,
        };
        match self.max_cells {
            Some(max) => wanted.min(max),
            None => wanted,
        }
    }
}
