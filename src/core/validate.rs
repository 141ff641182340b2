// =============================================================================
// VALIDATE — Vérification de la forme d'un cube dynamique
// =============================================================================
//
// Un cube typé est rectangulaire PAR CONSTRUCTION : le compilateur garantit
// que toutes les positions ont la même arité et le même type par axe.
//
// Un cube dynamique (`DataCube<Position, V>`), lui, peut recevoir n'importe
// quoi : positions de longueurs différentes, un entier là où l'axe contient
// des chaînes... Avant de l'exporter ou de le trancher par numéro d'axe, on
// vérifie :
//   - toutes les positions ont la même arité
//   - chaque axe ne contient qu'un seul BaseType (NULL accepté partout)
//
// =============================================================================

use std::collections::HashMap;

use super::coordinate::{BaseType, Position};
use super::cube::DataCube;

/// Erreur de validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// La forme d'un cube dynamique valide.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeShape {
    /// Nombre d'axes commun à toutes les positions
    pub arity: usize,
    /// Type de chaque axe ; None si l'axe ne contient que des NULL
    pub dimension_types: Vec<Option<BaseType>>,
}

impl std::fmt::Display for CubeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<String> = self
            .dimension_types
            .iter()
            .map(|t| t.as_ref().map_or("NULL".to_string(), |t| t.to_string()))
            .collect();
        write!(f, "{} axes : ({})", self.arity, types.join(" × "))
    }
}

/// Vérifie qu'un cube dynamique est rectangulaire et retourne sa forme.
///
/// Un cube vide est valide, d'arité 0. Toutes les erreurs sont collectées,
/// triées par message.
///
/// L'arité attendue est la plus fréquente (la plus petite en cas
/// d'égalité) ; de même pour le type attendu de chaque axe. Le résultat ne
/// dépend donc pas de l'ordre d'énumération du cube.
pub fn validate_cube<V>(cube: &DataCube<Position, V>) -> Result<CubeShape, Vec<ValidationError>> {
    if cube.is_empty() {
        return Ok(CubeShape { arity: 0, dimension_types: Vec::new() });
    }

    let mut arity_counts: HashMap<usize, usize> = HashMap::new();
    for position in cube.positions() {
        *arity_counts.entry(position.arity()).or_default() += 1;
    }
    let arity = most_frequent(arity_counts).unwrap_or(0);

    let mut type_counts: Vec<HashMap<BaseType, usize>> = vec![HashMap::new(); arity];
    for position in cube.positions().filter(|p| p.arity() == arity) {
        for (dim, value) in position.coordinates().iter().enumerate() {
            if let Some(found) = value.get_type() {
                *type_counts[dim].entry(found).or_default() += 1;
            }
        }
    }
    let dimension_types: Vec<Option<BaseType>> =
        type_counts.into_iter().map(most_frequent).collect();

    let mut errors = Vec::new();
    for position in cube.positions() {
        if position.arity() != arity {
            errors.push(ValidationError {
                message: format!(
                    "la position {} a {} axes, {} attendus",
                    position,
                    position.arity(),
                    arity
                ),
            });
            continue;
        }

        for (dim, value) in position.coordinates().iter().enumerate() {
            let (Some(found), Some(expected)) = (value.get_type(), &dimension_types[dim]) else {
                continue;
            };
            if found != *expected {
                errors.push(ValidationError {
                    message: format!(
                        "axe {} : {} trouvé à la position {}, {} attendu",
                        dim, found, position, expected
                    ),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(CubeShape { arity, dimension_types })
    } else {
        errors.sort_by(|a, b| a.message.cmp(&b.message));
        Err(errors)
    }
}

/// La clé la plus fréquente ; la plus petite en cas d'égalité.
fn most_frequent<K: Ord>(counts: HashMap<K, usize>) -> Option<K> {
    counts
        .into_iter()
        .max_by(|(ka, na), (kb, nb)| na.cmp(nb).then_with(|| kb.cmp(ka)))
        .map(|(k, _)| k)
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinate::Value;

    fn pos(values: Vec<Value>) -> Position {
        Position::new(values)
    }

    #[test]
    fn test_empty_cube_is_valid() {
        let cube: DataCube<Position, i32> = DataCube::new();
        let shape = validate_cube(&cube).unwrap();
        assert_eq!(shape.arity, 0);
    }

    #[test]
    fn test_rectangular_cube() {
        let mut cube = DataCube::new();
        cube.set(pos(vec!["EU".into(), 2024i64.into()]), 1);
        cube.set(pos(vec!["US".into(), Value::Null]), 2);
        cube.set(pos(vec![Value::Null, 2023i64.into()]), 3);

        let shape = validate_cube(&cube).unwrap();
        assert_eq!(shape.arity, 2);
        assert_eq!(
            shape.dimension_types,
            vec![Some(BaseType::String), Some(BaseType::Integer)]
        );
        assert_eq!(shape.to_string(), "2 axes : (String × Int)");
    }

    #[test]
    fn test_all_null_axis() {
        let mut cube = DataCube::new();
        cube.set(pos(vec![Value::Null]), 1);
        let shape = validate_cube(&cube).unwrap();
        assert_eq!(shape.dimension_types, vec![None]);
    }

    #[test]
    fn test_arity_mismatch() {
        let mut cube = DataCube::new();
        cube.set(pos(vec!["EU".into()]), 1);
        cube.set(pos(vec!["EU".into(), 2024i64.into()]), 2);

        let errors = validate_cube(&cube).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("axes"));
    }

    #[test]
    fn test_type_mismatch() {
        let mut cube = DataCube::new();
        cube.set(pos(vec!["EU".into()]), 1);
        cube.set(pos(vec![42i64.into()]), 2);

        let errors = validate_cube(&cube).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("axe 0"));
    }

    #[test]
    fn test_mixed_arity_blames_the_minority() {
        // même contenu, plusieurs ordres d'insertion : même diagnostic
        let positions = vec![
            pos(vec!["EU".into()]),
            pos(vec!["EU".into(), 2023i64.into()]),
            pos(vec!["US".into(), 2024i64.into()]),
        ];
        for rotation in 0..positions.len() {
            let mut cube = DataCube::new();
            for (i, p) in positions.iter().cycle().skip(rotation).take(positions.len()).enumerate() {
                cube.set(p.clone(), i);
            }
            let errors = validate_cube(&cube).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "la position (\"EU\") a 1 axes, 2 attendus");
        }
    }

    #[test]
    fn test_majority_type_wins() {
        let mut cube = DataCube::new();
        cube.set(pos(vec![1i64.into()]), 1);
        cube.set(pos(vec!["EU".into()]), 2);
        cube.set(pos(vec!["US".into()]), 3);
        cube.set(pos(vec![2i64.into()]), 4);
        cube.set(pos(vec!["JP".into()]), 5);

        let errors = validate_cube(&cube).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "axe 0 : Int trouvé à la position (1), String attendu");
        assert_eq!(errors[1].message, "axe 0 : Int trouvé à la position (2), String attendu");
    }

    #[test]
    fn test_typed_cube_is_always_valid() {
        let mut typed = DataCube::new();
        typed.set(("EU", 2024i64, true), 1.0);
        typed.set(("US", 2023i64, false), 2.0);
        let shape = validate_cube(&typed.to_dynamic()).unwrap();
        assert_eq!(
            shape.dimension_types,
            vec![Some(BaseType::String), Some(BaseType::Integer), Some(BaseType::Boolean)]
        );
    }
}
