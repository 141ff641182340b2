// =============================================================================
// DATACUBE — Point d'entrée : démonstration du cube de données
// =============================================================================
//
// Ce main.rs montre un exemple complet :
//   1. Replier des ventes dans un cube (région × année × produit)
//   2. Lire, trancher et agréger le cube
//   3. Exiger des clés uniques (et voir la collision)
//   4. Regrouper en collections
//   5. Passer en cube dynamique, valider, exporter en JSON-like
//
// Les logs suivent RUST_LOG (par défaut : info).
//
// =============================================================================

use datacube::core::arity::{to_collection_data_cube_1, to_data_cube_3};
use datacube::core::validate;
use datacube::{CubeConfig, CubeError, DataCube, ToDataCube};
use tracing::{error, info};

/// Une ligne de vente
struct Sale {
    region: &'static str,
    year: i32,
    product: &'static str,
    amount: f64,
}

fn sales() -> Vec<Sale> {
    vec![
        Sale { region: "EU", year: 2023, product: "vélo", amount: 1200.0 },
        Sale { region: "EU", year: 2024, product: "vélo", amount: 1500.0 },
        Sale { region: "EU", year: 2024, product: "vélo", amount: 300.0 },
        Sale { region: "EU", year: 2024, product: "casque", amount: 250.0 },
        Sale { region: "US", year: 2024, product: "vélo", amount: 900.0 },
        Sale { region: "US", year: 2023, product: "casque", amount: 80.0 },
    ]
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    println!("╔══════════════════════════════════════════════════╗");
    println!("║      DATACUBE — Cubes de données en Rust         ║");
    println!("║      Group-by à N clés + fold, en une passe      ║");
    println!("╚══════════════════════════════════════════════════╝\n");

    let config = CubeConfig::from_env();
    if let Err(e) = config.validate() {
        error!("configuration invalide : {}", e);
        return;
    }
    info!(?config, "configuration chargée");

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 1 : Replier les ventes (somme des montants)
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 1 : Cube région × année × produit ═══\n");

    let data = sales();
    let cube = to_data_cube_3(
        &data,
        |s| s.region,
        |s| s.year,
        |s| s.product,
        |s| s.amount,
        |v| v,
        |acc, v| acc + v,
    );
    println!("{}\n", cube);

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 2 : Lire, trancher, agréger
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 2 : Lecture, tranches, agrégations ═══\n");

    println!("EU / 2024 / vélo = {:?}", cube.get_at("EU", 2024, "vélo"));
    println!("US / 2023 / vélo = {:?}", cube.get_at("US", 2023, "vélo"));

    let mut regions: Vec<_> = cube.domain1().into_iter().collect();
    regions.sort();
    println!("Régions : {:?}", regions);

    let y2024 = cube.slice2(&2024);
    println!("Tranche 2024 (région × produit) : {}", y2024);

    let by_region = cube.roll_up3(|acc, v| acc + v).roll_up2(|acc, v| acc + v);
    println!("Total par région : {}\n", by_region);

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 3 : Clés uniques
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 3 : Clés uniques ═══\n");

    match data.iter().to_unique_data_cube(|s| (s.region, s.year, s.product), |s| s.amount) {
        Ok(unique) => println!("✓ {} positions uniques", unique.len()),
        Err(CubeError::Collision { position }) => {
            println!("✗ Collision attendue à la position {:?}", position)
        }
        Err(e) => println!("✗ {}", e),
    }

    match data.iter().try_to_data_cube(
        &CubeConfig { max_cells: Some(3), ..config.clone() },
        |s| Ok((s.region, s.year, s.product)),
        |s| Ok(s.amount),
        Ok,
        |_, acc, v| Ok::<f64, CubeError<_>>(acc + v),
    ) {
        Ok(bounded) => println!("✓ {} cellules sous la limite", bounded.len()),
        Err(e) => println!("✗ {}", e),
    }
    println!();

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 4 : Collections
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 4 : Montants par produit, dans l'ordre ═══\n");

    let by_product = to_collection_data_cube_1(&data, |s| s.product, |s| s.amount);
    for ((product,), amounts) in &by_product {
        println!("  {} → {:?}", product, amounts);
    }
    println!();

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 5 : Cube dynamique
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 5 : Cube dynamique ═══\n");

    let dynamic = cube.to_dynamic();
    match validate::validate_cube(&dynamic) {
        Ok(shape) => println!("✓ Cube rectangulaire : {}", shape),
        Err(errors) => {
            for e in errors {
                println!("✗ {}", e);
            }
        }
    }

    let reloaded: DataCube<_, f64> = dynamic
        .iter()
        .to_data_cube(|(p, _)| (*p).clone(), |(_, v)| **v, |v| v, |acc, v| acc + v);
    println!("Rechargé : {} cellules (identique : {})", reloaded.len(), reloaded == dynamic);

    println!("\n═══════════════════════════════════════════════════");
    println!("Démonstration terminée !");
    println!("  {} ventes → {} cellules", data.len(), cube.len());
    println!("═══════════════════════════════════════════════════");
}
