use chrono::Utc;
use qldfuel_client::{PricePayload, RawPrice, RawSite};
use qldfuel_core::{Coordinate, FuelType, IntegrationSettings};

use super::*;

#[test]
fn parses_snapshot_command() {
    let cli = Cli::try_parse_from(["qldfuel-cli", "snapshot"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Snapshot));
}

#[test]
fn cheapest_defaults_to_local_scope() {
    let cli = Cli::try_parse_from(["qldfuel-cli", "cheapest"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cheapest {
            scope: Scope::Local
        }
    ));
}

#[test]
fn cheapest_accepts_global_scope() {
    let cli = Cli::try_parse_from(["qldfuel-cli", "cheapest", "--scope", "global"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Cheapest {
            scope: Scope::Global
        }
    ));
}

#[test]
fn unknown_scope_is_rejected() {
    assert!(Cli::try_parse_from(["qldfuel-cli", "cheapest", "--scope", "mars"]).is_err());
}

#[test]
fn missing_command_is_rejected() {
    assert!(Cli::try_parse_from(["qldfuel-cli"]).is_err());
}

#[test]
fn cheapest_table_has_a_row_per_tracked_fuel() {
    let payload = PricePayload {
        sites: vec![RawSite {
            site_id: "7".to_string(),
            name: Some("Corner Servo".to_string()),
            address: Some("1 Main St".to_string()),
            postcode: Some("4000".to_string()),
            latitude: Some(0.0),
            longitude: Some(0.0),
            brand_id: None,
        }],
        prices: vec![RawPrice {
            site_id: "7".to_string(),
            fuel_id: "12".to_string(),
            price: Some(1799.0),
            transaction_date: None,
        }],
    };
    let settings = IntegrationSettings::new(5, vec![FuelType::E10, FuelType::Diesel], 6).unwrap();
    let snapshot = Snapshot::build(
        &payload,
        Coordinate::new(0.0, 0.0).unwrap(),
        settings,
        Utc::now(),
    );

    let lines = report::cheapest_table(&snapshot, Scope::Local);

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("FUEL"));
    assert!(lines[1].starts_with("E10"));
    assert!(lines[1].contains("179.9"));
    assert!(lines[1].contains("Corner Servo"));
    assert!(lines[1].contains("1 Main St 4000"));
    assert!(lines[1].ends_with("0.0 km"));
    assert!(lines[2].starts_with("Diesel"));
    assert!(lines[2].contains("n/a"));
}
