//! Plain-text rendering for `cheapest`.

use qldfuel_engine::{BestPriceSensor, Scope, Snapshot};

/// One header line plus one row per fuel tracked by the snapshot's settings.
pub(crate) fn cheapest_table(snapshot: &Snapshot, scope: Scope) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<16}{:<10}{:<28}{:<36}DISTANCE",
        "FUEL", "PRICE", "STATION", "ADDRESS"
    )];

    for &fuel in snapshot.settings.fuel_types() {
        let reading = BestPriceSensor::new(fuel, scope).reading(snapshot);
        let Some(price) = reading.price else {
            lines.push(format!("{:<16}{:<10}", fuel.label(), "n/a"));
            continue;
        };
        let distance = reading
            .distance_km
            .map(|d| format!("{d:.1} km"))
            .unwrap_or_default();
        lines.push(format!(
            "{:<16}{:<10.1}{:<28}{:<36}{}",
            fuel.label(),
            price,
            reading.station_name.as_deref().unwrap_or("Unknown"),
            reading.address.as_deref().unwrap_or_default(),
            distance
        ));
    }

    lines
}
