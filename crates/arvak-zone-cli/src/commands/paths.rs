//! Paths command implementation.

use anyhow::Result;
use console::style;

use arvak_zone::ZoneId;

use super::common::load_device;

/// Execute the paths command.
pub fn execute(device: &str) -> Result<()> {
    let topology = load_device(device)?.topology;
    let ids: Vec<ZoneId> = topology.zones().map(|z| z.id).collect();

    println!(
        "{} {} zones, {} edges, device limit {} qubits",
        style("→").cyan().bold(),
        style(topology.zone_count()).cyan(),
        style(topology.edges().len()).cyan(),
        style(topology.max_qubits()).yellow()
    );

    println!("\nZones:");
    for zone in topology.zones() {
        let neighbors: Vec<String> = topology
            .neighbors(zone.id)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "  {:>4}  occupancy {}..={}  neighbors: {}",
            style(zone.id).cyan(),
            zone.min_occupancy,
            zone.max_occupancy,
            neighbors.join(", ")
        );
    }

    println!("\nShortest paths:");
    for &from in &ids {
        for &to in &ids {
            if from >= to {
                continue;
            }
            let Some(path) = topology.shortest_path(from, to) else {
                continue;
            };
            let hops: Vec<String> = path.iter().map(ToString::to_string).collect();
            println!(
                "  {from} -> {to}  [{}]  {}",
                style(path.len() - 1).yellow(),
                hops.join(" - ")
            );
        }
    }

    Ok(())
}
