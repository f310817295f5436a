//! Route command implementation.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use arvak_zone::{
    Operation, QubitId, ResidencyPolicy, RoutedProgram, ZoneId, ZoneRouter, ZoneTopology,
};

use super::common::{load_device, load_operations, resolve_options, write_structured};

/// Zone contents at the end of a chunk.
#[derive(Debug, Serialize)]
struct ZoneReport {
    zone: ZoneId,
    groups: Vec<Vec<QubitId>>,
}

#[derive(Debug, Serialize)]
struct ChunkReport {
    start: usize,
    end: usize,
    zones: Vec<ZoneReport>,
}

/// Machine-readable routing result.
#[derive(Debug, Serialize)]
struct RouteReport<'a> {
    residency: ResidencyPolicy,
    chunks: Vec<ChunkReport>,
    shuttles: usize,
    operations: &'a [Operation],
}

impl<'a> RouteReport<'a> {
    fn new(topology: &ZoneTopology, residency: ResidencyPolicy, routed: &'a RoutedProgram) -> Self {
        let chunks = routed
            .chunks
            .iter()
            .map(|chunk| ChunkReport {
                start: chunk.range.start,
                end: chunk.range.end,
                zones: topology
                    .zones()
                    .map(|zone| ZoneReport {
                        zone: zone.id,
                        groups: chunk
                            .partition
                            .zone_groups(zone.id)
                            .map(|g| g.iter().copied().collect())
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            residency,
            chunks,
            shuttles: routed.shuttle_count(),
            operations: &routed.operations,
        }
    }
}

/// Execute the route command.
pub fn execute(
    device: &str,
    ops: &str,
    output: Option<&str>,
    format: &str,
    residency: Option<ResidencyPolicy>,
) -> Result<()> {
    let device_info = load_device(device)?;
    let operations = load_operations(ops)?;
    let options = resolve_options(device_info.router, residency);
    let topology = &device_info.topology;

    let routed = ZoneRouter::new(topology)
        .with_options(options)
        .route(&operations)
        .with_context(|| format!("Failed to route {ops}"))?;

    match format {
        "json" => {
            let report = RouteReport::new(topology, options.residency, &routed);
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to encode routing report")?;
            println!("{json}");
        }
        "table" => print_table(topology, &operations, &routed, options.residency),
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }

    if let Some(path) = output {
        write_structured(&routed.operations, path)?;
        if format == "table" {
            println!("  Output: {}", style(path).green());
        }
    }

    Ok(())
}

fn print_table(
    topology: &ZoneTopology,
    operations: &[Operation],
    routed: &RoutedProgram,
    residency: ResidencyPolicy,
) {
    println!(
        "{} Routed {} operations over {} zones ({} residency)",
        style("✓").green().bold(),
        style(operations.len()).cyan(),
        style(topology.zone_count()).cyan(),
        residency
    );
    println!(
        "  Chunks: {}, shuttles inserted: {}",
        style(routed.chunks.len()).yellow(),
        style(routed.shuttle_count()).yellow()
    );

    for (index, chunk) in routed.chunks.iter().enumerate() {
        println!(
            "\n  Chunk {} (ops {}..{})",
            style(index).bold(),
            chunk.range.start,
            chunk.range.end
        );
        for zone in topology.zones() {
            let groups: Vec<String> = chunk
                .partition
                .zone_groups(zone.id)
                .map(|g| {
                    let members: Vec<String> = g.iter().map(ToString::to_string).collect();
                    format!("{{{}}}", members.join(", "))
                })
                .collect();
            let occupancy = chunk.partition.occupancy(zone.id).unwrap_or(0);
            println!(
                "    {:>4} [{}/{}] {}",
                style(zone.id).cyan(),
                occupancy,
                zone.max_occupancy,
                groups.join(" ")
            );
        }
    }

    println!("\n  Program:");
    for (index, operation) in routed.operations.iter().enumerate() {
        if operation.is_shuttle() {
            println!("  {index:>5}  {}", style(operation).yellow());
        } else {
            println!("  {index:>5}  {operation}");
        }
    }
}
