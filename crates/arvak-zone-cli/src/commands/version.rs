//! Version command implementation.

use console::style;

use arvak_zone::{ResidencyPolicy, RouterOptions};

/// Environment variable read by `route --residency`.
const RESIDENCY_ENV: &str = "ARVAK_ZONE_RESIDENCY";

/// Device and operation file formats, by extension.
const FORMATS: [(&str, &str); 3] = [
    ("yaml, yml", "YAML"),
    ("json", "JSON"),
    ("other", "YAML parser, which also reads JSON"),
];

/// One line per residency policy, the default one marked.
fn residency_lines(default: ResidencyPolicy) -> Vec<String> {
    [ResidencyPolicy::Adjacent, ResidencyPolicy::Persistent]
        .into_iter()
        .map(|policy| {
            let marker = if policy == default { " (default)" } else { "" };
            format!("{policy}{marker}")
        })
        .collect()
}

/// Execute the version command.
pub fn execute() {
    println!(
        "{} {}",
        style("arvak-zone").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).yellow()
    );

    println!("\nResidency policies:");
    for line in residency_lines(RouterOptions::default().residency) {
        println!("  {line}");
    }
    println!("  override: --residency or {}", style(RESIDENCY_ENV).dim());

    println!("\nInput formats:");
    for (extension, format) in FORMATS {
        println!("  {extension:<10} {format}");
    }
}
