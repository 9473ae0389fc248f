//! `llmbench devices`: report what this host can benchmark.

use anyhow::Result;
use console::style;
use llmbench_device_probe::DeviceProbe;

use crate::output::OutputFormat;

pub fn execute(format: OutputFormat) -> Result<()> {
    let snapshot = DeviceProbe::detect();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => {
            for line in render(&snapshot) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Text lines for a detection snapshot.
pub fn render(snapshot: &DeviceProbe) -> Vec<String> {
    let mut lines = vec![
        style("Devices").bold().to_string(),
        format!("  CPU cores: {}  SIMD: {}", snapshot.cpu.core_count, snapshot.cpu.simd_level),
    ];
    for entry in &snapshot.kinds {
        let status = match (entry.compiled, entry.runtime) {
            (_, true) => style("available").green(),
            (true, false) => style("compiled, no device found").yellow(),
            (false, false) => style("not compiled").dim(),
        };
        lines.push(format!("  {:<6} {}", entry.kind.label(), status));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmbench_common::DeviceKind;

    #[test]
    fn lists_every_kind() {
        let lines = render(&DeviceProbe::detect());
        // header + cpu summary + one line per kind
        assert_eq!(lines.len(), 2 + DeviceKind::ALL.len());
        assert!(lines.iter().any(|l| l.contains("CPU") && l.contains("available")));
    }
}
