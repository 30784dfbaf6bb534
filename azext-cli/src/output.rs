//! Table rendering for listing commands.

use azext_core::{ExtensionVersionInfo, ReplicationStatusEntry};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

pub fn versions_table(versions: &[ExtensionVersionInfo]) -> Table {
    let mut table = table(vec![
        "Namespace",
        "Type",
        "Version",
        "Replication Completed",
        "Regions",
    ]);
    for v in versions {
        let regions = v.region_list().collect::<Vec<_>>().join(", ");
        table.add_row(vec![
            v.namespace.clone(),
            v.type_name.clone(),
            v.version.clone(),
            v.replication_completed.to_string(),
            if regions.is_empty() {
                "-".to_string()
            } else {
                regions
            },
        ]);
    }
    table
}

pub fn replication_table(statuses: &[ReplicationStatusEntry]) -> Table {
    let mut table = table(vec!["Location", "Status"]);
    for s in statuses {
        table.add_row(vec![s.location.as_str(), s.status.as_str()]);
    }
    table
}
