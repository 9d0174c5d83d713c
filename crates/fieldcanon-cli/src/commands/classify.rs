//! Classify command implementation.

use fieldcanon::{
    is_core_partition_mapper_import_path, is_core_timetable_import_path, ImportPath,
};
use serde_json::json;

fn classify(path: &str) -> &'static str {
    if is_core_timetable_import_path(path) {
        "core-timetable"
    } else if is_core_partition_mapper_import_path(path) {
        "core-partition-mapper"
    } else {
        "plugin"
    }
}

pub fn run(import_path: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = ImportPath::parse(import_path).map_err(|e| format!("Invalid import path: {}", e))?;
    let kind = classify(path.as_ref());

    if json_output {
        println!("{}", json!({ "import_path": path, "kind": kind }));
    } else {
        println!("{}\t{}", path, kind);
    }
    Ok(())
}
