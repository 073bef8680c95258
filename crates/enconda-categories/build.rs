//! Build script for enconda-categories.
//!
//! Generates Rust code from categories.json at compile time.
//!
//! Generated constants:
//! - `CATEGORIES_DATA`: All category (id, name, description) tuples
//! - `CATALOG_VERSION`: The `version` field of categories.json

use std::env;
use std::fs;
use std::path::Path;

/// Maximum allowed file size for categories.json (1 MB)
const MAX_CATALOG_FILE_SIZE: u64 = 1024 * 1024;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let catalog_path = Path::new(&manifest_dir).join("categories.json");

    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let file_size = fs::metadata(&catalog_path)
        .unwrap_or_else(|e| panic!("Failed to get metadata for {}: {}", catalog_path.display(), e))
        .len();
    if file_size > MAX_CATALOG_FILE_SIZE {
        panic!(
            "categories.json at {} is too large ({} bytes, max {} bytes)",
            catalog_path.display(),
            file_size,
            MAX_CATALOG_FILE_SIZE
        );
    }

    let catalog_json = fs::read_to_string(&catalog_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read categories.json at {}: {}",
            catalog_path.display(),
            e
        )
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_json).unwrap_or_else(|e| {
        panic!(
            "Failed to parse categories.json at {}: {}",
            catalog_path.display(),
            e
        )
    });

    let categories = catalog["categories"]
        .as_array()
        .expect("categories.json must have a 'categories' array");
    let version = catalog["version"].as_str().unwrap_or("0.0.0");

    let escape_str = |s: &str| {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    };

    // Category codes look like E1, E8, E12
    let is_valid_id = |id: &str| -> bool {
        id.len() >= 2
            && id.len() <= 8
            && id.starts_with('E')
            && id[1..].chars().all(|c| c.is_ascii_digit())
    };

    let is_valid_text = |text: &str, max: usize| -> bool {
        !text.is_empty() && text.len() <= max && !text.chars().any(|c| c.is_control())
    };

    let mut seen = std::collections::BTreeSet::new();
    let mut generated_code = String::new();
    generated_code.push_str("// Auto-generated from categories.json by build.rs\n");
    generated_code.push_str("// Do not edit manually!\n\n");
    generated_code.push_str("/// Category data as (id, name, description) tuples.\n");
    generated_code.push_str("pub const CATEGORIES_DATA: &[(&str, &str, &str)] = &[\n");

    for (idx, category) in categories.iter().enumerate() {
        let id = category["id"]
            .as_str()
            .unwrap_or_else(|| panic!("categories[{}] must have string 'id' field", idx));
        let name = category["name"]
            .as_str()
            .unwrap_or_else(|| panic!("categories[{}] must have string 'name' field", idx));
        let description = category["description"].as_str().unwrap_or_else(|| {
            panic!("categories[{}] must have string 'description' field", idx)
        });

        if !is_valid_id(id) {
            panic!(
                "categories[{}] has invalid id '{}': expected 'E' followed by digits",
                idx, id
            );
        }
        if !seen.insert(id.to_string()) {
            panic!("categories[{}] duplicates id '{}'", idx, id);
        }
        if !is_valid_text(name, 200) {
            panic!("categories[{}] '{}' has invalid name", idx, id);
        }
        if !is_valid_text(description, 1000) {
            panic!("categories[{}] '{}' has invalid description", idx, id);
        }

        generated_code.push_str(&format!(
            "    (\"{}\", \"{}\", \"{}\"),\n",
            escape_str(id),
            escape_str(name),
            escape_str(description)
        ));
    }

    generated_code.push_str("];\n\n");
    generated_code.push_str("/// Version of the category catalog.\n");
    generated_code.push_str(&format!(
        "pub const CATALOG_VERSION: &str = \"{}\";\n",
        escape_str(version)
    ));

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("categories_data.rs");
    fs::write(&dest_path, generated_code).expect("Failed to write generated categories");
}
