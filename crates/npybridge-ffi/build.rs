//! Generates `include/npybridge.h` from the exported items.

use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let config_path = crate_dir.join("cbindgen.toml");

    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config = cbindgen::Config::from_file(&config_path)?;
    let include_dir = crate_dir.join("include");
    std::fs::create_dir_all(&include_dir)?;

    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()?;
    bindings.write_to_file(include_dir.join("npybridge.h"));
    Ok(())
}
