use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let output_file = PathBuf::from(&crate_dir)
        .join("../../WrfDiagFFI.h")
        .display()
        .to_string();

    // Enum variants are emitted as `WrfDiagErrorCode_Ok`, `WrfDiagAxis_Z`, ...
    let mut config = cbindgen::Config::default();
    config.enumeration.prefix_with_name = true;
    // Axis numbers are passed as u8, so the enum is not reachable from a signature
    config.export.include.push("WrfDiagAxis".to_string());

    // Generate C bindings using cbindgen
    cbindgen::Builder::new()
        .with_config(config)
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("WRF_DIAG_FFI_H")
        .with_documentation(true)
        .with_pragma_once(false)
        .generate()
        .expect("Unable to generate C bindings")
        .write_to_file(output_file);

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/operators.rs");
    println!("cargo:rerun-if-changed=src/error.rs");
    println!("cargo:rerun-if-changed=src/grid.rs");
}
