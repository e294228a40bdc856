fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let building_python_module = std::env::var_os("CARGO_FEATURE_PYTHON").is_some();
    let is_macos = std::env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "macos");

    // The `rtfbook` extension module resolves libpython symbols at import time.
    if building_python_module && is_macos {
        for arg in ["-undefined", "dynamic_lookup"] {
            println!("cargo:rustc-cdylib-link-arg={arg}");
        }
    }
}
