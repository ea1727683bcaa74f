//! Build script for ecstripe
//!
//! Links Intel ISA-L when the `isal` feature is enabled. Without it the
//! crate uses the portable GF(2^8) coder and needs no native libraries.
//!
//! # Prerequisites
//!
//! ```bash
//! # Ubuntu/Debian:
//! sudo apt-get install libisal-dev
//!
//! # Fedora/RHEL:
//! sudo dnf install isa-l-devel
//! ```
//!
//! # Environment Variables
//!
//! - `ISAL_DIR` - Path to ISA-L installation (default: /usr/local)

use std::env;
use std::path::PathBuf;

fn main() {
    if env::var_os("CARGO_FEATURE_ISAL").is_none() {
        return;
    }

    println!("cargo:rerun-if-env-changed=ISAL_DIR");

    #[cfg(feature = "pkg-config")]
    if find_with_pkg_config() {
        println!("cargo:rustc-link-lib=isal");
        return;
    }

    let isal_dir = env::var("ISAL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/usr/local"));

    for lib_dir in [isal_dir.join("lib"), isal_dir.join("lib64")] {
        if lib_dir.exists() {
            println!("cargo:rustc-link-search=native={}", lib_dir.display());
        }
    }

    // Standard system paths
    println!("cargo:rustc-link-search=native=/usr/lib");
    println!("cargo:rustc-link-search=native=/usr/lib64");
    println!("cargo:rustc-link-search=native=/usr/local/lib");
    println!("cargo:rustc-link-search=native=/usr/local/lib64");

    // Provides gf_gen_cauchy1_matrix, ec_init_tables, ec_encode_data
    println!("cargo:rustc-link-lib=isal");

    println!("cargo:warning=ISAL_DIR: {}", isal_dir.display());
}

/// Use pkg-config to locate ISA-L.
///
/// Enable with: cargo build --features "isal,pkg-config"
#[cfg(feature = "pkg-config")]
fn find_with_pkg_config() -> bool {
    match pkg_config::Config::new()
        .atleast_version("2.0")
        .cargo_metadata(false)
        .probe("libisal")
    {
        Ok(lib) => {
            for path in lib.link_paths {
                println!("cargo:rustc-link-search=native={}", path.display());
            }
            true
        }
        Err(_) => false,
    }
}
