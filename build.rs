// build.rs: expose the compile-time target triple as a rustc env var.
//
// Cargo hands build scripts the canonical target triple in `TARGET`
// (e.g. "x86_64-pc-windows-msvc", "aarch64-apple-darwin"). Re-exporting it
// lets `platform::Platform::current()` pick the artifact layout for the host
// the binary was built for.

fn main() {
    let target = std::env::var("TARGET")
        .expect("TARGET env var not set by Cargo. This should never happen in a normal build.");

    println!("cargo:rustc-env=TARGET={target}");
}
