use std::env;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(prim_backend, values(\"hip\", \"cuda\"))");
    println!("cargo:rerun-if-env-changed=HIP_PLATFORM");

    let hip = env::var_os("CARGO_FEATURE_HIP").is_some();
    let cuda = env::var_os("CARGO_FEATURE_CUDA").is_some();

    let backend = match (hip, cuda) {
        (true, false) => "hip",
        (false, true) => "cuda",
        (true, true) => detect_platform(),
        // The crate refuses to compile without a back-end.
        (false, false) => return,
    };

    println!("cargo:rustc-cfg=prim_backend=\"{backend}\"");
}

fn detect_platform() -> &'static str {
    match env::var("HIP_PLATFORM").as_deref() {
        Ok("amd") => "hip",
        Ok("nvidia") => "cuda",
        _ => match env::var("CARGO_CFG_TARGET_ARCH").as_deref() {
            Ok("nvptx64") => "cuda",
            _ => "hip",
        },
    }
}
