fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc unless the environment already points at one.
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        // SAFETY: build scripts are single-threaded.
        unsafe { std::env::set_var("PROTOC", protoc) };
    }

    println!("cargo:rerun-if-changed=proto/dpdk.proto");
    tonic_prost_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/dpdk.proto"], &["proto"])?;
    Ok(())
}
