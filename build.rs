fn main() -> Result<(), Box<dyn std::error::Error>> {
    // use vendored protoc so PATH/PROTOC isn't needed
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("vendored protoc not found");
    std::env::set_var("PROTOC", &protoc);

    // trigger rebuild if "proto" folder change
    println!("cargo:rerun-if-changed=proto");

    // the server side is only used by the fake service of integration tests
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["proto/demo.proto"], &["proto"])?;
    Ok(())
}
