fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure().build_client(false).compile_protos(
        &[
            "proto/tfplugin6.proto",
            "proto/grpc_controller.proto",
            "proto/grpc_health.proto",
        ],
        &["proto"],
    )?;
    Ok(())
}
