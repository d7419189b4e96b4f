use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("scanlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: scanlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SCANLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("identifier_len: {}", scanlink_frame::IDENTIFIER_LEN);
    println!("max_payload: {}", scanlink_frame::DEFAULT_MAX_PAYLOAD);
    println!("features: node={}, cli=true", cfg!(feature = "node"));

    Ok(SUCCESS)
}
