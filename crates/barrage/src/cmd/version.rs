use barrage_frame::{CLIENT_MESSAGE_TYPE, DEFAULT_MAX_BODY, SERVER_MESSAGE_TYPE};
use barrage_room::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_SERVER_ADDR};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("barrage {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: barrage");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("BARRAGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("default_server: {DEFAULT_SERVER_ADDR}");
    println!("default_heartbeat: {DEFAULT_HEARTBEAT_INTERVAL:?}");
    println!("message_types: client={CLIENT_MESSAGE_TYPE} server={SERVER_MESSAGE_TYPE}");
    println!("max_body_bytes: {DEFAULT_MAX_BODY}");

    Ok(SUCCESS)
}
