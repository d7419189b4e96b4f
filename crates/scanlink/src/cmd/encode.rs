use std::fs;

use bytes::BytesMut;
use scanlink_frame::{encode_frame, FrameConfig, FrameError, Identifier};
use serde::Serialize;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    kind: &'static str,
    path: String,
    identifier: &'a str,
    payload_size: usize,
    frame_size: usize,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let identifier =
        Identifier::parse(&args.identifier).map_err(|err| frame_error("encode failed", err))?;
    let payload = fs::read(&args.file).map_err(|err| {
        io_error(&format!("failed reading {}", args.file.display()), err)
    })?;

    let max = FrameConfig::default().max_payload_size;
    if payload.len() > max {
        return Err(frame_error(
            "encode failed",
            FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            },
        ));
    }

    let mut frame = BytesMut::new();
    encode_frame(&payload, &identifier, &mut frame)
        .map_err(|err| frame_error("encode failed", err))?;

    let Some(out) = &args.out else {
        print_raw(&frame);
        return Ok(SUCCESS);
    };

    fs::write(out, &frame)
        .map_err(|err| io_error(&format!("failed writing {}", out.display()), err))?;

    let summary = EncodeOutput {
        kind: "frame",
        path: out.display().to_string(),
        identifier: &args.identifier,
        payload_size: payload.len(),
        frame_size: frame.len(),
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "wrote {} bytes ({} payload + framing) to {}",
            summary.frame_size, summary.payload_size, summary.path
        ),
    }
    Ok(SUCCESS)
}
