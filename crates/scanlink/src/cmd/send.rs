use std::path::Path;

use scanlink_node::{DirectoryImaging, FileCapture, LogIndicator, Outcome, Sender};

use crate::cmd::SendArgs;
use crate::exit::{node_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_outcome, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let link = args.link.open()?;

    let dir = args.file.parent().unwrap_or_else(|| Path::new("."));
    let sender = Sender::new(link, DirectoryImaging::new(dir), LogIndicator);
    let capture = FileCapture {
        path: args.file.clone(),
        code: Some(args.identifier.clone()),
    };

    let outcome = sender
        .offer(&capture)
        .map_err(|err| node_error("send failed", err))?;
    print_outcome(&outcome, format);

    match outcome {
        Outcome::RejectedLength { code } => Err(CliError::new(
            DATA_INVALID,
            format!("identifier {code:?} is not 13 bytes, nothing sent"),
        )),
        _ => Ok(SUCCESS),
    }
}
