use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scanlink_node::{DirectoryImaging, LogIndicator, Outcome, Sender, SenderConfig};
use tracing::{info, warn};

use crate::cmd::{parse_duration, WatchArgs};
use crate::exit::{node_error, CliResult, SUCCESS};
use crate::output::{print_outcome, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let imaging = DirectoryImaging::new(&args.dir);
    // Surface an unreadable directory before touching the port.
    imaging
        .scan()
        .map_err(|err| node_error("watch failed", err))?;

    let link = args.link.open()?;
    let config = SenderConfig {
        dedup_capacity: args.dedup_capacity,
        ..SenderConfig::default()
    };
    let sender = Sender::with_config(link, imaging, LogIndicator, config);

    let running = Arc::new(AtomicBool::new(true));
    if !args.once {
        crate::cmd::listen::install_ctrlc_handler(running.clone())?;
    }

    info!(dir = %args.dir.display(), port = %args.link.port, "watching for captures");
    let mut offered: HashSet<PathBuf> = HashSet::new();

    while running.load(Ordering::SeqCst) {
        let captures = sender
            .imaging()
            .scan()
            .map_err(|err| node_error("watch failed", err))?;

        for capture in captures {
            if offered.contains(&capture.path) {
                continue;
            }
            match sender.offer(&capture) {
                Ok(outcome) => {
                    if !matches!(outcome, Outcome::NoTrigger) {
                        print_outcome(&outcome, format);
                    }
                    offered.insert(capture.path);
                }
                // The file may still be being written; retry on the next scan.
                Err(scanlink_node::NodeError::Imaging(reason)) => {
                    warn!(path = %capture.path.display(), %reason, "capture not readable yet");
                }
                Err(err) => return Err(node_error("send failed", err)),
            }
        }

        if args.once {
            break;
        }
        std::thread::sleep(interval);
    }

    info!(sent = sender.sent_count(), "watch stopped");
    Ok(SUCCESS)
}
