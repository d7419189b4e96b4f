use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use scanlink_frame::FrameConfig;
use scanlink_node::{
    CommandDecoder, Decoder, Dispatcher, NullDecoder, Receiver, ReceiverConfig, RecordStore,
    StatusEvent, StatusSink,
};
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{node_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_event, print_record, OutputFormat};

const OUTPUT_POLL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let payload_timeout = parse_duration(&args.payload_timeout)?;
    let decoder: Box<dyn Decoder> = match &args.ocr_command {
        Some(command) => Box::new(
            CommandDecoder::parse(command)
                .map_err(|err| CliError::new(USAGE, format!("--ocr-command: {err}")))?,
        ),
        None => Box::new(NullDecoder),
    };
    let store = match &args.store {
        Some(path) if args.append => RecordStore::open(path),
        Some(path) => RecordStore::create(path),
        None => Ok(RecordStore::in_memory()),
    }
    .map_err(|err| node_error("record store unavailable", err))?;

    let link = args.link.open()?;

    let (events, event_rx): (StatusSink, Option<mpsc::Receiver<StatusEvent>>) = if args.events {
        let (sink, rx) = StatusSink::channel();
        (sink, Some(rx))
    } else {
        (StatusSink::log_only(), None)
    };

    let config = ReceiverConfig {
        frame: FrameConfig {
            payload_timeout,
            ..FrameConfig::default()
        },
        queue_capacity: args.queue_capacity,
    };
    let (receiver, deliveries) = Receiver::with_config(link, events.clone(), config);
    let (record_tx, record_rx) = mpsc::channel();
    let dispatcher = Dispatcher::new(decoder, store, events)
        .spawn(deliveries, Some(record_tx))
        .map_err(|err| CliError::new(INTERNAL, format!("dispatch thread failed: {err}")))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let receive_flag = running.clone();
    let receive_loop = thread::Builder::new()
        .name("scanlink-receive".to_string())
        .spawn(move || receiver.run(&receive_flag))
        .map_err(|err| CliError::new(INTERNAL, format!("receive thread failed: {err}")))?;

    let mut printed = 0usize;
    loop {
        if let Some(rx) = &event_rx {
            for event in rx.try_iter() {
                print_event(&event, format);
            }
        }

        match record_rx.recv_timeout(OUTPUT_POLL) {
            Ok(record) => {
                if args.count.is_some_and(|count| printed >= count) {
                    continue;
                }
                print_record(&record, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    running.store(false, Ordering::SeqCst);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let received = receive_loop
        .join()
        .map_err(|_| CliError::new(INTERNAL, "receive thread panicked"))?;
    let dispatcher = dispatcher
        .join()
        .map_err(|_| CliError::new(INTERNAL, "dispatch thread panicked"))?;

    if let Some(rx) = &event_rx {
        for event in rx.try_iter() {
            print_event(&event, format);
        }
    }

    let stats = received.map_err(|err| node_error("receive failed", err))?;
    let dispatched = dispatcher.stats();
    info!(
        frames = stats.frames,
        timeouts = stats.timeouts,
        dropped = stats.dropped,
        stored = dispatched.stored,
        duplicates = dispatched.duplicates,
        "listen stopped"
    );
    Ok(SUCCESS)
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
