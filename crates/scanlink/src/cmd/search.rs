use scanlink_node::RecordStore;

use crate::cmd::SearchArgs;
use crate::exit::{node_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_records, OutputFormat};

pub fn run(args: SearchArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.store.is_file() {
        return Err(CliError::new(
            FAILURE,
            format!("record store not found: {}", args.store.display()),
        ));
    }
    let store = RecordStore::open(&args.store).map_err(|err| node_error("open failed", err))?;
    let matches = store.search(&args.query);
    print_records(&matches, format);
    Ok(SUCCESS)
}
