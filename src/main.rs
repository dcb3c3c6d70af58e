use std::time::Duration;

fn main() {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(arena_client::run_with_config());
    // The stdin reader sits on a blocking thread that may never return.
    runtime.shutdown_timeout(Duration::from_millis(200));
}
