use timecard::cli::run;
use timecard::error::LedgerError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        // Broken documents and I/O failures are internal, everything else is the user's
        let internal = e
            .chain()
            .any(|cause| cause.downcast_ref::<LedgerError>().map_or(false, LedgerError::is_internal));
        if internal {
            eprintln!("Internal error: {}", e);
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
