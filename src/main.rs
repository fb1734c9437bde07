use clap::Parser;
use clinic::cli::commands::{completions, entity, init};
use clinic::cli::{Cli, Commands, GlobalOpts};
use clinic::core::Config;
use clinic::entities::{Doctor, Drug, MedicalRecord, Patient, PrescriptionHeader, QtyUnit};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let mut global = cli.global;
    global.config = Config::load();
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => init::run(args, &global),
        Commands::Patient(cmd) => entity::run::<Patient>(cmd, &global),
        Commands::Doctor(cmd) => entity::run::<Doctor>(cmd, &global),
        Commands::Unit(cmd) => entity::run::<QtyUnit>(cmd, &global),
        Commands::Drug(cmd) => entity::run::<Drug>(cmd, &global),
        Commands::Prescription(cmd) => entity::run::<PrescriptionHeader>(cmd, &global),
        Commands::Record(cmd) => entity::run::<MedicalRecord>(cmd, &global),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Log to stderr. `--verbose` wins, then `CLINIC_LOG`/config `log`, then warnings only.
fn init_logging(global: &GlobalOpts) {
    let directive = if global.verbose {
        "clinic=debug".to_string()
    } else {
        global.config.log.clone().unwrap_or_else(|| "warn".to_string())
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
