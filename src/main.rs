use clap::Parser;
use miette::Result;
use pcf::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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
    let global = cli.global;

    pcf::core::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => pcf::cli::commands::init::run(args),
        Commands::Cdf(args) => pcf::cli::commands::cdf::run(args, &global),
        Commands::Rank(args) => pcf::cli::commands::rank::run(args, &global),
        Commands::Forecast(args) => pcf::cli::commands::forecast::run(args, &global),
        Commands::Curve(args) => pcf::cli::commands::curve::run(args, &global),
        Commands::Simulate(args) => pcf::cli::commands::simulate::run(args, &global),
        Commands::Config(cmd) => pcf::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => pcf::cli::commands::completions::run(args),
    }
}
