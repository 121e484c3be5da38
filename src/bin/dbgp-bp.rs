use clap::{Parser, Subcommand};
use dbgp::{
    BreakpointStore, SledStore,
    command::{Breakpoint, HitCondition, State, Target},
};

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Break at a line (1-based).
    Add {
        file: String,
        line: u32,
        /// Only break when this expression is true.
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        disabled: bool,
        /// Remove after the first hit.
        #[arg(long)]
        temporary: bool,
        /// Break once the hit count reaches this value.
        #[arg(long)]
        hits: Option<u32>,
    },
    /// Break when a function is called.
    Call { function: String },
    /// Break when a function returns.
    Return { function: String },
    /// Break when an exception is raised.
    Exception { exception: String },
    /// Break when an expression changes.
    Watch { expression: String },
    List,
    #[command(name = "rm")]
    Remove { key: String },
}

fn main() -> dbgp::Result<()> {
    let cli = Cli::parse();
    let store = SledStore::open("./")?;
    let breakpoint = match cli.command {
        Commands::Add {
            file,
            line,
            condition,
            disabled,
            temporary,
            hits,
        } => {
            let Some(line) = line.checked_sub(1) else {
                eprintln!("Lines start at 1");
                std::process::exit(1);
            };
            let target = match condition {
                Some(expression) => Target::Conditional {
                    file,
                    line,
                    expression,
                },
                None => Target::Line { file, line },
            };
            let mut breakpoint = Breakpoint::new(target);
            if disabled {
                breakpoint.state = State::Disabled;
            }
            breakpoint.temporary = temporary;
            breakpoint.hit = hits.map(|n| (n, HitCondition::AtLeast));
            breakpoint
        }
        Commands::Call { function } => Breakpoint::new(Target::Call { function }),
        Commands::Return { function } => Breakpoint::new(Target::Return { function }),
        Commands::Exception { exception } => Breakpoint::new(Target::Exception { exception }),
        Commands::Watch { expression } => Breakpoint::new(Target::Watch { expression }),
        Commands::List => {
            for (key, breakpoint) in store.list()? {
                let flags = match (breakpoint.state, breakpoint.temporary) {
                    (State::Disabled, _) => " (disabled)",
                    (State::Enabled, true) => " (temporary)",
                    (State::Enabled, false) => "",
                };
                println!("{key}{flags}");
            }
            return Ok(());
        }
        Commands::Remove { key } => {
            let result = store.remove(&key);
            if result.is_err() {
                println!("Breakpoint not found");
            }
            return result;
        }
    };
    let key = breakpoint.default_key();
    store.set(key.clone(), breakpoint)?;
    println!("{key}");
    Ok(())
}
