use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "songbridge", version, about = "Asynchronous song-generation proxy")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind address; overrides `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port; overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Artifact directory; overrides `storage.dir`.
    #[arg(long)]
    pub output_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default when no subcommand is given).
    Serve(ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_parse() {
        let args = Args::parse_from(["songbridge", "serve", "--host", "0.0.0.0", "--port", "9090"]);
        let Some(Commands::Serve(serve)) = args.command else {
            panic!("expected serve command");
        };
        assert_eq!(serve.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(serve.port, Some(9090));
        assert!(serve.output_dir.is_none());
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let args = Args::parse_from(["songbridge"]);
        assert!(args.command.is_none());
    }
}
