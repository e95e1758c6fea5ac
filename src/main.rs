use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use visit_report::{
    DirectorySink, EmailDraft, Error, Manifest, ReportConfig, ReportSink, compose_report,
};

#[derive(Parser, Debug)]
#[command(
    name = "visit-report",
    version,
    about = "Compose a building visit report PDF from a JSON manifest"
)]
struct Cli {
    /// Visit manifest (JSON). Image paths are relative to its directory.
    manifest: PathBuf,
    /// Directory the PDF is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// Organization mark printed in the page header
    #[arg(long)]
    organization: Option<String>,
    /// Role line printed under the author's name on the signature page
    #[arg(long)]
    author_role: Option<String>,
    /// Print the accompanying email subject and body
    #[arg(long)]
    print_email: bool,
}

fn run(cli: &Cli) -> Result<PathBuf, Error> {
    let manifest = Manifest::load(&cli.manifest)?;
    let base = cli.manifest.parent().unwrap_or(Path::new("."));
    let input = manifest.into_input(base)?;

    let mut config = ReportConfig::default();
    if let Some(org) = &cli.organization {
        config.branding.organization = org.clone();
    }
    if let Some(role) = &cli.author_role {
        config.branding.author_role = role.clone();
    }

    let report = compose_report(&input, &config)?;
    let draft = EmailDraft::for_report(&input.visit, &report);
    let mut sink = DirectorySink::new(&cli.output);
    sink.deliver(&report, &draft)?;

    if cli.print_email {
        println!("Subject: {}", draft.subject);
        println!("Attachment: {}", draft.attachment_name);
        println!();
        print!("{}", draft.body);
    }

    Ok(cli.output.join(report.file_name()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(path) => {
            println!("Report written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
