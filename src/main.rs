use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{error, info};

use evote_client::api::Client;
use evote_client::auth::OtpFlow;
use evote_client::model::otp::Tick;
use evote_client::model::{AdminStats, ElectionSpec, Id, VoterStats};
use evote_client::session::{Role, Session};
use evote_client::voting::{VoteFlow, VoteStage};
use evote_client::{Config, Error};

#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for the election backend")]
struct Args {
    /// Base URL of the backend API.
    #[arg(
        long,
        env = "EVOTE_API_URL",
        default_value = "http://localhost:5000/api"
    )]
    api_url: String,

    /// Where to persist the signed-in session.
    #[arg(long, env = "EVOTE_SESSION_FILE", default_value = ".evote-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Sign in with email and password, then verify the emailed code.
    Login { email: String },
    /// Create an account and verify the emailed code.
    Register { name: String, email: String },
    /// List all elections with their current status.
    Elections,
    /// Vote in an election.
    Vote { election_id: String },
    /// Show results, either for one election or for all completed ones.
    Results { election_id: Option<String> },
    /// Show your voting history.
    History,
    /// Show the voter dashboard counters.
    Dashboard,
    /// Create an election from a JSON spec file (admin).
    Create { spec: PathBuf },
    /// Delete an election (admin).
    Delete {
        election_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Show who is currently signed in.
    Whoami,
    /// Sign out and forget the saved session.
    Logout,
}

fn main() {
    // Logging config is optional for a client; fall back to silence.
    let _ = log4rs::init_file("log4rs.yaml", Default::default());
    info!("Initialised logging");

    let args = Args::parse();
    let config = Config::new(args.api_url, args.session_file);

    if let Err(err) = run(&config, args.cmd) {
        error!("{err}");
        eprintln!("error: {err:#}");
        std::process::exit(1)
    }
}

fn run(config: &Config, cmd: Cmd) -> anyhow::Result<()> {
    match cmd {
        Cmd::Login { email } => login(config, &email),
        Cmd::Register { name, email } => register(config, &name, &email),
        Cmd::Elections => list_elections(config),
        Cmd::Vote { election_id } => vote(config, &Id::from(election_id)),
        Cmd::Results { election_id } => results(config, election_id.map(Id::from)),
        Cmd::History => history(config),
        Cmd::Dashboard => dashboard(config),
        Cmd::Create { spec } => create(config, &spec),
        Cmd::Delete { election_id, yes } => delete(config, &Id::from(election_id), yes),
        Cmd::Whoami => whoami(config),
        Cmd::Logout => logout(config),
    }
}

/// An anonymous connection.
fn client(config: &Config) -> Client {
    Client::new(config.api_url())
}

/// A connection carrying the saved session's token.
fn signed_in(config: &Config) -> anyhow::Result<(Client, Session)> {
    let session = Session::load(config.session_file())?
        .ok_or_else(|| anyhow!("not signed in, run `evote login` first"))?;
    let mut api = client(config);
    api.authenticate(session.token.clone());
    Ok((api, session))
}

fn login(config: &Config, email: &str) -> anyhow::Result<()> {
    let api = client(config);
    let password = prompt("password: ")?;
    let mut flow = OtpFlow::begin(&api, email, &password)?;
    println!("A verification code was sent to {}.", flow.email());

    let session = verify_loop(&api, &mut flow)?;
    session.save(config.session_file())?;
    println!(
        "Signed in as {} ({}).",
        session.user.email,
        session.user.role
    );
    match session.role() {
        Role::Admin => println!("Admin commands available: create, delete."),
        Role::Voter => println!("Run `evote dashboard` to get started."),
    }
    Ok(())
}

/// Prompt for codes until one verifies, the window expires, or the user
/// gives up. Typing `resend` requests a fresh code.
fn verify_loop(api: &Client, flow: &mut OtpFlow) -> anyhow::Result<Session> {
    let mut last_seen = Instant::now();
    loop {
        let entered = prompt(&format!(
            "code ({} left, or 'resend'): ",
            flow.countdown()
        ))?;

        // Sync the countdown with the time spent waiting at the prompt.
        let waited = last_seen.elapsed().as_secs();
        last_seen = Instant::now();
        if flow.advance(waited) == Tick::Expired {
            bail!("the code has expired, run `evote login` again");
        }

        if entered.eq_ignore_ascii_case("resend") {
            flow.resend(api)?;
            println!("A new code was sent to {}.", flow.email());
            continue;
        }
        match flow.verify(api, &entered) {
            Ok(session) => return Ok(session),
            Err(err @ Error::Validation(_)) | Err(err @ Error::Api { .. }) => {
                println!("{err}");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn register(config: &Config, name: &str, email: &str) -> anyhow::Result<()> {
    let api = client(config);
    let password = prompt("password: ")?;
    let confirm = prompt("confirm password: ")?;
    if password != confirm {
        bail!("passwords do not match");
    }
    let mut flow = OtpFlow::begin_registration(&api, name, email, &password)?;
    println!("Account created. A verification code was sent to {}.", flow.email());

    let session = verify_loop(&api, &mut flow)?;
    session.save(config.session_file())?;
    println!("Signed in as {}.", session.user.email);
    Ok(())
}

fn list_elections(config: &Config) -> anyhow::Result<()> {
    let api = client(config);
    let now = Utc::now();
    let elections = api.elections()?;
    if elections.is_empty() {
        println!("No elections.");
        return Ok(());
    }
    for election in &elections {
        println!(
            "{}  [{}]  {}  ({} candidates)",
            election.id,
            election.status_at(now),
            election.title,
            election.candidates.len()
        );
    }
    Ok(())
}

fn vote(config: &Config, election_id: &Id) -> anyhow::Result<()> {
    let (api, _session) = signed_in(config)?;
    let elections = api.elections()?;
    let election = elections
        .iter()
        .find(|election| &election.id == election_id)
        .ok_or_else(|| anyhow!("no election {election_id}"))?;

    let mut flow = VoteFlow::new(&api, election);
    if flow.open(Utc::now())? == &VoteStage::AlreadyVoted {
        println!("You have already voted in this election.");
        return Ok(());
    }

    println!("{}: {}", election.title, election.description);
    for (index, candidate) in election.candidates.iter().enumerate() {
        println!("  {}. {} ({})", index + 1, candidate.name, candidate.party);
    }
    let choice = prompt("candidate number: ")?;
    let index: usize = choice
        .trim()
        .parse()
        .with_context(|| format!("'{choice}' is not a number"))?;
    let candidate = election
        .candidates
        .get(index.checked_sub(1).unwrap_or(usize::MAX))
        .ok_or_else(|| anyhow!("no candidate numbered {index}"))?;

    flow.select(candidate.id.clone())?;
    flow.submit()?;
    println!("Vote cast for {}.", candidate.name);
    Ok(())
}

fn results(config: &Config, election_id: Option<Id>) -> anyhow::Result<()> {
    let api = client(config);
    let now = Utc::now();
    let elections = api.elections()?;
    let selected: Vec<_> = match &election_id {
        Some(id) => {
            let election = elections
                .iter()
                .find(|election| &election.id == id)
                .ok_or_else(|| anyhow!("no election {id}"))?;
            vec![election]
        }
        // Default view: everything whose window has passed or that an
        // admin has switched off.
        None => elections
            .iter()
            .filter(|election| election.is_completed_at(now))
            .collect(),
    };
    if selected.is_empty() {
        println!("No completed elections.");
        return Ok(());
    }

    for election in selected {
        let results = api.results(&election.id)?;
        println!("{} ({} votes)", election.title, results.total_votes);
        match results.tally() {
            None => println!("  no candidates"),
            Some(tally) => {
                if results.is_zero_turnout() {
                    println!("  no votes were cast");
                }
                for candidate in &tally.ranking {
                    let marker = if candidate.id == tally.winner.id && !results.is_zero_turnout() {
                        " *"
                    } else {
                        ""
                    };
                    println!(
                        "  {:>5} votes  {:>5.1}%  {} ({}){}",
                        candidate.votes, candidate.percentage, candidate.name, candidate.party, marker
                    );
                }
            }
        }
    }
    Ok(())
}

fn history(config: &Config) -> anyhow::Result<()> {
    let (api, _session) = signed_in(config)?;
    let elections = api.elections()?;
    let records = api.vote_history()?;
    if records.is_empty() {
        println!("No votes cast yet.");
        return Ok(());
    }
    for record in &records {
        let election = elections
            .iter()
            .find(|election| election.id == record.election_id);
        let title = election.map_or("(deleted election)", |e| e.title.as_str());
        let candidate = election
            .and_then(|e| e.candidate(&record.candidate_id))
            .map_or("(unknown candidate)", |c| c.name.as_str());
        match record.created_at {
            Some(at) => println!("{}  {title}: {candidate}", at.format("%Y-%m-%d %H:%M")),
            None => println!("{title}: {candidate}"),
        }
    }
    Ok(())
}

fn dashboard(config: &Config) -> anyhow::Result<()> {
    let (api, session) = signed_in(config)?;
    let elections = api.elections()?;
    println!("Welcome back, {}.", session.user.name);
    match session.role() {
        Role::Admin => {
            let stats = AdminStats::derive(&elections);
            println!("  elections:     {}", stats.total);
            println!("  active:        {}", stats.active);
            println!("  votes cast:    {}", stats.total_votes);
        }
        Role::Voter => {
            let votes_cast = api.vote_history()?.len();
            let stats = VoterStats::derive(&elections, votes_cast, Utc::now());
            println!("  available to vote: {}", stats.available);
            println!("  upcoming:          {}", stats.upcoming);
            println!("  votes cast:        {}", stats.voted);
        }
    }
    Ok(())
}

fn create(config: &Config, spec_path: &std::path::Path) -> anyhow::Result<()> {
    let (api, _session) = signed_in(config)?;
    let json = std::fs::read_to_string(spec_path)
        .with_context(|| format!("failed to read {}", spec_path.display()))?;
    let spec: ElectionSpec = serde_json::from_str(&json)?;
    let election = api.create_election(spec)?;
    println!("Created election {} ({}).", election.id, election.title);
    Ok(())
}

fn delete(config: &Config, election_id: &Id, yes: bool) -> anyhow::Result<()> {
    let (api, _session) = signed_in(config)?;
    if !yes {
        let answer = prompt(&format!("delete election {election_id}? [y/N] "))?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }
    api.delete_election(election_id)?;
    println!("Deleted election {election_id}.");
    Ok(())
}

fn whoami(config: &Config) -> anyhow::Result<()> {
    match Session::load(config.session_file())? {
        Some(session) => println!(
            "{} <{}> ({})",
            session.user.name, session.user.email, session.user.role
        ),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn logout(config: &Config) -> anyhow::Result<()> {
    Session::logout(config.session_file())?;
    println!("Signed out.");
    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
