//! Line-oriented LabDiag session.
//!
//! Each input line is parsed as one command. Gated commands consult the session's route
//! authorization before doing anything; a denied command prints a notice and shows the
//! redirect view straight away. Command errors are printed as notices and the session
//! carries on. Only failures to read input or write output end it.

use crate::render;
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use labdiag_core::{
    results_to_csv, DiagnosisEngine, KeyValueStore, ReportMeta, Role, Route, SessionError,
    SessionStore, SignupForm, Symptom,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "labdiag")]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Show the welcome view and demo credentials
    Home,
    /// Create an account
    Signup {
        email: String,
        password: String,
        role: Role,
        /// Full name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Phone number (optional)
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign in
    Login { email: String, password: String },
    /// Sign out and discard any unsaved report
    Logout,
    /// Run a diagnosis on the selected symptoms
    Diagnose {
        #[arg(required = true)]
        symptoms: Vec<Symptom>,
        #[arg(long)]
        age: Option<String>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Clear the symptom selection and the current report
    Reset,
    /// Save the current report
    Save,
    /// Print the current report
    Print,
    /// List my saved results
    Results,
    /// List all accounts (admin)
    Accounts,
    /// Show the admin dashboard (admin)
    Admin,
    /// Export all saved results as CSV
    Export {
        /// Write to this file instead of the screen
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete all saved results (admin)
    Clear,
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a, K: KeyValueStore, W: Write> {
    store: &'a mut SessionStore<K>,
    engine: DiagnosisEngine,
    out: W,
}

impl<'a, K: KeyValueStore, W: Write> Shell<'a, K, W> {
    pub fn new(store: &'a mut SessionStore<K>, out: W) -> Self {
        Self {
            store,
            engine: DiagnosisEngine::new(),
            out,
        }
    }

    /// Reads commands until end of input or `quit`.
    pub fn run(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        render::home(&mut self.out)?;
        writeln!(self.out, "Type 'help' for commands.")?;

        for line in input.lines() {
            let line = line.context("failed to read command")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match ShellLine::try_parse_from(line.split_whitespace()) {
                Ok(parsed) => parsed.command,
                Err(e) => {
                    write!(self.out, "{e}")?;
                    continue;
                }
            };

            match self.dispatch(command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => match e.downcast_ref::<SessionError>() {
                    Some(session_err) => self.handle_session_error(session_err)?,
                    None => {
                        tracing::warn!("command failed: {:#}", e);
                        self.notice(&format!("{e:#}"))?;
                    }
                },
            }
        }

        self.out.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        match command {
            ShellCommand::Home => render::home(&mut self.out)?,
            ShellCommand::Signup {
                email,
                password,
                role,
                name,
                phone,
            } => self.signup(email, password, role, name.join(" "), phone)?,
            ShellCommand::Login { email, password } => self.login(&email, &password)?,
            ShellCommand::Logout => {
                self.store.clear_active();
                self.notice("Signed out.")?;
                render::home(&mut self.out)?;
            }
            ShellCommand::Diagnose {
                symptoms,
                age,
                gender,
            } => self.diagnose(symptoms, age, gender)?,
            ShellCommand::Reset => {
                self.store.reset_report();
                self.notice("Selection cleared. No diagnosis yet.")?;
            }
            ShellCommand::Save => self.save()?,
            ShellCommand::Print => self.print()?,
            ShellCommand::Results => {
                self.store.authorize(Route::History)?;
                self.show(Route::History)?;
            }
            ShellCommand::Accounts => {
                self.store.authorize(Route::Admin)?;
                render::accounts_table(&mut self.out, self.store.accounts())?;
            }
            ShellCommand::Admin => {
                self.store.authorize(Route::Admin)?;
                self.show(Route::Admin)?;
            }
            ShellCommand::Export { output } => self.export(output)?,
            ShellCommand::Clear => {
                self.store.authorize(Route::Admin)?;
                self.store.clear_all_results();
                self.notice("Cleared saved results.")?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn signup(
        &mut self,
        email: String,
        password: String,
        role: Role,
        name: String,
        phone: Option<String>,
    ) -> anyhow::Result<()> {
        self.store.register(SignupForm {
            name,
            email,
            password,
            role: Some(role),
            phone,
        })?;
        self.notice("Account created (demo). You can now login.")?;
        self.show(Route::Login)
    }

    fn login(&mut self, email: &str, password: &str) -> anyhow::Result<()> {
        let landing = self.store.sign_in(email, password)?;
        let greeting = format!("Welcome, {}", self.store.display_name());
        self.notice(&greeting)?;
        self.show(landing)
    }

    fn diagnose(
        &mut self,
        symptoms: Vec<Symptom>,
        age: Option<String>,
        gender: Option<String>,
    ) -> anyhow::Result<()> {
        self.store.authorize(Route::Diagnose)?;
        if symptoms.is_empty() {
            return self.notice("Select at least one symptom");
        }

        let meta = ReportMeta::from_fields(Utc::now(), age, gender);

        let report = self.engine.evaluate(symptoms, meta);
        render::report(&mut self.out, &report)?;
        self.store.record_report(report);
        Ok(())
    }

    fn save(&mut self) -> anyhow::Result<()> {
        self.store.authorize(Route::Patient)?;
        if self.store.current_report().is_none() {
            return self.notice("No diagnosis to save");
        }
        self.store.save_current_report()?;
        self.notice("Result saved.")?;
        self.show(Route::History)
    }

    fn print(&mut self) -> anyhow::Result<()> {
        if self.store.current_report().is_none() {
            return self.notice("No report to print");
        }
        let printable = self.store.printable(Utc::now())?;
        writeln!(self.out, "{printable}")?;
        Ok(())
    }

    fn export(&mut self, output: Option<PathBuf>) -> anyhow::Result<()> {
        if self.store.saved_results().is_empty() {
            return self.notice("No data to export");
        }

        let csv = results_to_csv(self.store.saved_results());
        match output {
            Some(path) => {
                std::fs::write(&path, &csv)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                self.notice(&format!("CSV exported to {}", path.display()))?;
            }
            None => {
                writeln!(self.out, "{csv}")?;
                self.notice("CSV exported")?;
            }
        }
        Ok(())
    }

    /// Renders a view. Callers have already been authorized for it.
    fn show(&mut self, route: Route) -> anyhow::Result<()> {
        match route {
            Route::Home => render::home(&mut self.out)?,
            Route::Signup => render::signup_usage(&mut self.out)?,
            Route::Login => render::login_usage(&mut self.out)?,
            Route::Patient | Route::Diagnose | Route::History => {
                writeln!(self.out, "== Patient Portal ==")?;
                writeln!(self.out, "Welcome, {}", self.store.display_name())?;
                match self.store.current_report() {
                    Some(report) => render::report(&mut self.out, report)?,
                    None => render::symptom_vocabulary(&mut self.out)?,
                }
                writeln!(self.out, "== My Results ==")?;
                if let Some(account) = self.store.active_account() {
                    let email = account.email.as_str();
                    render::results_table(&mut self.out, self.store.results_for(email))?;
                }
            }
            Route::Admin => {
                writeln!(self.out, "== Admin Dashboard ==")?;
                writeln!(self.out, "Patients & Results")?;
                render::accounts_table(&mut self.out, self.store.accounts())?;
                render::results_by_patient(&mut self.out, &self.store.results_by_patient())?;
                writeln!(self.out, "Tools: export, clear")?;
            }
        }
        Ok(())
    }

    fn handle_session_error(&mut self, err: &SessionError) -> anyhow::Result<()> {
        match err {
            SessionError::InvalidCredentials => {
                self.notice("Invalid credentials. Try admin@example.com / pass123")
            }
            SessionError::AuthorizationRequired { route, redirect } => {
                let message = match route {
                    Route::Admin => "Admin only",
                    _ => "Please login first",
                };
                self.notice(message)?;
                tracing::debug!("redirecting from {} to {}", route, redirect);
                self.show(*redirect)
            }
            other => self.notice(&other.to_string()),
        }
    }

    fn notice(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(self.out, "! {message}")?;
        Ok(())
    }
}
