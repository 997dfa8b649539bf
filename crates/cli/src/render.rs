//! Plain-text rendering of the LabDiag views.

use chrono::{DateTime, Utc};
use labdiag_core::constants::{DEMO_ACCOUNTS, DEMO_PASSWORD};
use labdiag_core::{Account, PatientResults, Report, SavedResult, Symptom};
use std::io::{self, Write};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn when(ts: &DateTime<Utc>) -> String {
    ts.format(DATE_FORMAT).to_string()
}

fn symptom_list(symptoms: &[Symptom]) -> String {
    symptoms
        .iter()
        .map(|s| s.id())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn home(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "== Welcome to LabDiag ==")?;
    writeln!(out, "A laboratory diagnostic workflow (demo).")?;
    writeln!(out)?;
    writeln!(out, "How it works:")?;
    writeln!(out, "  1. signup or login as patient or admin")?;
    writeln!(out, "  2. patients pick symptoms and run diagnose")?;
    writeln!(out, "  3. save results and print reports")?;
    writeln!(out, "  4. admins view results and export CSV")?;
    writeln!(out)?;
    writeln!(out, "Demo credentials:")?;
    for (_, email, role) in DEMO_ACCOUNTS {
        writeln!(out, "  {role}: {email} / {DEMO_PASSWORD}")?;
    }
    Ok(())
}

pub fn signup_usage(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "== Create account ==")?;
    writeln!(
        out,
        "signup <email> <password> <patient|admin> <full name...> [--phone <phone>]"
    )
}

pub fn login_usage(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "== Login ==")?;
    writeln!(out, "login <email> <password>")
}

pub fn symptom_vocabulary(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Choose symptoms:")?;
    for symptom in Symptom::ALL {
        writeln!(out, "  {:<20} {}", symptom.id(), symptom.label())?;
    }
    Ok(())
}

/// The diagnosis result box, followed by the full ranking.
pub fn report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    let top = report.top();
    writeln!(out, "== Diagnosis result ==")?;
    writeln!(out, "{}", top.name)?;
    writeln!(out, "Confidence: {}%", top.confidence)?;
    writeln!(out, "Symptoms: {}", symptom_list(report.symptoms()))?;
    if report.results().len() > 1 {
        writeln!(out, "Ranking:")?;
        for (rank, candidate) in report.results().iter().enumerate() {
            writeln!(
                out,
                "  {}. {} ({}%)",
                rank + 1,
                candidate.name,
                candidate.confidence
            )?;
        }
    }
    writeln!(
        out,
        "Note: suggestion only. Seek professional care for diagnosis."
    )
}

pub fn results_table<'a>(
    out: &mut impl Write,
    records: impl IntoIterator<Item = &'a SavedResult>,
) -> io::Result<()> {
    let mut records = records.into_iter().peekable();
    if records.peek().is_none() {
        return writeln!(out, "No saved results yet.");
    }

    writeln!(out, "{:<17} | {:<40} | Diagnosis", "Date", "Symptoms")?;
    for record in records {
        writeln!(
            out,
            "{:<17} | {:<40} | {} ({}%)",
            when(&record.when),
            symptom_list(&record.symptoms),
            record.diagnosis,
            record.confidence
        )?;
    }
    Ok(())
}

pub fn accounts_table(out: &mut impl Write, accounts: &[Account]) -> io::Result<()> {
    writeln!(out, "{:<4} | {:<20} | {:<28} | Role", "Id", "Name", "Email")?;
    for account in accounts {
        writeln!(
            out,
            "{:<4} | {:<20} | {:<28} | {}",
            account.id, account.name, account.email, account.role
        )?;
    }
    Ok(())
}

pub fn results_by_patient(out: &mut impl Write, groups: &[PatientResults<'_>]) -> io::Result<()> {
    if groups.is_empty() {
        return writeln!(out, "No saved results yet.");
    }

    for group in groups {
        match group.patient_name {
            Some(name) => writeln!(out, "-- {} <{}>", name, group.patient_email)?,
            None => writeln!(out, "-- <{}>", group.patient_email)?,
        }
        results_table(out, group.records.iter().copied())?;
    }
    Ok(())
}
